//! [`LineSource`] over any byte stream (serial device, pipe, file).

use crate::error::TransportError;
use crate::transport::LineSource;
use std::io::{BufRead, ErrorKind};

/// Reads newline-terminated frames from a buffered reader.
///
/// End of stream is reported as a disconnect. Read timeouts (as configured on
/// a serial port) surface as `Ok(None)` and keep any partial line for the
/// next call. Invalid UTF-8 is replaced rather than rejected so that a noisy
/// byte only spoils one frame.
pub struct StreamLineSource<R: BufRead> {
    reader: R,
    partial: Vec<u8>,
}

impl<R: BufRead> StreamLineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            partial: Vec::new(),
        }
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.partial)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        self.partial.clear();
        line
    }
}

impl<R: BufRead> LineSource for StreamLineSource<R> {
    fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        match self.reader.read_until(b'\n', &mut self.partial) {
            Ok(0) if self.partial.is_empty() => Err(TransportError::Disconnected),
            Ok(_) => Ok(Some(self.take_line())),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                Ok(None)
            }
            Err(e) => Err(TransportError::Io(e)),
        }
    }
}
