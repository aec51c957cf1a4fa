//! Ground station: receive, decode, log.

use crate::config::TelemetryConfig;
use crate::error::{StorageError, TelemetryError};
use crate::log::{TimeSource, ground_header};
use crate::logger::{BufferedLogger, LogStorage};
use crate::radio_types::GroundCommand;
use crate::reassembler::GroundReassembler;
use crate::shutdown::ShutdownToken;
use crate::transport::Transport;
use std::time::Duration;

pub struct GroundStation<T: Transport, S: LogStorage, C: TimeSource> {
    link: T,
    reassembler: GroundReassembler,
    logger: BufferedLogger<S>,
    clock: C,
    poll_interval: Duration,
}

impl<T: Transport, S: LogStorage, C: TimeSource> GroundStation<T, S, C> {
    /// Writes the ground header to `storage` and returns a ready station.
    pub fn new(
        config: &TelemetryConfig,
        link: T,
        storage: S,
        clock: C,
    ) -> Result<Self, StorageError> {
        let logger = BufferedLogger::initialize(
            storage,
            &ground_header(&config.schema),
            config.flush_threshold,
        )?;
        Ok(Self {
            link,
            reassembler: GroundReassembler::new(config.schema.clone()),
            logger,
            clock,
            poll_interval: config.radio_poll_interval,
        })
    }

    /// Decodes and buffers one received payload. Blank payloads are ignored.
    pub fn process(&mut self, payload: &[u8]) -> Result<(), StorageError> {
        let text = String::from_utf8_lossy(payload);
        let line = text.trim();
        if line.is_empty() {
            return Ok(());
        }
        let timestamp = self.clock.now();
        log::info!("{}: {}", timestamp.format(crate::log::ROW_TIMESTAMP_FORMAT), line);
        self.logger.append(self.reassembler.decode(line, timestamp))
    }

    /// Processes everything the link has ready. Returns the number of payloads.
    pub fn poll(&mut self) -> Result<usize, StorageError> {
        let mut count = 0;
        while let Some(payload) = self.link.receive() {
            self.process(&payload)?;
            count += 1;
        }
        Ok(count)
    }

    /// Transmits a command to the vehicle.
    pub fn send_command(&mut self, command: &GroundCommand) -> bool {
        let ok = self.link.send(command.as_str().as_bytes());
        if !ok {
            log::warn!("[RF] Command {} not sent", command.as_str());
        }
        ok
    }

    pub fn logger(&self) -> &BufferedLogger<S> {
        &self.logger
    }

    /// Receives until `shutdown`, then drains the log.
    ///
    /// A storage failure ends the loop and triggers `shutdown` for whatever
    /// else shares the token.
    pub fn run(mut self, shutdown: &ShutdownToken) -> Result<(), TelemetryError> {
        log::info!("Ground station listening");
        let outcome = loop {
            if let Err(e) = self.poll() {
                break Err(e);
            }
            if shutdown.wait(self.poll_interval) {
                // Whatever arrived during the last wait still gets logged.
                break self.poll().map(|_| ());
            }
        };
        if let Err(e) = &outcome {
            log::error!("Ground log write failed: {}", e);
        }
        shutdown.trigger();
        let closed = self.logger.close();
        log::info!("Ground station stopped");
        outcome?;
        closed?;
        Ok(())
    }
}
