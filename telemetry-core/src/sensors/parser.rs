// sensors/parser.rs
use crate::error::ParseError;
use crate::radio_types::FIELD_DELIMITER;
use crate::types::{GpsCache, Sample, SensorReading, SensorSnapshot};

/// Splits one sensor line into a reading.
///
/// Tokens are separated by commas; whitespace around each token is ignored,
/// so the board's `", "` separator parses the same as `","`.
pub fn parse_line(line: &str) -> Result<SensorReading, ParseError> {
    line.split(FIELD_DELIMITER)
        .enumerate()
        .map(|(index, token)| {
            Sample::parse(token).ok_or_else(|| ParseError::InvalidFormat {
                index,
                token: token.trim().to_string(),
            })
        })
        .collect()
}

/// Parses `line` and refreshes `gps` when the frame carries GPS fields.
/// The cache is left untouched on error.
pub fn process_line(line: &str, gps: &mut GpsCache) -> Result<SensorReading, ParseError> {
    let reading = parse_line(line)?;
    if gps.update_from(&reading) {
        log::debug!("GPS cache refreshed: {:?}", gps.fields());
    }
    Ok(reading)
}

/// Parser state owned by the ingestion thread.
///
/// Holds the local GPS cache; every call produces the snapshot that should be
/// published for the scheduler.
#[derive(Debug, Default)]
pub struct SensorFrameParser {
    gps: GpsCache,
}

impl SensorFrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&mut self, line: &str) -> Result<SensorReading, ParseError> {
        process_line(line, &mut self.gps)
    }

    /// Parses `line` and returns the snapshot to publish. A frame that fails
    /// to parse is dropped: the published reading becomes empty while the GPS
    /// cache keeps its last good values.
    pub fn ingest(&mut self, line: &str) -> (SensorSnapshot, Result<(), ParseError>) {
        let (reading, outcome) = match self.parse(line) {
            Ok(reading) => (reading, Ok(())),
            Err(e) => (Vec::new(), Err(e)),
        };
        let snapshot = SensorSnapshot {
            reading,
            gps: self.gps.clone(),
        };
        (snapshot, outcome)
    }

    pub fn gps_cache(&self) -> &GpsCache {
        &self.gps
    }
}
