use crate::schema::PacketSchema;
use crate::types::Sample;
use chrono::{Local, NaiveDateTime};

/// Timestamp format of the first column of every row.
pub const ROW_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// First header column on the vehicle side (wall clock of the flight computer).
pub const VEHICLE_TIMESTAMP_COLUMN: &str = "Timestamp (Pi)";

/// Leading header columns on the ground side.
pub const GROUND_LEADING_COLUMNS: [&str; 2] = ["Timestamp", "Message"];

/// Wall clock used to stamp rows and name log files.
pub trait TimeSource {
    fn now(&self) -> NaiveDateTime;
}

/// Local time of the host.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// One row of the CSV log.
#[derive(Clone, Debug, PartialEq)]
pub enum LogEntry {
    /// A full sensor reading as ingested on the vehicle.
    Reading {
        timestamp: NaiveDateTime,
        values: Vec<Sample>,
    },
    /// A decoded radio packet: the raw line plus one cell per schema column,
    /// filled only where this packet carried a value.
    Packet {
        timestamp: NaiveDateTime,
        message: String,
        columns: Vec<Option<String>>,
    },
    /// An inbound line that could not be decoded, kept verbatim.
    Raw {
        timestamp: NaiveDateTime,
        message: String,
    },
}

impl LogEntry {
    pub fn timestamp(&self) -> NaiveDateTime {
        match self {
            LogEntry::Reading { timestamp, .. }
            | LogEntry::Packet { timestamp, .. }
            | LogEntry::Raw { timestamp, .. } => *timestamp,
        }
    }

    /// Cells of this row, timestamp first.
    pub fn to_record(&self) -> Vec<String> {
        let stamp = self.timestamp().format(ROW_TIMESTAMP_FORMAT).to_string();
        match self {
            LogEntry::Reading { values, .. } => core::iter::once(stamp)
                .chain(values.iter().map(|v| v.as_str().to_string()))
                .collect(),
            LogEntry::Packet {
                message, columns, ..
            } => [stamp, message.clone()]
                .into_iter()
                .chain(columns.iter().map(|c| c.clone().unwrap_or_default()))
                .collect(),
            LogEntry::Raw { message, .. } => vec![stamp, message.clone()],
        }
    }
}

/// Header of the vehicle log: host timestamp, then one column per field.
pub fn vehicle_header(schema: &PacketSchema) -> Vec<String> {
    core::iter::once(VEHICLE_TIMESTAMP_COLUMN.to_string())
        .chain(schema.columns().iter().cloned())
        .collect()
}

/// Header of the ground log: receive timestamp, raw line, then the decoded
/// columns.
pub fn ground_header(schema: &PacketSchema) -> Vec<String> {
    GROUND_LEADING_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(schema.columns().iter().cloned())
        .collect()
}
