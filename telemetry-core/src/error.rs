use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while turning a sensor line into a reading.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Invalid data format at field {index}: '{token}'")]
    InvalidFormat { index: usize, token: String },
}

/// Errors produced while validating a packet schema.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("Packet schema is empty")]
    Empty,
    #[error("Field {field} is mapped more than once")]
    DuplicateField { field: usize },
    #[error("Packet number {packet} is outside 1..=99")]
    PacketOutOfRange { packet: u8 },
    #[error("Packet {packet} is split into non-contiguous groups")]
    NonContiguousPacket { packet: u8 },
    #[error("Field {field} has no column name")]
    MissingColumn { field: usize },
}

/// Errors raised by the serial or radio side of the link.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Link disconnected")]
    Disconnected,
    #[error("Link I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors produced while writing the CSV log.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create log directory '{path}'. \nError: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to open '{path}'. \nError: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed while writing '{path}'. \nError: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Failed while flushing '{path}'. \nError: {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Logger already closed")]
    Closed,
    #[error("Logger stopped after a failed write")]
    Failed,
    #[error("No free log file name left for {prefix}_{stamp}")]
    NamesExhausted { prefix: String, stamp: String },
}

/// Top-level error returned by the vehicle and ground run loops.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{0} thread panicked")]
    Panicked(&'static str),
}
