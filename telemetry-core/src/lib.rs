// lib.rs
//! Telemetry for a rocket over a small half-duplex radio.
//!
//! The vehicle reads comma-separated sensor frames from its sensor board,
//! keeps the latest one (plus the last GPS fix) on a [`Blackboard`], and once
//! a second splits it into numbered packets that fit the radio. The ground
//! station writes every packet it hears into a CSV row aligned to the same
//! [`PacketSchema`]. Both sides log through a [`BufferedLogger`].

pub mod blackboard;
pub mod config;
pub mod datacells;
pub mod error;
pub mod ground;
pub mod health_types;
pub mod log;
pub mod logger;
pub mod radio_types;
pub mod reassembler;
pub mod scheduler;
pub mod schema;
pub mod sensors;
pub mod shutdown;
pub mod transport;
pub mod types;
pub mod vehicle;

pub use blackboard::Blackboard;
pub use config::TelemetryConfig;
pub use error::{ParseError, SchemaError, StorageError, TelemetryError, TransportError};
pub use ground::GroundStation;
pub use health_types::{LinkHealth, LinkHealthReport};
pub use crate::log::{LogEntry, SystemClock, TimeSource};
pub use logger::{BufferedLogger, CsvFileStorage, LogStorage};
pub use radio_types::{GroundCommand, PacketLine, RadioPacket};
pub use reassembler::GroundReassembler;
pub use scheduler::{PacketScheduler, SchedulerState};
pub use schema::{PacketSchema, SchemaEntry};
pub use sensors::{SensorFrameParser, parse_line, process_line};
pub use shutdown::ShutdownToken;
pub use transport::{HalfDuplexLink, LineSource, LoopbackRadio, RadioDriver, StreamLineSource, Transport};
pub use types::{GpsCache, Sample, SensorReading, SensorSnapshot};
pub use vehicle::{Ingestion, run_vehicle};
