use crate::logger::FLUSH_THRESHOLD;
use crate::schema::PacketSchema;
use crate::transport::{INTER_CHUNK_DELAY, RADIO_PAYLOAD_SIZE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// Telemetry cadence
pub const SEND_INTERVAL: Duration = Duration::from_secs(1);
// Gap between two packets of one tick
pub const INTER_PACKET_DELAY: Duration = Duration::from_millis(50);
// How often the idle scheduler and the ground station poll the radio
pub const RADIO_POLL_INTERVAL: Duration = Duration::from_millis(10);
// Ticks without a new frame before the data is reported stale
pub const STALE_AFTER_TICKS: u32 = 3;
// Directory for the per-run CSV files
pub const LOG_DIR: &str = "logs";
pub const VEHICLE_LOG_PREFIX: &str = "log";
pub const GROUND_LOG_PREFIX: &str = "telemetry";

/// Every tunable of one node. `Default` is the flight configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub send_interval: Duration,
    pub inter_packet_delay: Duration,
    pub radio_poll_interval: Duration,
    pub stale_after_ticks: u32,
    pub flush_threshold: usize,
    pub transmission_unit: usize,
    pub inter_chunk_delay: Duration,
    pub log_dir: PathBuf,
    pub vehicle_log_prefix: String,
    pub ground_log_prefix: String,
    pub schema: PacketSchema,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            send_interval: SEND_INTERVAL,
            inter_packet_delay: INTER_PACKET_DELAY,
            radio_poll_interval: RADIO_POLL_INTERVAL,
            stale_after_ticks: STALE_AFTER_TICKS,
            flush_threshold: FLUSH_THRESHOLD,
            transmission_unit: RADIO_PAYLOAD_SIZE,
            inter_chunk_delay: INTER_CHUNK_DELAY,
            log_dir: PathBuf::from(LOG_DIR),
            vehicle_log_prefix: VEHICLE_LOG_PREFIX.to_string(),
            ground_log_prefix: GROUND_LOG_PREFIX.to_string(),
            schema: PacketSchema::rocket(),
        }
    }
}
