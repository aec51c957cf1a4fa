//! Static mapping from reading index to radio packet number.
//!
//! Both ends of the link are driven by the same [`PacketSchema`]: the vehicle
//! partitions readings with it and the ground station uses it to put decoded
//! values back into their columns.

use crate::error::SchemaError;
use crate::radio_types::RadioPacket;
use crate::types::Sample;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Highest packet number that still fits the two-digit wire prefix.
pub const MAX_PACKET_NUMBER: u8 = 99;

/// Reading index → packet number, in transmission order.
pub const ROCKET_PACKET_MAP: [(usize, u8); 15] = [
    (0, 1),
    (1, 1),
    (2, 1),
    (3, 1),
    (4, 2),
    (5, 2),
    (6, 2),
    (7, 3),
    (8, 3),
    (9, 3),
    (10, 4),
    (11, 4),
    (12, 4),
    (13, 5),
    (14, 5),
];

/// Column name for each reading index.
pub const ROCKET_FIELD_NAMES: [&str; 15] = [
    "Timestamp (Ard)",
    "Temperature",
    "Pressure",
    "Altitude",
    "AccelX",
    "AccelY",
    "AccelZ",
    "GyroX",
    "GyroY",
    "GyroZ",
    "Lat",
    "Lon",
    "GPS Alt",
    "GPS Speed",
    "Sat Count",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub field: usize,
    pub packet: u8,
}

#[derive(Clone, Debug, Deserialize)]
struct RawSchema {
    entries: Vec<SchemaEntry>,
    columns: Vec<String>,
}

/// Validated packet layout. Construct through [`PacketSchema::new`] or
/// deserialization; both reject inconsistent maps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSchema")]
pub struct PacketSchema {
    entries: Vec<SchemaEntry>,
    columns: Vec<String>,
}

impl TryFrom<RawSchema> for PacketSchema {
    type Error = SchemaError;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        PacketSchema::new(raw.entries, raw.columns)
    }
}

impl PacketSchema {
    pub fn new(entries: Vec<SchemaEntry>, columns: Vec<String>) -> Result<Self, SchemaError> {
        if entries.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut seen_fields = vec![false; columns.len()];
        let mut closed_packets: Vec<u8> = Vec::new();
        let mut current: Option<u8> = None;

        for entry in &entries {
            if entry.packet == 0 || entry.packet > MAX_PACKET_NUMBER {
                return Err(SchemaError::PacketOutOfRange {
                    packet: entry.packet,
                });
            }
            let Some(seen) = seen_fields.get_mut(entry.field) else {
                return Err(SchemaError::MissingColumn { field: entry.field });
            };
            if *seen {
                return Err(SchemaError::DuplicateField { field: entry.field });
            }
            *seen = true;

            if current != Some(entry.packet) {
                if closed_packets.contains(&entry.packet) {
                    return Err(SchemaError::NonContiguousPacket {
                        packet: entry.packet,
                    });
                }
                if let Some(previous) = current {
                    closed_packets.push(previous);
                }
                current = Some(entry.packet);
            }
        }

        Ok(Self { entries, columns })
    }

    /// The five-packet layout flown on the rocket.
    pub fn rocket() -> Self {
        let entries = ROCKET_PACKET_MAP
            .iter()
            .map(|&(field, packet)| SchemaEntry { field, packet })
            .collect();
        let columns = ROCKET_FIELD_NAMES.iter().map(|c| c.to_string()).collect();
        Self { entries, columns }
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    /// Column names indexed by reading index.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn field_count(&self) -> usize {
        self.columns.len()
    }

    /// Reading indices carried by `packet`, in schema order.
    pub fn fields_of(&self, packet: u8) -> Vec<usize> {
        self.entries
            .iter()
            .filter(|e| e.packet == packet)
            .map(|e| e.field)
            .collect()
    }

    pub fn contains_packet(&self, packet: u8) -> bool {
        self.entries.iter().any(|e| e.packet == packet)
    }

    /// Splits a slot layout (see [`crate::types::SensorSnapshot::slots`]) into
    /// packets in ascending packet-number order. Absent slots are skipped and
    /// packets with no present field are not produced.
    pub fn partition(&self, slots: &[Option<Sample>]) -> Vec<RadioPacket> {
        let mut groups: BTreeMap<u8, Vec<Sample>> = BTreeMap::new();
        for entry in &self.entries {
            if let Some(Some(sample)) = slots.get(entry.field) {
                groups.entry(entry.packet).or_default().push(sample.clone());
            }
        }
        groups
            .into_iter()
            .map(|(number, values)| RadioPacket::new(number, values))
            .collect()
    }
}

impl Default for PacketSchema {
    fn default() -> Self {
        Self::rocket()
    }
}
