use crate::log::LogEntry;
use crate::radio_types::PacketLine;
use crate::schema::PacketSchema;
use chrono::NaiveDateTime;

/// Turns received packet lines into sparse, schema-aligned log rows.
///
/// Each line is decoded on its own; values from different packets are never
/// merged into one row. Joining packets back into full vehicle states is left
/// to offline processing of the log.
#[derive(Clone, Debug)]
pub struct GroundReassembler {
    schema: PacketSchema,
}

impl GroundReassembler {
    pub fn new(schema: PacketSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &PacketSchema {
        &self.schema
    }

    /// Decodes one line. Anything that does not match the schema is kept as a
    /// raw (timestamp, message) row.
    pub fn decode(&self, line: &str, timestamp: NaiveDateTime) -> LogEntry {
        let raw = || LogEntry::Raw {
            timestamp,
            message: line.to_string(),
        };

        let Some(packet) = PacketLine::split(line) else {
            return raw();
        };
        if !self.schema.contains_packet(packet.number) {
            log::warn!("Unknown packet number {}", packet.number_token);
            return raw();
        }

        // The sender only ever drops trailing fields of a group, so the values
        // line up with the leading fields of the schema entry list.
        let fields = self.schema.fields_of(packet.number);
        if packet.values.len() > fields.len() {
            log::warn!(
                "Packet {} carries {} values, schema defines {}",
                packet.number_token,
                packet.values.len(),
                fields.len()
            );
            return raw();
        }

        let mut columns = vec![None; self.schema.field_count()];
        for (field, value) in fields.iter().zip(&packet.values) {
            columns[*field] = Some(value.to_string());
        }
        LogEntry::Packet {
            timestamp,
            message: line.to_string(),
            columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 17)
            .and_then(|d| d.and_hms_opt(12, 0, 1))
            .unwrap()
    }

    fn reassembler() -> GroundReassembler {
        GroundReassembler::new(PacketSchema::rocket())
    }

    fn columns_of(entry: &LogEntry) -> &[Option<String>] {
        match entry {
            LogEntry::Packet { columns, .. } => columns,
            other => panic!("expected packet row, got {:?}", other),
        }
    }

    #[test]
    fn test_gps_packet_lands_in_gps_columns() {
        let entry = reassembler().decode("04,45.0,-93.0,152.0", ts());
        let columns = columns_of(&entry);
        assert_eq!(columns.len(), 15);
        assert_eq!(columns[10].as_deref(), Some("45.0"));
        assert_eq!(columns[11].as_deref(), Some("-93.0"));
        assert_eq!(columns[12].as_deref(), Some("152.0"));
        let filled = columns.iter().filter(|c| c.is_some()).count();
        assert_eq!(filled, 3);
    }

    #[test]
    fn test_short_packet_fills_leading_fields() {
        let entry = reassembler().decode("03,0.02,0.03", ts());
        let columns = columns_of(&entry);
        assert_eq!(columns[7].as_deref(), Some("0.02"));
        assert_eq!(columns[8].as_deref(), Some("0.03"));
        assert!(columns[9].is_none());
    }

    #[test]
    fn test_row_record_is_fixed_width() {
        let entry = reassembler().decode("05,0.0,7", ts());
        let record = entry.to_record();
        assert_eq!(record.len(), 17);
        assert_eq!(record[1], "05,0.0,7");
        assert_eq!(record[15], "0.0");
        assert_eq!(record[16], "7");
        assert!(record[2..15].iter().all(String::is_empty));
    }

    #[test]
    fn test_unknown_packet_is_raw() {
        let entry = reassembler().decode("09,1,2", ts());
        assert_eq!(
            entry,
            LogEntry::Raw {
                timestamp: ts(),
                message: "09,1,2".to_string()
            }
        );
    }

    #[test]
    fn test_line_without_delimiter_is_raw() {
        let entry = reassembler().decode("Radio ready", ts());
        assert_eq!(entry.to_record(), ["2026-05-17 12:00:01", "Radio ready"]);
    }

    #[test]
    fn test_oversized_packet_is_raw() {
        let entry = reassembler().decode("05,1,2,3", ts());
        assert!(matches!(entry, LogEntry::Raw { .. }));
    }
}
