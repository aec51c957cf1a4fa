// types.rs
use core::fmt;
use heapless::Vec as BoundedVec;

/// First reading index holding GPS data (latitude).
pub const GPS_OFFSET: usize = 10;
/// Number of trailing GPS fields: lat, lon, altitude, speed, satellites.
pub const GPS_FIELD_COUNT: usize = 5;

/// A single numeric field as received from the sensor board.
///
/// The parsed value is kept for computation; the source token is kept so the
/// radio and the CSV log reproduce the digits the sensor actually sent.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    value: f64,
    text: String,
}

impl Sample {
    /// Parses a single token. Surrounding whitespace is ignored.
    pub fn parse(token: &str) -> Option<Self> {
        let text = token.trim();
        let value = text.parse::<f64>().ok()?;
        Some(Self {
            value,
            text: text.to_string(),
        })
    }

    /// Builds a sample from a computed value.
    pub fn from_value(value: f64) -> Self {
        Self {
            value,
            text: format_value(value),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// Whole numbers keep one decimal so "45" is never confused with a count.
fn format_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// One parsed sensor frame. Index positions have fixed meaning (see
/// [`crate::schema::PacketSchema`] column names).
pub type SensorReading = Vec<Sample>;

/// Most recent GPS fields seen in any frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GpsCache {
    fields: BoundedVec<Sample, GPS_FIELD_COUNT>,
}

impl GpsCache {
    pub const fn new() -> Self {
        Self {
            fields: BoundedVec::new(),
        }
    }

    /// Replaces the cached fields with the GPS tail of `reading`, if it has one.
    /// Returns whether the cache changed.
    pub fn update_from(&mut self, reading: &[Sample]) -> bool {
        if reading.len() <= GPS_OFFSET {
            return false;
        }
        self.fields.clear();
        for sample in reading[GPS_OFFSET..].iter().take(GPS_FIELD_COUNT) {
            // Bounded by take() above.
            let _ = self.fields.push(sample.clone());
        }
        true
    }

    pub fn fields(&self) -> &[Sample] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// What the ingestion side publishes for the scheduler: the latest reading and
/// the GPS cache, swapped together so the two never disagree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SensorSnapshot {
    pub reading: SensorReading,
    pub gps: GpsCache,
}

impl SensorSnapshot {
    pub const fn new() -> Self {
        Self {
            reading: Vec::new(),
            gps: GpsCache::new(),
        }
    }

    /// Lays the snapshot out by schema index, falling back to the cached GPS
    /// fields when the reading stops short of them. Absent slots are `None`.
    pub fn slots(&self) -> Vec<Option<Sample>> {
        let mut slots: Vec<Option<Sample>> = self.reading.iter().cloned().map(Some).collect();
        if self.reading.len() <= GPS_OFFSET && !self.gps.is_empty() {
            slots.resize(GPS_OFFSET, None);
            slots.extend(self.gps.fields().iter().cloned().map(Some));
        }
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(tokens: &[&str]) -> SensorReading {
        tokens.iter().filter_map(|t| Sample::parse(t)).collect()
    }

    #[test]
    fn test_sample_keeps_source_text() {
        let s = Sample::parse(" 7 ").unwrap();
        assert_eq!(s.value(), 7.0);
        assert_eq!(s.as_str(), "7");
        assert!(Sample::parse("abc").is_none());
        assert!(Sample::parse("").is_none());
    }

    #[test]
    fn test_sample_from_value_formatting() {
        assert_eq!(Sample::from_value(45.0).as_str(), "45.0");
        assert_eq!(Sample::from_value(-93.25).as_str(), "-93.25");
    }

    #[test]
    fn test_gps_cache_ignores_short_readings() {
        let mut cache = GpsCache::new();
        assert!(!cache.update_from(&reading(&["1", "2", "3"])));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_gps_cache_takes_at_most_five_fields() {
        let mut cache = GpsCache::new();
        let long: Vec<String> = (0..18).map(|i| i.to_string()).collect();
        let tokens: Vec<&str> = long.iter().map(String::as_str).collect();
        assert!(cache.update_from(&reading(&tokens)));
        let cached: Vec<&str> = cache.fields().iter().map(Sample::as_str).collect();
        assert_eq!(cached, ["10", "11", "12", "13", "14"]);
    }

    #[test]
    fn test_slots_place_gps_at_offset() {
        let mut snapshot = SensorSnapshot::new();
        snapshot.gps.update_from(&reading(&[
            "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "45.0", "-93.0", "152.0", "0.0", "7",
        ]));
        snapshot.reading = reading(&["25.0", "101.3"]);
        let slots = snapshot.slots();
        assert_eq!(slots.len(), GPS_OFFSET + GPS_FIELD_COUNT);
        assert!(slots[2].is_none());
        assert!(slots[9].is_none());
        assert_eq!(slots[10].as_ref().unwrap().as_str(), "45.0");
        assert_eq!(slots[14].as_ref().unwrap().as_str(), "7");
    }

    #[test]
    fn test_slots_without_cache_stop_at_reading() {
        let mut snapshot = SensorSnapshot::new();
        snapshot.reading = reading(&["1", "2"]);
        assert_eq!(snapshot.slots().len(), 2);
    }
}
