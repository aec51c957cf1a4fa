use crate::types::Sample;
use core::fmt;

/// Separator between the packet number and each value on the wire.
pub const FIELD_DELIMITER: char = ',';

/// Telemetry packet transmitted from rocket to base station.
///
/// Wire form is ASCII: a zero-padded two-digit packet number followed by the
/// group's values, comma separated (`"04,45.0,-93.0,152.0"`). Both sides must
/// share the same [`crate::schema::PacketSchema`]; the format carries no field
/// names.
#[derive(Clone, Debug, PartialEq)]
pub struct RadioPacket {
    pub number: u8,
    pub values: Vec<Sample>,
}

impl RadioPacket {
    pub fn new(number: u8, values: Vec<Sample>) -> Self {
        Self { number, values }
    }

    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RadioPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.number)?;
        for value in &self.values {
            write!(f, "{}{}", FIELD_DELIMITER, value)?;
        }
        Ok(())
    }
}

/// A received packet line split into tokens, borrowing from the line.
#[derive(Debug, PartialEq)]
pub struct PacketLine<'a> {
    pub number: u8,
    pub number_token: &'a str,
    pub values: Vec<&'a str>,
}

impl<'a> PacketLine<'a> {
    /// Returns `None` when the line has no delimiter or does not start with a
    /// two-digit packet number.
    pub fn split(line: &'a str) -> Option<Self> {
        let (number_token, rest) = line.split_once(FIELD_DELIMITER)?;
        if number_token.len() != 2 || !number_token.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let number = number_token.parse::<u8>().ok()?;
        Some(Self {
            number,
            number_token,
            values: rest.split(FIELD_DELIMITER).collect(),
        })
    }
}

/// Command packet transmitted from base station to rocket.
#[derive(Clone, Debug, PartialEq)]
pub enum GroundCommand {
    /// Link check; the vehicle acknowledges it in its own log only.
    Test,
    Unknown(String),
}

impl GroundCommand {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "TEST" => GroundCommand::Test,
            other => GroundCommand::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GroundCommand::Test => "TEST",
            GroundCommand::Unknown(raw) => raw,
        }
    }
}
