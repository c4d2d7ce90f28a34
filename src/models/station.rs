//! ICAO station identifiers as edited on the keypad and touchscreen

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::MetarError;

/// Symbols a station identifier can be built from, in picker order
pub const IDENT_CHARS: [char; 36] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

/// Number of characters in an ICAO identifier
pub const IDENT_LEN: usize = 4;

/// A 4-character station identifier stored as positions in [`IDENT_CHARS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ident {
    chars: [u8; IDENT_LEN],
}

fn char_index(c: char) -> Option<u8> {
    match c.to_ascii_uppercase() {
        c @ 'A'..='Z' => Some(c as u8 - b'A'),
        c @ '0'..='9' => Some(c as u8 - b'0' + 26),
        _ => None,
    }
}

impl Ident {
    /// Parse a station string such as "KJFK"
    pub fn parse(station: &str) -> crate::Result<Self> {
        let station = station.trim();
        if station.chars().count() != IDENT_LEN {
            return Err(MetarError::validation(format!(
                "station '{station}' must be exactly {IDENT_LEN} characters"
            )));
        }

        let mut chars = [0u8; IDENT_LEN];
        for (slot, c) in chars.iter_mut().zip(station.chars()) {
            *slot = char_index(c).ok_or_else(|| {
                MetarError::validation(format!("station '{station}' contains '{c}'"))
            })?;
        }
        Ok(Self { chars })
    }

    /// The identifier as an upper case string
    #[must_use]
    pub fn station(&self) -> String {
        self.chars
            .iter()
            .map(|&i| IDENT_CHARS[usize::from(i)])
            .collect()
    }

    /// Character at `pos` (0-3)
    #[must_use]
    pub fn char_at(&self, pos: usize) -> char {
        IDENT_CHARS[usize::from(self.chars[pos.min(IDENT_LEN - 1)])]
    }

    /// Advance the character at `pos` to the next symbol, wrapping 9 -> A
    pub fn increment(&mut self, pos: usize) {
        if let Some(slot) = self.chars.get_mut(pos) {
            *slot = (*slot + 1) % IDENT_CHARS.len() as u8;
        }
    }

    /// Move the character at `pos` to the previous symbol, wrapping A -> 9
    pub fn decrement(&mut self, pos: usize) {
        if let Some(slot) = self.chars.get_mut(pos) {
            *slot = if *slot == 0 {
                IDENT_CHARS.len() as u8 - 1
            } else {
                *slot - 1
            };
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.station())
    }
}

impl FromStr for Ident {
    type Err = MetarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Ident {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.station())
    }
}

impl<'de> Deserialize<'de> for Ident {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Provider metadata about a station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationInfo {
    pub ident: Ident,
    pub name: Option<String>,
    pub country: Option<String>,
    /// Product types the station publishes, e.g. "METAR", "TAF"
    pub site_types: Vec<String>,
}

impl StationInfo {
    /// Whether the station publishes METAR reports at all
    #[must_use]
    pub fn sends_reports(&self) -> bool {
        self.site_types
            .iter()
            .any(|kind| kind.eq_ignore_ascii_case("METAR"))
    }
}
