//! Data models for the METAR display
//!
//! - Station: ICAO identifiers and provider station metadata
//! - Metar: the decoded report and values derived from it

pub mod metar;
pub mod station;

// Re-export all public types for convenient access
pub use metar::{CloudLayer, FlightRules, MetarReport, Visibility, Wind, WindDirection};
pub use station::{IDENT_CHARS, IDENT_LEN, Ident, StationInfo};
