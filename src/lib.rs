#![allow(clippy::cast_possible_truncation)] // f32->i32 pixel math
#![allow(clippy::cast_precision_loss)] // i32->f32 in drawing code
#![allow(clippy::cast_possible_wrap)] // layout sizes always fit an i32
#![allow(clippy::cast_sign_loss)]

//! METAR-RasPi - live METAR weather on a Raspberry Pi
//!
//! This library fetches METAR reports from aviationweather.gov and shows
//! them on one of two targets: a touchscreen driven through
//! embedded-graphics, or a 16x2 character LCD plate with a five button
//! keypad.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod plate;
pub mod screen;
pub mod session;
pub mod system;
pub mod weather;

// Re-export core types for public API
pub use api::{AviationWeatherClient, MetarSource, MissingReason, explain_missing};
pub use config::MetarRaspiConfig;
pub use error::MetarError;
pub use models::{FlightRules, Ident, MetarReport, StationInfo};
pub use plate::Plate;
pub use screen::Screen;
pub use session::Session;
pub use system::ExitAction;
pub use weather::{RefreshOutcome, RefreshSchedule, StationWeather};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, MetarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
