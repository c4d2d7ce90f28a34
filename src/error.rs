//! Error types and handling for the METAR display

use thiserror::Error;

/// Main error type for the METAR display
#[derive(Error, Debug)]
pub enum MetarError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The data provider could not be reached at all
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// The data provider did not answer in time
    #[error("Request timed out: {message}")]
    Timeout { message: String },

    /// The data provider answered with an error or an unreadable body
    #[error("Data source error: {message}")]
    Source {
        message: String,
        status: Option<u16>,
    },

    /// The requested station does not exist
    #[error("Unknown station: {station}")]
    BadStation { station: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Rendering or display hardware errors
    #[error("Display error: {message}")]
    Display { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Session file could not be encoded or decoded
    #[error("Session error: {source}")]
    Session {
        #[from]
        source: serde_json::Error,
    },
}

impl MetarError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create a new data source error
    pub fn source<S: Into<String>>(message: S, status: Option<u16>) -> Self {
        Self::Source {
            message: message.into(),
            status,
        }
    }

    /// Create a new unknown-station error
    pub fn bad_station<S: Into<String>>(station: S) -> Self {
        Self::BadStation {
            station: station.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new display error
    pub fn display<S: Into<String>>(message: S) -> Self {
        Self::Display {
            message: message.into(),
        }
    }

    /// Whether retrying the same request later could succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            MetarError::Connection { .. } | MetarError::Timeout { .. } => true,
            MetarError::Source {
                status: Some(code), ..
            } => *code >= 500 || *code == 429,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            MetarError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            MetarError::Connection { .. } => {
                "No network connection. Check back soon.".to_string()
            }
            MetarError::Timeout { .. } | MetarError::Source { .. } => {
                "Could not fetch data from the weather source.".to_string()
            }
            MetarError::BadStation { station } => format!("{station} is not a valid station"),
            MetarError::Validation { message } => format!("Invalid input: {message}"),
            MetarError::Display { message } => format!("Display failure: {message}"),
            MetarError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            MetarError::Session { .. } => {
                "Saved session is unreadable and will be reset.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = MetarError::config("bad interval");
        assert!(matches!(config_err, MetarError::Config { .. }));

        let station_err = MetarError::bad_station("XXXX");
        assert!(matches!(station_err, MetarError::BadStation { .. }));

        let validation_err = MetarError::validation("ident too long");
        assert!(matches!(validation_err, MetarError::Validation { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = MetarError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let station_err = MetarError::bad_station("ZZZZ");
        assert_eq!(station_err.user_message(), "ZZZZ is not a valid station");

        let validation_err = MetarError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(MetarError::connection("refused").is_transient());
        assert!(MetarError::timeout("30s").is_transient());
        assert!(MetarError::source("bad gateway", Some(502)).is_transient());
        assert!(MetarError::source("slow down", Some(429)).is_transient());
        assert!(!MetarError::source("bad request", Some(400)).is_transient());
        assert!(!MetarError::source("garbage body", None).is_transient());
        assert!(!MetarError::bad_station("QQQQ").is_transient());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let metar_err: MetarError = io_err.into();
        assert!(matches!(metar_err, MetarError::Io { .. }));
    }
}
