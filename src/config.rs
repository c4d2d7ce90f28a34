//! Configuration management for the METAR display
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::MetarError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the METAR display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetarRaspiConfig {
    /// Station shown when no session has been saved yet
    #[serde(default = "default_station")]
    pub default_station: String,
    /// METAR data provider settings
    #[serde(default)]
    pub source: SourceConfig,
    /// Polling intervals
    #[serde(default)]
    pub update: UpdateConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Exit and persistence behaviour
    #[serde(default)]
    pub system: SystemConfig,
    /// LCD plate settings
    #[serde(default)]
    pub plate: PlateConfig,
    /// Touchscreen settings
    #[serde(default)]
    pub screen: ScreenConfig,
}

/// METAR data provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the aviationweather.gov data API
    #[serde(default = "default_source_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_source_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_source_max_retries")]
    pub max_retries: u32,
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Polling intervals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Seconds between report refreshes
    #[serde(default = "default_update_interval")]
    pub interval_seconds: u64,
    /// Seconds before retrying after a failed refresh
    #[serde(default = "default_retry_interval")]
    pub retry_seconds: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Send logs to this file instead of stderr
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Exit and persistence behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Power off the Pi when leaving the program
    #[serde(default)]
    pub shutdown_on_exit: bool,
    /// Command run when `shutdown_on_exit` is set
    #[serde(default = "default_shutdown_command")]
    pub shutdown_command: Vec<String>,
    /// Override for the session file location
    #[serde(default)]
    pub session_file: Option<PathBuf>,
}

/// LCD plate settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateConfig {
    /// Milliseconds between keypad reads
    #[serde(default = "default_button_interval")]
    pub button_interval_ms: u64,
    /// Milliseconds between each character step of the scrolling line
    #[serde(default = "default_scroll_interval")]
    pub scroll_interval_ms: u64,
    /// Milliseconds the scrolling line rests at either end
    #[serde(default = "default_scroll_pause")]
    pub scroll_pause_ms: u64,
    /// Keep the remarks section in the scrolling line
    #[serde(default)]
    pub include_remarks: bool,
    /// Character columns of the panel
    #[serde(default = "default_plate_cols")]
    pub cols: u8,
    /// Character rows of the panel
    #[serde(default = "default_plate_rows")]
    pub rows: u8,
}

/// Touchscreen settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenConfig {
    /// Name of a bundled layout, e.g. "320x240"
    #[serde(default = "default_screen_size")]
    pub size: String,
    /// Custom layout JSON used instead of a bundled one
    #[serde(default)]
    pub layout_file: Option<PathBuf>,
    /// Clock and timestamps in UTC rather than local time
    #[serde(default = "default_true")]
    pub clock_utc: bool,
    /// strftime format of the clock
    #[serde(default = "default_clock_format")]
    pub clock_format: String,
    /// strftime format of the report timestamp
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
    /// Altimeter unit (inhg or hpa)
    #[serde(default = "default_pressure_unit")]
    pub pressure_unit: String,
    /// Pixel scale of the desktop window
    #[serde(default = "default_scale")]
    pub scale: u32,
}

// Default value functions
fn default_station() -> String {
    "KJFK".to_string()
}

fn default_source_base_url() -> String {
    "https://aviationweather.gov/api/data".to_string()
}

fn default_source_timeout() -> u32 {
    30
}

fn default_source_max_retries() -> u32 {
    2
}

fn default_user_agent() -> String {
    format!("metar-raspi/{}", env!("CARGO_PKG_VERSION"))
}

fn default_update_interval() -> u64 {
    600
}

fn default_retry_interval() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_shutdown_command() -> Vec<String> {
    vec!["shutdown".to_string(), "-h".to_string(), "now".to_string()]
}

fn default_button_interval() -> u64 {
    200
}

fn default_scroll_interval() -> u64 {
    200
}

fn default_scroll_pause() -> u64 {
    2000
}

fn default_plate_cols() -> u8 {
    16
}

fn default_plate_rows() -> u8 {
    2
}

fn default_screen_size() -> String {
    "320x240".to_string()
}

fn default_true() -> bool {
    true
}

fn default_clock_format() -> String {
    "%H:%M".to_string()
}

fn default_timestamp_format() -> String {
    "%d-%H:%M".to_string()
}

fn default_pressure_unit() -> String {
    "inhg".to_string()
}

fn default_scale() -> u32 {
    1
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_source_base_url(),
            timeout_seconds: default_source_timeout(),
            max_retries: default_source_max_retries(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_update_interval(),
            retry_seconds: default_retry_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            shutdown_on_exit: false,
            shutdown_command: default_shutdown_command(),
            session_file: None,
        }
    }
}

impl Default for PlateConfig {
    fn default() -> Self {
        Self {
            button_interval_ms: default_button_interval(),
            scroll_interval_ms: default_scroll_interval(),
            scroll_pause_ms: default_scroll_pause(),
            include_remarks: false,
            cols: default_plate_cols(),
            rows: default_plate_rows(),
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            size: default_screen_size(),
            layout_file: None,
            clock_utc: true,
            clock_format: default_clock_format(),
            timestamp_format: default_timestamp_format(),
            pressure_unit: default_pressure_unit(),
            scale: default_scale(),
        }
    }
}

impl Default for MetarRaspiConfig {
    fn default() -> Self {
        Self {
            default_station: default_station(),
            source: SourceConfig::default(),
            update: UpdateConfig::default(),
            logging: LoggingConfig::default(),
            system: SystemConfig::default(),
            plate: PlateConfig::default(),
            screen: ScreenConfig::default(),
        }
    }
}

impl UpdateConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    #[must_use]
    pub fn retry(&self) -> Duration {
        Duration::from_secs(self.retry_seconds)
    }
}

impl PlateConfig {
    #[must_use]
    pub fn button_interval(&self) -> Duration {
        Duration::from_millis(self.button_interval_ms)
    }

    #[must_use]
    pub fn scroll_interval(&self) -> Duration {
        Duration::from_millis(self.scroll_interval_ms)
    }

    #[must_use]
    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }
}

impl MetarRaspiConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. METAR_RASPI_PLATE__INCLUDE_REMARKS=true
        builder = builder.add_source(
            Environment::with_prefix("METAR_RASPI")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: MetarRaspiConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("metar-raspi").join("config.toml"))
    }

    /// Get the session file path
    #[must_use]
    pub fn session_path(&self) -> PathBuf {
        if let Some(path) = &self.system.session_file {
            return path.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join("metar-raspi"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("session.json")
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.default_station.is_empty() {
            self.default_station = default_station();
        }
        if self.source.base_url.is_empty() {
            self.source.base_url = default_source_base_url();
        }
        if self.source.timeout_seconds == 0 {
            self.source.timeout_seconds = default_source_timeout();
        }
        if self.source.user_agent.is_empty() {
            self.source.user_agent = default_user_agent();
        }
        if self.update.interval_seconds == 0 {
            self.update.interval_seconds = default_update_interval();
        }
        if self.update.retry_seconds == 0 {
            self.update.retry_seconds = default_retry_interval();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.system.shutdown_command.is_empty() {
            self.system.shutdown_command = default_shutdown_command();
        }
        if self.plate.button_interval_ms == 0 {
            self.plate.button_interval_ms = default_button_interval();
        }
        if self.plate.scroll_interval_ms == 0 {
            self.plate.scroll_interval_ms = default_scroll_interval();
        }
        if self.plate.scroll_pause_ms == 0 {
            self.plate.scroll_pause_ms = default_scroll_pause();
        }
        if self.screen.size.is_empty() {
            self.screen.size = default_screen_size();
        }
        if self.screen.scale == 0 {
            self.screen.scale = default_scale();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.source.timeout_seconds > 300 {
            return Err(MetarError::config("Source timeout cannot exceed 300 seconds").into());
        }

        if self.source.max_retries > 10 {
            return Err(MetarError::config("Source max retries cannot exceed 10").into());
        }

        if self.update.interval_seconds < 60 {
            return Err(MetarError::config(
                "Update interval must be at least 60 seconds",
            )
            .into());
        }

        if self.update.retry_seconds > self.update.interval_seconds {
            return Err(MetarError::config(
                "Retry interval cannot exceed the update interval",
            )
            .into());
        }

        if self.plate.cols < 8 || self.plate.rows < 2 || self.plate.rows > 4 {
            return Err(MetarError::config(
                "Plate must have at least 8 columns and between 2 and 4 rows",
            )
            .into());
        }

        if self.screen.scale > 8 {
            return Err(MetarError::config("Screen scale cannot exceed 8").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(MetarError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(MetarError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let valid_pressure_units = ["inhg", "hpa"];
        if !valid_pressure_units.contains(&self.screen.pressure_unit.as_str()) {
            return Err(MetarError::config(format!(
                "Invalid pressure unit '{}'. Must be one of: {}",
                self.screen.pressure_unit,
                valid_pressure_units.join(", ")
            ))
            .into());
        }

        if !self.source.base_url.starts_with("http://")
            && !self.source.base_url.starts_with("https://")
        {
            return Err(MetarError::config(
                "Source base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        crate::models::Ident::parse(&self.default_station).map_err(|e| {
            MetarError::config(format!("Invalid default station: {e}"))
        })?;

        Ok(())
    }
}
