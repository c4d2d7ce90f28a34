//! tracing subscriber setup

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Filter from `--verbose`, then `RUST_LOG`, then the configured level
fn build_filter(config: &LoggingConfig, verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global subscriber
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let filter = build_filter(config, verbose);
    let json = config.format == "json";

    let installed = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            if json {
                builder.json().try_init()
            } else {
                builder.try_init()
            }
        }
        None => {
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr);
            if json {
                builder.json().try_init()
            } else {
                builder.try_init()
            }
        }
    };

    installed.map_err(|e| anyhow!("Failed to initialise logging: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_forces_debug() {
        let config = LoggingConfig::default();
        assert_eq!(build_filter(&config, true).to_string(), "debug");
    }

    #[test]
    fn test_file_logging_creates_file() {
        let dir = tempdir::TempDir::new("metar-log").unwrap();
        let config = LoggingConfig {
            level: "info".to_string(),
            format: "json".to_string(),
            file: Some(dir.path().join("metar.log")),
        };
        // Another test may already own the global subscriber
        let _ = init(&config, false);
        assert!(dir.path().join("metar.log").exists());
    }
}
