//! Persisted user choices: the selected station and the color scheme

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Result;

/// What survives a restart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub station: String,
    /// Light text on a dark background; the default for a fresh install
    #[serde(default = "default_inverted")]
    pub inverted: bool,
}

fn default_inverted() -> bool {
    true
}

impl Session {
    #[must_use]
    pub fn new(station: impl Into<String>) -> Self {
        Self {
            station: station.into(),
            inverted: default_inverted(),
        }
    }

    /// Read the session at `path`, falling back to `default_station`
    ///
    /// A missing or unreadable file is not an error.
    pub fn load(path: &Path, default_station: &str) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                debug!("No session at {}: {}", path.display(), e);
                return Self::new(default_station);
            }
        };

        match serde_json::from_str::<Session>(&text) {
            Ok(session) if crate::models::Ident::parse(&session.station).is_ok() => session,
            Ok(session) => {
                warn!("Ignoring saved station '{}'", session.station);
                Self {
                    station: default_station.to_string(),
                    ..session
                }
            }
            Err(e) => {
                warn!("Session file {} is corrupt, resetting: {}", path.display(), e);
                Self::new(default_station)
            }
        }
    }

    /// Write the session, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!("Saved session to {}", path.display());
        Ok(())
    }
}
