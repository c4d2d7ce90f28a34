//! What happens when the user leaves the program

use std::process::Command;

use tracing::{info, warn};

use crate::config::SystemConfig;
use crate::{MetarError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitAction {
    /// Just end the program
    Quit,
    /// End the program and power off the Pi with this command line
    Shutdown(Vec<String>),
}

impl ExitAction {
    #[must_use]
    pub fn from_config(config: &SystemConfig) -> Self {
        if config.shutdown_on_exit {
            ExitAction::Shutdown(config.shutdown_command.clone())
        } else {
            ExitAction::Quit
        }
    }

    /// Confirmation prompt shown before exiting
    #[must_use]
    pub fn prompt(&self) -> &'static str {
        match self {
            ExitAction::Quit => "Exit the program?",
            ExitAction::Shutdown(_) => "Shutdown the Pi?",
        }
    }

    /// Prompt that fits a 16 column plate row
    #[must_use]
    pub fn short_prompt(&self) -> &'static str {
        match self {
            ExitAction::Quit => "Exit program?",
            ExitAction::Shutdown(_) => "Shutdown the Pi?",
        }
    }

    /// Carry out the action; `Quit` is a no-op the caller follows by returning
    pub fn run(&self) -> Result<()> {
        match self {
            ExitAction::Quit => {
                info!("Exiting");
                Ok(())
            }
            ExitAction::Shutdown(command) => {
                let (program, args) = command
                    .split_first()
                    .ok_or_else(|| MetarError::config("Shutdown command is empty"))?;
                info!("Running shutdown command: {}", command.join(" "));
                let status = Command::new(program).args(args).status()?;
                if !status.success() {
                    warn!("Shutdown command exited with {}", status);
                }
                Ok(())
            }
        }
    }
}
