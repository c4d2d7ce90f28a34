//! Current weather for the selected station
//!
//! The tracker never throws away a good report: failed or empty refreshes
//! leave the previous report in place so the display keeps showing it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::models::{Ident, MetarReport};
use crate::{MetarError, Result};

/// What a refresh did to the tracked weather
#[derive(Debug)]
pub enum RefreshOutcome {
    /// A report with new raw text replaced the previous one
    Updated,
    /// The provider returned the report already shown
    Unchanged,
    /// The provider has no current report; any previous report is kept
    NoReport,
    /// The fetch failed; any previous report is kept
    Failed(MetarError),
}

impl RefreshOutcome {
    /// Whether the display needs to be redrawn
    #[must_use]
    pub fn changed(&self) -> bool {
        matches!(self, RefreshOutcome::Updated)
    }
}

/// Last known report of one station
#[derive(Debug, Clone)]
pub struct StationWeather {
    ident: Ident,
    report: Option<MetarReport>,
    updated_at: Option<DateTime<Utc>>,
}

impl StationWeather {
    #[must_use]
    pub fn new(ident: Ident) -> Self {
        Self {
            ident,
            report: None,
            updated_at: None,
        }
    }

    #[must_use]
    pub fn ident(&self) -> Ident {
        self.ident
    }

    #[must_use]
    pub fn report(&self) -> Option<&MetarReport> {
        self.report.as_ref()
    }

    /// When the current report was first received
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Switch to another station, dropping the old station's report
    pub fn set_station(&mut self, ident: Ident) {
        if ident != self.ident {
            info!("Switching station {} -> {}", self.ident, ident);
            self.ident = ident;
            self.report = None;
            self.updated_at = None;
        }
    }

    /// Fold a fetch result into the tracked state
    pub fn apply(&mut self, result: Result<Option<MetarReport>>) -> RefreshOutcome {
        match result {
            Ok(Some(report)) => {
                let same = self
                    .report
                    .as_ref()
                    .is_some_and(|current| current.raw == report.raw);
                if same {
                    debug!("Report for {} unchanged", self.ident);
                    RefreshOutcome::Unchanged
                } else {
                    info!("New report for {}: {}", self.ident, report.raw);
                    self.report = Some(report);
                    self.updated_at = Some(Utc::now());
                    RefreshOutcome::Updated
                }
            }
            Ok(None) => {
                warn!("No current report for {}", self.ident);
                RefreshOutcome::NoReport
            }
            Err(e) => {
                warn!("Refresh of {} failed: {}", self.ident, e);
                RefreshOutcome::Failed(e)
            }
        }
    }
}

/// Tracks when the next refresh is due
#[derive(Debug, Clone, Copy)]
pub struct RefreshSchedule {
    next: Instant,
}

impl RefreshSchedule {
    /// A schedule that is due immediately
    #[must_use]
    pub fn due_now() -> Self {
        Self {
            next: Instant::now(),
        }
    }

    /// Next refresh `interval` from now
    pub fn reset(&mut self, interval: Duration) {
        self.next = Instant::now() + interval;
    }

    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next
    }

    #[must_use]
    pub fn remaining(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }
}
