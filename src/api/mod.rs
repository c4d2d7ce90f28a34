//! METAR data provider access
//!
//! [`MetarSource`] is the seam both display targets fetch through. The
//! production implementation talks to the aviationweather.gov data API.

use async_trait::async_trait;

use crate::Result;
use crate::models::{Ident, MetarReport, StationInfo};

pub mod client;
pub mod wire;

pub use client::AviationWeatherClient;

/// Anything that can answer "what is the latest report for this station"
#[async_trait]
pub trait MetarSource: Send + Sync {
    /// Most recent report, or `None` when the station has no current report
    async fn latest(&self, ident: &Ident) -> Result<Option<MetarReport>>;

    /// Station metadata; fails with `BadStation` for unknown identifiers
    async fn station_info(&self, ident: &Ident) -> Result<StationInfo>;
}

/// Why a station produced no report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingReason {
    /// The station exists and publishes METARs, just not recently
    NoCurrentReport,
    /// The identifier is not a known station
    UnknownStation,
    /// The station exists but publishes no METARs
    NoReportsPublished,
}

/// Work out why `ident` came back empty, by asking for its station record
pub async fn explain_missing(source: &dyn MetarSource, ident: &Ident) -> Result<MissingReason> {
    match source.station_info(ident).await {
        Ok(info) if info.sends_reports() => Ok(MissingReason::NoCurrentReport),
        Ok(_) => Ok(MissingReason::NoReportsPublished),
        Err(crate::MetarError::BadStation { .. }) => Ok(MissingReason::UnknownStation),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::MetarError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted source for driving the display state machines
    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub reports: Mutex<HashMap<String, Vec<Result<Option<MetarReport>>>>>,
        pub stations: HashMap<String, StationInfo>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        pub(crate) fn push(&self, station: &str, result: Result<Option<MetarReport>>) {
            self.reports
                .lock()
                .unwrap()
                .entry(station.to_string())
                .or_default()
                .push(result);
        }

        pub(crate) fn with_station(mut self, station: &str, site_types: &[&str]) -> Self {
            self.stations.insert(
                station.to_string(),
                StationInfo {
                    ident: Ident::parse(station).unwrap(),
                    name: None,
                    country: None,
                    site_types: site_types.iter().map(|s| s.to_string()).collect(),
                },
            );
            self
        }
    }

    #[async_trait]
    impl MetarSource for FakeSource {
        async fn latest(&self, ident: &Ident) -> Result<Option<MetarReport>> {
            self.calls.lock().unwrap().push(ident.station());
            let mut reports = self.reports.lock().unwrap();
            match reports.get_mut(&ident.station()) {
                Some(queue) if !queue.is_empty() => queue.remove(0),
                _ => Ok(None),
            }
        }

        async fn station_info(&self, ident: &Ident) -> Result<StationInfo> {
            self.stations
                .get(&ident.station())
                .cloned()
                .ok_or_else(|| MetarError::bad_station(ident.station()))
        }
    }

    #[tokio::test]
    async fn test_explain_missing() {
        let source = FakeSource::default()
            .with_station("KJFK", &["METAR", "TAF"])
            .with_station("KXYZ", &["TAF"]);

        let jfk = Ident::parse("KJFK").unwrap();
        let xyz = Ident::parse("KXYZ").unwrap();
        let none = Ident::parse("QQQQ").unwrap();

        assert_eq!(
            explain_missing(&source, &jfk).await.unwrap(),
            MissingReason::NoCurrentReport
        );
        assert_eq!(
            explain_missing(&source, &xyz).await.unwrap(),
            MissingReason::NoReportsPublished
        );
        assert_eq!(
            explain_missing(&source, &none).await.unwrap(),
            MissingReason::UnknownStation
        );
    }
}
