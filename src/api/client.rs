//! HTTP client for the aviationweather.gov data API
//!
//! Requests are retried with exponential backoff on connection failures,
//! timeouts and 5xx/429 responses. Anything else fails immediately.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, warn};

use super::MetarSource;
use super::wire::{MetarRecord, StationRecord};
use crate::config::SourceConfig;
use crate::models::{Ident, MetarReport, StationInfo};
use crate::{MetarError, Result};

/// Longest server-requested wait we honour before retrying
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// METAR client for aviationweather.gov
#[derive(Debug, Clone)]
pub struct AviationWeatherClient {
    client: Client,
    base_url: String,
    max_retries: u32,
    retry_backoff: Duration,
}

fn map_reqwest_error(e: &reqwest::Error) -> MetarError {
    if e.is_timeout() {
        MetarError::timeout(e.to_string())
    } else if e.is_decode() {
        MetarError::source(format!("Undecodable response: {e}"), None)
    } else if let Some(status) = e.status() {
        MetarError::source(e.to_string(), Some(status.as_u16()))
    } else {
        MetarError::connection(e.to_string())
    }
}

impl AviationWeatherClient {
    /// Create a new client from the source settings
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| MetarError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_secs(1),
        })
    }

    /// Base delay before the first retry, doubled on every further attempt
    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    fn endpoint(&self, path: &str, ident: &Ident) -> String {
        format!(
            "{}/{}?ids={}&format=json",
            self.base_url,
            path,
            urlencoding::encode(&ident.station())
        )
    }

    /// GET `url` and decode a JSON array, treating "no content" as empty
    async fn fetch_records<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        let response = self.make_request(url).await?;
        if response.status() == StatusCode::NO_CONTENT {
            debug!("Provider returned no content");
            return Ok(Vec::new());
        }

        let body = response.text().await.map_err(|e| map_reqwest_error(&e))?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse provider response: {}", e);
            MetarError::source(format!("Invalid data received from provider: {e}"), None)
        })
    }

    /// Make a GET request, retrying transient failures
    async fn make_request(&self, url: &str) -> Result<Response> {
        let max_attempts = self.max_retries + 1;
        let request_start = Instant::now();
        let mut attempt = 0;

        debug!("Starting HTTP request (max attempts: {})", max_attempts);

        loop {
            let attempt_start = Instant::now();
            debug!(
                "Making HTTP request (attempt {}/{})",
                attempt + 1,
                max_attempts
            );

            let (failure, wait) = match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!(
                        "HTTP response received: {} in {:.3}s",
                        status,
                        attempt_start.elapsed().as_secs_f64()
                    );

                    if status.is_success() {
                        info!(
                            "Successful provider request in {:.3}s (attempt {})",
                            request_start.elapsed().as_secs_f64(),
                            attempt + 1
                        );
                        return Ok(response);
                    }

                    let retry_after = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|h| h.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER));

                    let failure = MetarError::source(
                        format!(
                            "Provider request failed with status: {} - {}",
                            status,
                            status.canonical_reason().unwrap_or("Unknown error")
                        ),
                        Some(status.as_u16()),
                    );
                    (failure, retry_after)
                }
                Err(e) => {
                    warn!(
                        "Network error on attempt {} ({:.3}s): {}",
                        attempt + 1,
                        attempt_start.elapsed().as_secs_f64(),
                        e
                    );
                    (map_reqwest_error(&e), None)
                }
            };

            if !failure.is_transient() || attempt + 1 >= max_attempts {
                error!(
                    "Provider request failed after {} attempt(s): {}",
                    attempt + 1,
                    failure
                );
                return Err(failure);
            }

            let backoff = wait.unwrap_or_else(|| self.retry_backoff * 2_u32.pow(attempt));
            warn!(
                "Transient failure ({}), retrying in {:.1}s",
                failure,
                backoff.as_secs_f64()
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl MetarSource for AviationWeatherClient {
    #[instrument(skip(self), fields(station = %ident))]
    async fn latest(&self, ident: &Ident) -> Result<Option<MetarReport>> {
        let start_time = Instant::now();
        let url = self.endpoint("metar", ident);
        debug!("METAR request URL: {}", url);

        let records: Vec<MetarRecord> = self.fetch_records(&url).await?;
        let report = records
            .into_iter()
            .max_by_key(|record| record.obs_time.unwrap_or_default())
            .map(MetarReport::from);

        match &report {
            Some(report) => info!(
                "Fetched {} report for {} in {:.3}s",
                report.time_repr(),
                ident,
                start_time.elapsed().as_secs_f64()
            ),
            None => info!("No current report for {}", ident),
        }

        Ok(report)
    }

    #[instrument(skip(self), fields(station = %ident))]
    async fn station_info(&self, ident: &Ident) -> Result<StationInfo> {
        let url = self.endpoint("stationinfo", ident);
        debug!("Station info request URL: {}", url);

        let records: Vec<StationRecord> = self.fetch_records(&url).await?;
        records
            .into_iter()
            .next()
            .map(|record| record.into_station_info(*ident))
            .ok_or_else(|| {
                warn!("Unknown station {}", ident);
                MetarError::bad_station(ident.station())
            })
    }
}
