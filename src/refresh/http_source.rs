//! HTTP count endpoint client
//!
//! Queries the count server for recent referrer counts of one resource.
//!
//! ## API Reference
//!
//! Endpoint: `GET {endpoint}?resource={resource}&range_in_seconds={n}`
//! Returns: JSON array of count snapshots, referrer counts sorted descending
//!
//! ```json
//! [{
//!   "resource": "/index.html",
//!   "timestamp": 1397156430562,
//!   "host": "worker01-ec2",
//!   "referrerCounts": [
//!     {"referrer": "http://www.amazon.com", "count": 1002},
//!     {"referrer": "http://aws.amazon.com", "count": 901}
//!   ]
//! }]
//! ```
//!
//! The body must be a JSON array. Below that, each snapshot and each referrer
//! entry is deserialized on its own, so a broken one is logged and skipped
//! while the rest of the response is kept.

use super::source::{DataSource, DataSourceError, Report, ReportSample};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// One count snapshot as the server sends it
///
/// Referrer entries stay as raw values so a broken one can be skipped
/// without losing the snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct RawReport {
    pub host: String,
    pub timestamp: i64,
    #[serde(rename = "referrerCounts")]
    pub referrer_counts: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawReferrerCount {
    pub referrer: String,
    pub count: i64,
}

pub struct HttpCountsSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCountsSource {
    /// Build a client for `endpoint` with a per-request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, DataSourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DataSource for HttpCountsSource {
    async fn request(
        &self,
        resource: &str,
        range_seconds: u64,
    ) -> Result<Vec<Report>, DataSourceError> {
        let range = range_seconds.to_string();

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("resource", resource), ("range_in_seconds", range.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DataSourceError::Status(response.status().as_u16()));
        }

        let entries: Vec<Value> = response.json().await.map_err(|e| {
            if e.is_decode() {
                DataSourceError::Malformed(e.to_string())
            } else {
                DataSourceError::Http(e)
            }
        })?;

        Ok(reports_from_entries(entries))
    }

    fn source_type(&self) -> &'static str {
        "http"
    }
}

/// Parse a count endpoint response body
///
/// Fails only when the body is not a JSON array. Individual snapshots that do
/// not deserialize into [`RawReport`] are skipped, as are referrer entries that
/// do not deserialize into [`RawReferrerCount`].
pub fn parse_reports(body: &str) -> Result<Vec<Report>, DataSourceError> {
    let entries: Vec<Value> =
        serde_json::from_str(body).map_err(|e| DataSourceError::Malformed(e.to_string()))?;

    Ok(reports_from_entries(entries))
}

fn reports_from_entries(entries: Vec<Value>) -> Vec<Report> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<RawReport>(entry) {
            Ok(raw) => Some(raw.into_report()),
            Err(e) => {
                log::warn!("⚠️  Skipping report #{}: {}", index, e);
                None
            }
        })
        .collect()
}

impl RawReport {
    fn into_report(self) -> Report {
        let host = self.host;
        let timestamp = self.timestamp;

        let samples = self
            .referrer_counts
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<RawReferrerCount>(entry) {
                Ok(count) => Some(ReportSample {
                    key: count.referrer,
                    count: count.count,
                }),
                Err(e) => {
                    log::warn!(
                        "⚠️  Skipping malformed referrer count from {} at {}: {}",
                        host,
                        timestamp,
                        e
                    );
                    None
                }
            })
            .collect();

        Report {
            producer_id: host,
            timestamp,
            samples,
        }
    }
}
