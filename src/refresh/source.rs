//! Data source seam for snapshot reports
//!
//! A data source answers one question: "what counts do you have for this
//! resource over the last N seconds?" Implementations live in
//! [`super::http_source`] and [`super::simulated`].

use crate::store::{Observation, Timestamp};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Count endpoint returned status {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Data source unavailable: {0}")]
    Unavailable(String),
}

/// One referrer count inside a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSample {
    pub key: String,
    pub count: i64,
}

/// A snapshot of referrer counts computed by one producer at one instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub producer_id: String,
    pub timestamp: Timestamp,
    pub samples: Vec<ReportSample>,
}

impl Report {
    /// Flatten into store observations sharing this report's timestamp and producer
    pub fn observations(&self) -> impl Iterator<Item = Observation> + '_ {
        self.samples.iter().map(move |sample| Observation {
            key: sample.key.clone(),
            timestamp: self.timestamp,
            count: sample.count,
            producer_id: self.producer_id.clone(),
        })
    }
}

/// Flatten a response into one merge batch, preserving report order
pub fn into_batch(reports: &[Report]) -> Vec<Observation> {
    reports.iter().flat_map(Report::observations).collect()
}

/// Backend that yields snapshot reports for a resource
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Reports for `resource` covering the last `range_seconds`
    async fn request(
        &self,
        resource: &str,
        range_seconds: u64,
    ) -> Result<Vec<Report>, DataSourceError>;

    /// Source name for logging
    fn source_type(&self) -> &'static str;
}
