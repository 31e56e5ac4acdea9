//! In-process stand-in for the producer fleet and count server
//!
//! Fabricates per-second referrer counts for a fixed set of resources, as a
//! fleet of counting workers would publish them. Each one-second bucket is
//! attributed to one simulated host, and the owning host rotates every
//! `failover_period_ms` so provenance changes are visible on the dashboard.
//!
//! Counts for a given (bucket, resource, referrer) are derived from a seeded
//! RNG, so overlapping requests return identical values for the same bucket.

use super::source::{DataSource, DataSourceError, Report, ReportSample};
use crate::store::Timestamp;
use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const DEFAULT_RESOURCES: [&str; 2] = ["/index.html", "/info.html"];

pub const DEFAULT_REFERRERS: [&str; 6] = [
    "http://www.amazon.com",
    "http://www.google.com",
    "http://www.yahoo.com",
    "http://www.bing.com",
    "http://www.stackoverflow.com",
    "http://www.reddit.com",
];

const BUCKET_MS: i64 = 1000;

pub struct SimulatedSource {
    resources: Vec<String>,
    referrers: Vec<String>,
    hosts: Vec<String>,
    seed: u64,
    failover_period_ms: i64,
    failure_rate: f64,
    now_fn: Box<dyn Fn() -> Timestamp + Send + Sync>,
}

impl SimulatedSource {
    /// Simulated fleet of `host_count` workers using the default sample set
    pub fn new(host_count: usize) -> Self {
        let host_count = host_count.max(1);
        Self {
            resources: DEFAULT_RESOURCES.iter().map(|s| s.to_string()).collect(),
            referrers: DEFAULT_REFERRERS.iter().map(|s| s.to_string()).collect(),
            hosts: (1..=host_count).map(|i| format!("sim-worker{:02}", i)).collect(),
            seed: rand::random(),
            failover_period_ms: 30_000,
            failure_rate: 0.0,
            now_fn: Box::new(|| chrono::Utc::now().timestamp_millis()),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Use a custom clock (for deterministic tests)
    pub fn with_clock(mut self, now_fn: Box<dyn Fn() -> Timestamp + Send + Sync>) -> Self {
        self.now_fn = now_fn;
        self
    }

    /// Fraction of requests that fail as if the transport dropped them
    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = failure_rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_failover_period_ms(mut self, period_ms: i64) -> Self {
        self.failover_period_ms = period_ms.max(BUCKET_MS);
        self
    }

    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    fn host_for(&self, bucket: Timestamp) -> &str {
        let slot = bucket.div_euclid(self.failover_period_ms) as usize;
        &self.hosts[slot % self.hosts.len()]
    }

    fn bucket_report(&self, resource: &str, bucket: Timestamp) -> Report {
        let mut samples: Vec<ReportSample> = self
            .referrers
            .iter()
            .enumerate()
            .map(|(rank, referrer)| {
                let mut rng = StdRng::seed_from_u64(self.bucket_seed(resource, referrer, bucket));
                // Earlier referrers in the list draw from a wider range
                let ceiling = ((self.referrers.len() - rank) * 20) as i64;
                ReportSample {
                    key: referrer.clone(),
                    count: rng.gen_range(0..=ceiling),
                }
            })
            .collect();

        samples.sort_by(|a, b| b.count.cmp(&a.count));

        Report {
            producer_id: self.host_for(bucket).to_string(),
            timestamp: bucket,
            samples,
        }
    }

    fn bucket_seed(&self, resource: &str, referrer: &str, bucket: Timestamp) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        resource.hash(&mut hasher);
        referrer.hash(&mut hasher);
        bucket.hash(&mut hasher);
        hasher.finish()
    }
}

#[async_trait]
impl DataSource for SimulatedSource {
    async fn request(
        &self,
        resource: &str,
        range_seconds: u64,
    ) -> Result<Vec<Report>, DataSourceError> {
        if self.failure_rate > 0.0 && rand::thread_rng().gen_bool(self.failure_rate) {
            return Err(DataSourceError::Unavailable(
                "simulated transport failure".to_string(),
            ));
        }

        if !self.resources.iter().any(|r| r == resource) {
            return Ok(Vec::new());
        }

        let now = (self.now_fn)();
        // Newest complete bucket
        let newest = now.div_euclid(BUCKET_MS) * BUCKET_MS - BUCKET_MS;
        let buckets = range_seconds.max(1) as i64;

        let reports = (0..buckets)
            .rev()
            .map(|offset| self.bucket_report(resource, newest - offset * BUCKET_MS))
            .collect();

        Ok(reports)
    }

    fn source_type(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_source(now: Timestamp) -> SimulatedSource {
        SimulatedSource::new(2)
            .with_seed(42)
            .with_clock(Box::new(move || now))
    }

    #[tokio::test]
    async fn test_reports_cover_requested_range() {
        let source = fixed_source(10_500);
        let reports = source.request("/index.html", 3).await.unwrap();

        let timestamps: Vec<_> = reports.iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![7_000, 8_000, 9_000]);

        for report in &reports {
            assert_eq!(report.samples.len(), DEFAULT_REFERRERS.len());
            assert!(report
                .samples
                .windows(2)
                .all(|pair| pair[0].count >= pair[1].count));
            assert!(report.samples.iter().all(|s| s.count >= 0));
        }
    }

    #[tokio::test]
    async fn test_overlapping_requests_agree() {
        let first = fixed_source(10_500).request("/index.html", 3).await.unwrap();
        let second = fixed_source(11_200).request("/index.html", 3).await.unwrap();

        // Buckets 8000 and 9000 appear in both responses with the same values
        assert_eq!(first[1], second[0]);
        assert_eq!(first[2], second[1]);
    }

    #[tokio::test]
    async fn test_unknown_resource_is_empty() {
        let reports = fixed_source(10_000).request("/missing.html", 2).await.unwrap();
        assert!(reports.is_empty());
    }

    #[tokio::test]
    async fn test_hosts_rotate_on_failover_period() {
        let source = SimulatedSource::new(2)
            .with_seed(7)
            .with_failover_period_ms(2_000)
            .with_clock(Box::new(|| 5_000));

        let reports = source.request("/info.html", 4).await.unwrap();
        let hosts: Vec<_> = reports.iter().map(|r| r.producer_id.as_str()).collect();
        // Buckets 1000, 2000, 3000, 4000 → slots 0, 1, 1, 2
        assert_eq!(
            hosts,
            vec!["sim-worker01", "sim-worker02", "sim-worker02", "sim-worker01"]
        );
    }

    #[tokio::test]
    async fn test_failure_rate_one_always_fails() {
        let source = fixed_source(10_000).with_failure_rate(1.0);
        assert!(matches!(
            source.request("/index.html", 2).await,
            Err(DataSourceError::Unavailable(_))
        ));
    }
}
