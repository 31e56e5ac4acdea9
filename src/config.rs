use crate::refresh::config::positive;
use crate::refresh::{ConfigError, RefreshConfig};
use std::env;
use std::time::Duration;

/// Where reports come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Http,
    Simulated,
}

impl SourceKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "http" => Some(SourceKind::Http),
            "simulated" | "sim" => Some(SourceKind::Simulated),
            _ => None,
        }
    }
}

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: SourceKind,
    pub endpoint: String,
    pub http_timeout_ms: u64,
    pub simulated_hosts: usize,
    /// Resources the dashboard can switch between
    pub resources: Vec<String>,
    pub refresh: RefreshConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - `COUNTS_SOURCE` - `http` or `simulated` (default: http)
    /// - `COUNTS_ENDPOINT` (default: http://localhost:8080/api/GetCounts)
    /// - `HTTP_TIMEOUT_MS` (default: 2000)
    /// - `SIMULATED_HOSTS` (default: 2)
    /// - `RESOURCES` - comma-separated (default: /index.html,/info.html)
    ///
    /// plus everything [`RefreshConfig::from_env`] reads.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = match lookup("COUNTS_SOURCE") {
            None => SourceKind::Http,
            Some(raw) => SourceKind::parse(&raw).ok_or_else(|| {
                ConfigError::invalid("COUNTS_SOURCE", format!("unknown source '{}'", raw))
            })?,
        };

        let endpoint = lookup("COUNTS_ENDPOINT")
            .unwrap_or_else(|| "http://localhost:8080/api/GetCounts".to_string());

        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::invalid(
                "COUNTS_ENDPOINT",
                "must start with http:// or https://",
            ));
        }

        // A zero timeout would fail every request
        let http_timeout_ms = positive(&lookup, "HTTP_TIMEOUT_MS", 2_000)?;

        let simulated_hosts = lookup("SIMULATED_HOSTS")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(2);

        let refresh = RefreshConfig::from_lookup(&lookup)?;

        // Optional resource list; the active resource is always included
        let mut resources: Vec<String> = lookup("RESOURCES")
            .map(|s| {
                s.split(',')
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["/index.html".to_string(), "/info.html".to_string()]);

        if !resources.contains(&refresh.active_resource) {
            resources.insert(0, refresh.active_resource.clone());
        }

        Ok(Self {
            source,
            endpoint,
            http_timeout_ms,
            simulated_hosts,
            resources,
            refresh,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Resource after `current` in the switch list, wrapping around
    pub fn next_resource(&self, current: &str) -> &str {
        let position = self.resources.iter().position(|r| r == current);
        let next = position.map(|i| (i + 1) % self.resources.len()).unwrap_or(0);
        &self.resources[next]
    }
}
