//! Refresh loop configuration from environment variables

use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Largest window whose length in milliseconds fits a `Timestamp`
pub const MAX_WINDOW_SECONDS: u64 = (i64::MAX / 1000) as u64;

/// Constants for the refresh orchestrator, fixed at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Delay between the end of one cycle and the start of the next
    pub interval_ms: u64,

    /// Recompute the ranked summary every N cycles
    pub top_n_every: u64,

    /// How far back each fetch asks the data source to look
    pub fetch_range_seconds: u64,

    /// Trailing window of retained history
    pub window_seconds: u64,

    /// N for the ranked summary
    pub top_n_count: usize,

    /// Resource queried from the data source
    pub active_resource: String,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_ms: 400,
            top_n_every: 5,
            fetch_range_seconds: 2,
            window_seconds: 120,
            top_n_count: 3,
            active_resource: "/index.html".to_string(),
        }
    }
}

impl RefreshConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `REFRESH_INTERVAL_MS` (default: 400)
    /// - `TOP_N_EVERY` (default: 5)
    /// - `FETCH_RANGE_SECONDS` (default: 2)
    /// - `WINDOW_SECONDS` (default: 120)
    /// - `TOP_N_COUNT` (default: 3)
    /// - `ACTIVE_RESOURCE` (default: /index.html)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`RefreshConfig::from_env`] with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            interval_ms: positive(&lookup, "REFRESH_INTERVAL_MS", defaults.interval_ms)?,
            top_n_every: positive(&lookup, "TOP_N_EVERY", defaults.top_n_every)?,
            fetch_range_seconds: positive(
                &lookup,
                "FETCH_RANGE_SECONDS",
                defaults.fetch_range_seconds,
            )?,
            window_seconds: positive(&lookup, "WINDOW_SECONDS", defaults.window_seconds)?,
            top_n_count: non_negative(&lookup, "TOP_N_COUNT", defaults.top_n_count as u64)?
                as usize,
            active_resource: lookup("ACTIVE_RESOURCE")
                .map(|s| s.trim().to_string())
                .unwrap_or(defaults.active_resource),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the orchestrator cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::invalid("REFRESH_INTERVAL_MS", "must be greater than 0"));
        }
        if self.top_n_every == 0 {
            return Err(ConfigError::invalid("TOP_N_EVERY", "must be greater than 0"));
        }
        if self.fetch_range_seconds == 0 {
            return Err(ConfigError::invalid("FETCH_RANGE_SECONDS", "must be greater than 0"));
        }
        if self.window_seconds == 0 {
            return Err(ConfigError::invalid("WINDOW_SECONDS", "must be greater than 0"));
        }
        if self.window_seconds > MAX_WINDOW_SECONDS {
            return Err(ConfigError::invalid(
                "WINDOW_SECONDS",
                format!("must be at most {}", MAX_WINDOW_SECONDS),
            ));
        }
        if self.active_resource.is_empty() {
            return Err(ConfigError::invalid("ACTIVE_RESOURCE", "must not be empty"));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Window length in milliseconds, for eviction cutoffs
    pub fn window_ms(&self) -> i64 {
        i64::try_from(self.window_seconds)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000)
    }

    /// Wall-clock time between two ranked summaries
    pub fn top_n_period(&self) -> Duration {
        Duration::from_millis(self.interval_ms.saturating_mul(self.top_n_every))
    }
}

fn parse_signed<F>(lookup: &F, name: &str) -> Result<Option<i64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ConfigError::invalid(name, format!("'{}' is not an integer", raw))),
    }
}

fn non_negative<F>(lookup: &F, name: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_signed(lookup, name)? {
        None => Ok(default),
        Some(value) if value < 0 => Err(ConfigError::invalid(
            name,
            format!("{} is negative", value),
        )),
        Some(value) => Ok(value as u64),
    }
}

pub(crate) fn positive<F>(lookup: &F, name: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = non_negative(lookup, name, default)?;
    if value == 0 {
        return Err(ConfigError::invalid(name, "must be greater than 0"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = RefreshConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config, RefreshConfig::default());
        assert_eq!(config.interval_ms, 400);
        assert_eq!(config.top_n_every, 5);
        assert_eq!(config.fetch_range_seconds, 2);
        assert_eq!(config.window_seconds, 120);
        assert_eq!(config.top_n_count, 3);
        assert_eq!(config.active_resource, "/index.html");
        assert_eq!(config.window_ms(), 120_000);
        assert_eq!(config.top_n_period(), Duration::from_millis(2_000));
    }

    #[test]
    fn test_custom_config() {
        let config = RefreshConfig::from_lookup(lookup_from(&[
            ("REFRESH_INTERVAL_MS", "1000"),
            ("TOP_N_EVERY", "3"),
            ("WINDOW_SECONDS", "10"),
            ("TOP_N_COUNT", "0"),
            ("ACTIVE_RESOURCE", " /info.html "),
        ]))
        .unwrap();

        assert_eq!(config.interval(), Duration::from_secs(1));
        assert_eq!(config.top_n_every, 3);
        assert_eq!(config.window_ms(), 10_000);
        assert_eq!(config.top_n_count, 0);
        assert_eq!(config.active_resource, "/info.html");
    }

    #[test]
    fn test_negative_top_n_count_rejected() {
        let err = RefreshConfig::from_lookup(lookup_from(&[("TOP_N_COUNT", "-1")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref name, .. } if name == "TOP_N_COUNT"));
    }

    #[test]
    fn test_zero_cadence_rejected() {
        assert!(RefreshConfig::from_lookup(lookup_from(&[("TOP_N_EVERY", "0")])).is_err());
        assert!(RefreshConfig::from_lookup(lookup_from(&[("REFRESH_INTERVAL_MS", "0")])).is_err());
    }

    #[test]
    fn test_non_numeric_rejected() {
        let err =
            RefreshConfig::from_lookup(lookup_from(&[("WINDOW_SECONDS", "two minutes")])).unwrap_err();
        assert!(err.to_string().contains("WINDOW_SECONDS"));
    }

    #[test]
    fn test_oversized_window_rejected() {
        let err = RefreshConfig::from_lookup(lookup_from(&[(
            "WINDOW_SECONDS",
            "9223372036854775807",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref name, .. } if name == "WINDOW_SECONDS"));

        let largest = RefreshConfig::from_lookup(lookup_from(&[(
            "WINDOW_SECONDS",
            MAX_WINDOW_SECONDS.to_string().as_str(),
        )]))
        .unwrap();
        assert!(largest.window_ms() > 0);

        // Bypassing validation still never yields a negative window
        let unchecked = RefreshConfig {
            window_seconds: u64::MAX,
            ..RefreshConfig::default()
        };
        assert_eq!(unchecked.window_ms(), i64::MAX);
    }

    #[test]
    fn test_validate_empty_resource() {
        let config = RefreshConfig {
            active_resource: String::new(),
            ..RefreshConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
