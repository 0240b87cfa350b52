//! Configuration types for data acquisition and analytics policy.
//!
//! Rate ceilings, batch sizes and thresholds are inputs, never discovered at
//! runtime. Everything has a default; [`InsightsConfig::from_env`] overrides
//! individual values from `GSC_*` environment variables.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{InsightsError, Result};

/// Maximum rows a single upstream request may return.
pub const ROW_CEILING: usize = 25_000;

/// Bounds for the backoff retrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total tries, including the first one.
    ///
    /// Default: 4.
    pub max_attempts: u32,

    /// Delay unit for exponential backoff.
    ///
    /// Default: 1000 ms.
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay_ms: base_delay.as_millis() as u64,
        }
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

/// Bounds for the paginator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Upper bound on rows accumulated across all pages.
    ///
    /// Default: 100,000.
    pub max_rows: usize,

    /// Rows requested per page; clamped to [`ROW_CEILING`].
    ///
    /// Default: 25,000.
    pub page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            max_rows: 100_000,
            page_size: ROW_CEILING,
        }
    }
}

impl PaginationConfig {
    pub fn new(max_rows: usize, page_size: usize) -> Self {
        Self {
            max_rows,
            page_size,
        }
    }

    /// Page size actually requested: between 1 and the row ceiling.
    pub fn effective_page_size(&self) -> usize {
        self.page_size.clamp(1, ROW_CEILING)
    }

    /// Upper bound on page fetches for this configuration.
    pub fn max_pages(&self) -> usize {
        self.max_rows.div_ceil(self.effective_page_size())
    }
}

/// Quota inputs for rate-limited batch operations such as URL inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Larger batches are rejected, not truncated.
    ///
    /// Default: 100.
    pub max_batch_size: usize,

    /// Pause between consecutive calls.
    ///
    /// Default: 1000 ms.
    pub delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            delay_ms: 1000,
        }
    }
}

impl BatchConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// How the caller obtained its credential; only affects remediation hints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    OAuth,
    ServiceAccount,
}

impl FromStr for AuthMode {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oauth" => Ok(AuthMode::OAuth),
            "service_account" | "service-account" => Ok(AuthMode::ServiceAccount),
            other => Err(InsightsError::validation(format!(
                "unknown auth mode '{}' (expected oauth or service_account)",
                other
            ))),
        }
    }
}

/// Click-share policy for cannibalization resolution.
///
/// `ratio` is a page's clicks divided by the winning page's clicks.
/// Below `redirect_below` → redirect; at or above `differentiate_from` →
/// differentiate; in between → consolidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolutionPolicy {
    /// Default: 0.1.
    pub redirect_below: f64,

    /// Default: 0.5.
    pub differentiate_from: f64,
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self {
            redirect_below: 0.1,
            differentiate_from: 0.5,
        }
    }
}

impl ResolutionPolicy {
    pub fn new(redirect_below: f64, differentiate_from: f64) -> Result<Self> {
        let policy = Self {
            redirect_below,
            differentiate_from,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !in_unit(self.redirect_below)
            || !in_unit(self.differentiate_from)
            || self.redirect_below > self.differentiate_from
        {
            return Err(InsightsError::validation(format!(
                "resolution thresholds must satisfy 0 <= redirect_below ({}) <= differentiate_from ({}) <= 1",
                self.redirect_below, self.differentiate_from
            )));
        }
        Ok(())
    }
}

/// Configuration for the whole insights core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsConfig {
    pub retry: RetryPolicy,

    pub pagination: PaginationConfig,

    pub batch: BatchConfig,

    /// Concurrent sections in composite reports.
    ///
    /// Default: 4.
    pub fan_out: usize,

    pub auth_mode: AuthMode,

    pub resolution: ResolutionPolicy,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            pagination: PaginationConfig::default(),
            batch: BatchConfig::default(),
            fan_out: 4,
            auth_mode: AuthMode::default(),
            resolution: ResolutionPolicy::default(),
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| InsightsError::validation(format!("{} is invalid: {}", name, e))),
    }
}

impl InsightsConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides from the environment (and a `.env` file if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load overrides through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "GSC_RETRY_MAX_ATTEMPTS")? {
            config.retry.max_attempts = v;
        }
        if let Some(v) = parse_var(&lookup, "GSC_RETRY_BASE_DELAY_MS")? {
            config.retry.base_delay_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "GSC_MAX_ROWS")? {
            config.pagination.max_rows = v;
        }
        if let Some(v) = parse_var(&lookup, "GSC_PAGE_SIZE")? {
            config.pagination.page_size = v;
        }
        if let Some(v) = parse_var(&lookup, "GSC_INSPECTION_DELAY_MS")? {
            config.batch.delay_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "GSC_INSPECTION_MAX_BATCH")? {
            config.batch.max_batch_size = v;
        }
        if let Some(v) = parse_var(&lookup, "GSC_FAN_OUT")? {
            config.fan_out = v;
        }
        if let Some(v) = parse_var(&lookup, "GSC_AUTH_MODE")? {
            config.auth_mode = v;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(InsightsError::validation("retry max_attempts must be at least 1"));
        }
        if self.fan_out == 0 {
            return Err(InsightsError::validation("fan_out must be at least 1"));
        }
        if self.batch.max_batch_size == 0 {
            return Err(InsightsError::validation("max_batch_size must be at least 1"));
        }
        self.resolution.validate()
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn with_batch(mut self, max_batch_size: usize, delay: Duration) -> Self {
        self.batch = BatchConfig {
            max_batch_size,
            delay_ms: delay.as_millis() as u64,
        };
        self
    }

    pub fn with_fan_out(mut self, fan_out: usize) -> Self {
        self.fan_out = fan_out;
        self
    }

    pub fn with_auth_mode(mut self, auth_mode: AuthMode) -> Self {
        self.auth_mode = auth_mode;
        self
    }

    pub fn with_resolution(mut self, resolution: ResolutionPolicy) -> Self {
        self.resolution = resolution;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = InsightsConfig::default();
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.base_delay(), Duration::from_millis(1000));
        assert_eq!(config.pagination.max_rows, 100_000);
        assert_eq!(config.pagination.page_size, 25_000);
        assert_eq!(config.fan_out, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_page_size_clamped_to_ceiling() {
        let pagination = PaginationConfig::new(100_000, 50_000);
        assert_eq!(pagination.effective_page_size(), ROW_CEILING);
        assert_eq!(pagination.max_pages(), 4);
        assert_eq!(PaginationConfig::new(10, 0).effective_page_size(), 1);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = InsightsConfig::from_lookup(lookup(&[
            ("GSC_RETRY_MAX_ATTEMPTS", "2"),
            ("GSC_MAX_ROWS", "5000"),
            ("GSC_INSPECTION_DELAY_MS", "250"),
            ("GSC_AUTH_MODE", "service_account"),
        ]))
        .unwrap();

        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.pagination.max_rows, 5000);
        assert_eq!(config.batch.delay(), Duration::from_millis(250));
        assert_eq!(config.auth_mode, AuthMode::ServiceAccount);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = InsightsConfig::from_lookup(lookup(&[("GSC_MAX_ROWS", "lots")])).unwrap_err();
        assert!(err.message.contains("GSC_MAX_ROWS"));

        assert!(InsightsConfig::from_lookup(lookup(&[("GSC_FAN_OUT", "0")])).is_err());
        assert!(InsightsConfig::from_lookup(lookup(&[("GSC_AUTH_MODE", "magic")])).is_err());
    }

    #[test]
    fn test_resolution_policy_validation() {
        assert!(ResolutionPolicy::new(0.2, 0.6).is_ok());
        assert!(ResolutionPolicy::new(0.6, 0.2).is_err());
        assert!(ResolutionPolicy::new(-0.1, 0.5).is_err());
    }
}
