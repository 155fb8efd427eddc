//! Runtime configuration.
//!
//! Values come from defaults, optionally overridden by environment variables.

use std::time::Duration;

use crate::persistence::RetryConfig;

/// Default upper bound on a single workbook query.
const DEFAULT_RESOLUTION_TIMEOUT_SECS: u64 = 30;

const DEFAULT_LOCALE: &str = "en";

/// Configuration for a configuration session.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeConfig {
    /// Upper bound on a single option query.
    ///
    /// A query that takes longer is treated as failed, which shows the step's
    /// empty sentinel. Default: 30 seconds. Configure via
    /// `PARAM_CASCADE_RESOLUTION_TIMEOUT_SECS`.
    pub resolution_timeout: Duration,

    /// Backoff for unacknowledged saves.
    ///
    /// Configure the retry count via `PARAM_CASCADE_SAVE_RETRIES`.
    pub save_retry: RetryConfig,

    /// Language tag for the date format samples.
    ///
    /// Default: `en`. Configure via `PARAM_CASCADE_LOCALE`.
    pub locale: String,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CascadeConfig {
    pub fn new() -> Self {
        CascadeConfig {
            resolution_timeout: Duration::from_secs(DEFAULT_RESOLUTION_TIMEOUT_SECS),
            save_retry: RetryConfig::DEFAULT,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    /// Creates a `CascadeConfig` from environment variables.
    ///
    /// Unset or unparseable variables use defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::new();

        let resolution_timeout = lookup("PARAM_CASCADE_RESOLUTION_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.resolution_timeout);

        let save_retry = lookup("PARAM_CASCADE_SAVE_RETRIES")
            .and_then(|s| s.parse::<u32>().ok())
            .map(|n| defaults.save_retry.with_max_retries(n))
            .unwrap_or(defaults.save_retry);

        let locale = lookup("PARAM_CASCADE_LOCALE")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.locale);

        CascadeConfig {
            resolution_timeout,
            save_retry,
            locale,
        }
    }
}
