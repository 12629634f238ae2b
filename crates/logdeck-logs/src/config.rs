//! Configuration of the reader, tail, and storage components.
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below.

use serde::Deserialize;
use std::time::Duration;

use crate::RetryPolicy;

/// Whole configuration file
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogdeckConfig {
    pub reader: ReaderConfig,
    pub tail: TailConfig,
    pub storage: StorageConfig,
}

/// Log reader defaults
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Comma-separated level names, e.g. "INFO,DEBUG,WARN"
    pub default_log_levels: Option<String>,

    /// Must be 10, 20 or 50 to take effect
    pub default_logs_per_page: Option<u32>,
}

/// Push-driven refresh timing
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TailConfig {
    /// Wait after a notification before fetching
    pub refresh_delay_ms: u64,

    pub retry_attempts: u32,

    pub retry_backoff_ms: u64,

    /// How long newly tailed records stay highlighted
    pub highlight_ms: u64,
}

impl TailConfig {
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_millis(self.retry_backoff_ms))
    }

    pub fn highlight(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            refresh_delay_ms: 500,
            retry_attempts: 3,
            retry_backoff_ms: 1000,
            highlight_ms: 2000,
        }
    }
}

/// Storage summary panel settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Auto-refresh period; disabled when unset or zero
    pub refresh_interval_secs: Option<u64>,

    /// Date range token, e.g. "THIS_WEEK"
    pub default_date_filter: String,

    /// One of line, bar, stackedBar, area, off
    pub chart_type: String,
}

impl StorageConfig {
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: None,
            default_date_filter: "THIS_WEEK".to_string(),
            chart_type: "bar".to_string(),
        }
    }
}
