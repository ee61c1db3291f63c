use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration for the vigil console.
///
/// Read from `~/.vigil/config.toml`; every field has a default so a
/// missing file or empty table is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VigilConfig {
    /// Base URL of the remote service.
    /// Default: `http://127.0.0.1:8001`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

/// Poll cadences. These are configuration, not constants: each view
/// instance can be overridden (CLI flags take precedence over the file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Dashboard-class views. Default: 5000ms.
    #[serde(default = "default_view_interval_ms")]
    pub dashboard_interval_ms: u64,

    /// List views (scans / reports / users). Default: 5000ms.
    #[serde(default = "default_view_interval_ms")]
    pub list_interval_ms: u64,

    /// Notification-badge poll. Default: 15000ms.
    #[serde(default = "default_badge_interval_ms")]
    pub badge_interval_ms: u64,

    /// Connectivity probe cadence. Default: 30000ms.
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,

    /// Per-probe response deadline. Default: 5000ms.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Per-request deadline for API calls. Default: 30000ms.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Backoff ladder used while the service is offline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delays between successive retries; the last entry repeats.
    /// Default: [1000, 2000, 5000, 10000].
    #[serde(default = "default_retry_delays_ms")]
    pub delays_ms: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before the filter applies
    /// (and for which background refresh is paused). Default: 2000ms.
    #[serde(default = "default_quiet_period_ms")]
    pub quiet_period_ms: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8001".to_string()
}

fn default_view_interval_ms() -> u64 {
    5_000
}

fn default_badge_interval_ms() -> u64 {
    15_000
}

fn default_probe_interval_ms() -> u64 {
    30_000
}

fn default_probe_timeout_ms() -> u64 {
    5_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_retry_delays_ms() -> Vec<u64> {
    vec![1_000, 2_000, 5_000, 10_000]
}

fn default_quiet_period_ms() -> u64 {
    2_000
}

impl Default for VigilConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll: PollConfig::default(),
            retry: RetryConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            dashboard_interval_ms: default_view_interval_ms(),
            list_interval_ms: default_view_interval_ms(),
            badge_interval_ms: default_badge_interval_ms(),
            probe_interval_ms: default_probe_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delays_ms: default_retry_delays_ms(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: default_quiet_period_ms(),
        }
    }
}

impl PollConfig {
    pub fn dashboard_interval(&self) -> Duration {
        Duration::from_millis(self.dashboard_interval_ms)
    }

    pub fn list_interval(&self) -> Duration {
        Duration::from_millis(self.list_interval_ms)
    }

    pub fn badge_interval(&self) -> Duration {
        Duration::from_millis(self.badge_interval_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl SearchConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }
}
