//! Config file discovery and parsing.
//!
//! One file, `~/.vigil/config.toml`. Missing file means defaults; a file
//! that exists but fails to parse is an error - silently ignoring a typo'd
//! config and polling at the wrong cadence is worse than failing loudly.

use std::path::{Path, PathBuf};

use crate::errors::ConfigError;
use crate::types::VigilConfig;

/// Resolve the user config path (`~/.vigil/config.toml`).
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".vigil").join("config.toml"))
}

/// Load the configuration from the default location.
pub fn load() -> Result<VigilConfig, ConfigError> {
    match config_path() {
        Some(path) => load_from(&path),
        None => {
            tracing::warn!(event = "config.loading.no_home_dir");
            Ok(VigilConfig::default())
        }
    }
}

/// Load the configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<VigilConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(
            event = "config.loading.file_missing",
            path = %path.display(),
        );
        return Ok(VigilConfig::default());
    }

    let raw = std::fs::read_to_string(path)?;
    let config: VigilConfig = toml::from_str(&raw).map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })?;
    validate(&config)?;

    tracing::debug!(
        event = "config.loading.loaded",
        path = %path.display(),
    );
    Ok(config)
}

/// Validate configuration values after parsing.
pub fn validate(config: &VigilConfig) -> Result<(), ConfigError> {
    if config.base_url.trim().is_empty() {
        return Err(ConfigError::InvalidConfiguration {
            message: "base_url must not be empty".to_string(),
        });
    }
    for (name, value) in [
        ("poll.dashboard_interval_ms", config.poll.dashboard_interval_ms),
        ("poll.list_interval_ms", config.poll.list_interval_ms),
        ("poll.badge_interval_ms", config.poll.badge_interval_ms),
        ("poll.probe_interval_ms", config.poll.probe_interval_ms),
        ("poll.probe_timeout_ms", config.poll.probe_timeout_ms),
        ("poll.request_timeout_ms", config.poll.request_timeout_ms),
        ("search.quiet_period_ms", config.search.quiet_period_ms),
    ] {
        if value == 0 {
            return Err(ConfigError::InvalidConfiguration {
                message: format!("{} must be > 0", name),
            });
        }
    }
    if config.retry.delays_ms.is_empty() {
        return Err(ConfigError::InvalidConfiguration {
            message: "retry.delays_ms must have at least one entry".to_string(),
        });
    }
    if config.retry.delays_ms.contains(&0) {
        return Err(ConfigError::InvalidConfiguration {
            message: "retry.delays_ms entries must be > 0".to_string(),
        });
    }
    Ok(())
}
