//! # vigil-config
//!
//! TOML configuration types, loading, and validation for the vigil
//! console. Single source of truth for poll cadences, the retry backoff
//! ladder, and the search quiet period - all overridable per deployment,
//! never hardcoded at call sites.

mod loading;

pub mod errors;
pub mod types;

pub use errors::ConfigError;
pub use loading::{config_path, load, load_from, validate};
pub use types::{PollConfig, RetryConfig, SearchConfig, VigilConfig};

impl VigilConfig {
    /// Load configuration from `~/.vigil/config.toml`, falling back to
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        loading::load()
    }

    /// Validate the configuration. See [`loading::validate`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        loading::validate(self)
    }
}
