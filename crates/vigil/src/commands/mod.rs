use std::sync::Arc;

use clap::ArgMatches;
use tracing::{error, warn};

use vigil_client::MemoryCredentialStore;
use vigil_config::VigilConfig;

mod dashboard;
mod health;
mod watch;

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        Some(("health", sub_matches)) => health::handle_health_command(matches, sub_matches),
        Some(("dashboard", sub_matches)) => {
            dashboard::handle_dashboard_command(matches, sub_matches)
        }
        Some(("watch", sub_matches)) => watch::handle_watch_command(matches, sub_matches),
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    }
}

/// Load configuration with warning on errors.
///
/// Falls back to defaults if config loading fails, but notifies the user via:
/// - stderr message for immediate visibility
/// - structured log event `cli.config.load_failed` for debugging
pub(crate) fn load_config_with_warning() -> VigilConfig {
    match VigilConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Could not load config: {}. Using defaults.\n\
                 Tip: Check ~/.vigil/config.toml for syntax errors.",
                e
            );
            warn!(
                event = "cli.config.load_failed",
                error = %e,
                "Config load failed, using defaults"
            );
            VigilConfig::default()
        }
    }
}

/// Base URL precedence: CLI flag > config file.
pub(crate) fn resolve_base_url(matches: &ArgMatches, config: &VigilConfig) -> String {
    matches
        .get_one::<String>("base-url")
        .cloned()
        .unwrap_or_else(|| config.base_url.clone())
}

/// Credential precedence: CLI flag > $VIGIL_TOKEN > unauthenticated.
pub(crate) fn resolve_credentials(matches: &ArgMatches) -> Arc<MemoryCredentialStore> {
    let token = matches
        .get_one::<String>("token")
        .cloned()
        .or_else(|| std::env::var("VIGIL_TOKEN").ok());
    Arc::new(match token {
        Some(token) => MemoryCredentialStore::with_token(token),
        None => MemoryCredentialStore::new(),
    })
}

pub(crate) fn build_runtime() -> Result<tokio::runtime::Runtime, Box<dyn std::error::Error>> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {}", e).into())
}
