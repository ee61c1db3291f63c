use clap::ArgMatches;
use tracing::{error, info};

use vigil_client::HttpHealthProbe;
use vigil_sync::HealthProbe;

pub(crate) fn handle_health_command(
    matches: &ArgMatches,
    _sub_matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config_with_warning();
    let base_url = super::resolve_base_url(matches, &config);

    info!(event = "cli.health_started", base_url = %base_url);

    let probe = match HttpHealthProbe::new(&base_url, config.poll.probe_timeout()) {
        Ok(probe) => probe,
        Err(e) => {
            eprintln!("❌ Invalid service URL '{}': {}", base_url, e);
            error!(event = "cli.health_failed", base_url = %base_url, error = %e);
            return Err(e.into());
        }
    };

    let runtime = super::build_runtime()?;
    match runtime.block_on(probe.probe()) {
        Ok(()) => {
            println!("✅ {} is healthy", base_url);
            info!(event = "cli.health_completed", base_url = %base_url);
            Ok(())
        }
        Err(reason) => {
            eprintln!("❌ {} is unreachable: {}", base_url, reason);
            error!(event = "cli.health_failed", base_url = %base_url, error = %reason);
            Err(reason.into())
        }
    }
}
