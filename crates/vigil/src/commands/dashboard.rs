use clap::ArgMatches;
use serde_json::Value;
use tracing::{error, info};

use vigil_client::{RequestOutcome, SessionGuard};

pub(crate) fn handle_dashboard_command(
    matches: &ArgMatches,
    sub_matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = sub_matches.get_flag("json");
    let config = super::load_config_with_warning();
    let base_url = super::resolve_base_url(matches, &config);
    let credentials = super::resolve_credentials(matches);

    info!(event = "cli.dashboard_started", base_url = %base_url, json_output = json_output);

    let guard = match SessionGuard::with_timeout(&base_url, credentials, config.poll.request_timeout())
    {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ Invalid service URL '{}': {}", base_url, e);
            error!(event = "cli.dashboard_failed", error = %e);
            return Err(e.into());
        }
    };

    let runtime = super::build_runtime()?;
    let outcome = runtime.block_on(vigil_client::api::dashboard_stats(&guard))?;

    match outcome {
        RequestOutcome::Success(payload) => {
            if json_output {
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_stats(&payload);
            }
            info!(event = "cli.dashboard_completed");
            Ok(())
        }
        RequestOutcome::AuthExpired => {
            eprintln!("❌ Session expired. Provide a fresh token via --token or $VIGIL_TOKEN.");
            error!(event = "cli.dashboard_failed", reason = "auth_expired");
            Err("Session expired".into())
        }
        RequestOutcome::RateLimited => {
            eprintln!("⚠️  The service is rate limiting requests. Try again shortly.");
            error!(event = "cli.dashboard_failed", reason = "rate_limited");
            Err("Rate limited".into())
        }
        RequestOutcome::NetworkFailure { reason } => {
            eprintln!("❌ Cannot reach {}: {}", base_url, reason);
            error!(event = "cli.dashboard_failed", reason = %reason);
            Err(reason.into())
        }
        RequestOutcome::ServerError { status, .. } => {
            eprintln!("❌ Service error (HTTP {})", status);
            error!(event = "cli.dashboard_failed", status = status);
            Err(format!("Service returned HTTP {}", status).into())
        }
        RequestOutcome::MalformedResponse { message } => {
            eprintln!("❌ Unexpected response from service: {}", message);
            error!(event = "cli.dashboard_failed", reason = %message);
            Err(message.into())
        }
    }
}

fn print_stats(payload: &Value) {
    println!("📊 Dashboard");
    for line in crate::render::stats_lines(payload) {
        println!("   {}", line);
    }
}
