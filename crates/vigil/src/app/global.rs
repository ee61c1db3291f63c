use clap::{Arg, ArgAction, Command};

pub fn root_command() -> Command {
    Command::new("vigil")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Live triage console for the scam-detection service")
        .long_about(
            "Vigil keeps terminal views of the scam-detection service's scans, \
             reports and notifications fresh: it polls on a fixed cadence, tracks \
             service reachability with backoff retries, highlights newly arrived \
             records, and debounces interactive filtering.",
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .help("Service base URL (overrides ~/.vigil/config.toml)")
                .value_name("URL")
                .global(true),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .help("Bearer token for authenticated endpoints (falls back to $VIGIL_TOKEN)")
                .value_name("TOKEN")
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
}
