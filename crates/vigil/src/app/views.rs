use clap::{Arg, ArgAction, Command};

pub fn health_command() -> Command {
    Command::new("health").about("Probe the service health endpoint once")
}

pub fn dashboard_command() -> Command {
    Command::new("dashboard")
        .about("Fetch dashboard statistics once")
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the raw JSON payload")
                .action(ArgAction::SetTrue),
        )
}

pub fn watch_command() -> Command {
    Command::new("watch")
        .about("Live view of the dashboard or of recent scans, reports, notifications or users")
        .long_about(
            "Polls the selected view on a fixed cadence and redraws the terminal. \
             The dashboard view combines the stats summary with the latest scans; \
             newly arrived records are marked NEW exactly once. Type to filter \
             (applied after a short quiet period), send an empty line to clear \
             the filter (or to retry immediately while offline), 'q' to quit.",
        )
        .arg(
            Arg::new("view")
                .help("Which view to watch")
                .required(true)
                .value_parser(["dashboard", "scans", "reports", "notifications", "users"]),
        )
        .arg(
            Arg::new("limit")
                .short('n')
                .long("limit")
                .help("Number of records to request per refresh")
                .value_parser(clap::value_parser!(usize))
                .default_value("20"),
        )
        .arg(
            Arg::new("interval-ms")
                .long("interval-ms")
                .help("Poll interval in milliseconds (overrides config)")
                .value_parser(clap::value_parser!(u64)),
        )
}
