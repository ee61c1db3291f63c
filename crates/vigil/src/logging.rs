use tracing_subscriber::EnvFilter;

/// Initialize tracing for the CLI.
///
/// Quiet mode (the default) only surfaces warnings and errors; command
/// output itself goes through println!/eprintln!. Verbose mode emits
/// JSON events to stderr so interactive views on stdout stay intact.
/// `RUST_LOG` overrides the default filter either way.
pub fn init_logging(quiet: bool) {
    let default_directive = if quiet { "warn" } else { "debug" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if quiet {
        builder.init();
    } else {
        builder.json().init();
    }
}
