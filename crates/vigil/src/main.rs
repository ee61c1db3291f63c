mod app;
mod commands;
mod logging;
mod render;

fn main() {
    let app = app::build_cli();
    let matches = app.get_matches();

    let verbose = matches.get_flag("verbose");
    let quiet = !verbose;
    logging::init_logging(quiet);

    if let Err(e) = commands::run_command(&matches) {
        // Error already printed to user via eprintln! in command handlers.
        // In verbose mode, JSON logs were also emitted.
        // Exit with non-zero code without printing Rust's Debug representation.
        drop(e);
        std::process::exit(1);
    }
}
