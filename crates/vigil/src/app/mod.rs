mod global;
mod views;


use clap::Command;

pub fn build_cli() -> Command {
    global::root_command()
        .subcommand(views::health_command())
        .subcommand(views::dashboard_command())
        .subcommand(views::watch_command())
}
