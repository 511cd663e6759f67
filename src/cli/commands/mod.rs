pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const CMD_CHECK: &str = "check";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("solvana")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("SOLVANA_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("web-root")
                .long("web-root")
                .help("Directory holding the built web bundle (index.html and assets)")
                .env("SOLVANA_WEB_ROOT"),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Base URL of the backend API")
                .default_value(crate::api::DEFAULT_API_URL)
                .env("SOLVANA_API_URL")
                .global(true),
        )
        .subcommand(
            Command::new(CMD_CHECK)
                .about("Evaluate the navigation gate for a path and print the decision")
                .arg(
                    Arg::new("path")
                        .help("Path to evaluate, e.g. /dashboard")
                        .required(true),
                )
                .arg(
                    Arg::new("token")
                        .long("token")
                        .help("Session credential (JWT) to evaluate with")
                        .env("SOLVANA_TOKEN")
                        .hide_env_values(true),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the full evaluation as JSON")
                        .action(ArgAction::SetTrue),
                ),
        );

    logging::with_args(command)
}
