use std::io::{self, IsTerminal};

use crate::app_config::FileConfig;
use crate::cli::Cli;

pub(crate) fn no_color_env_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
}

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

pub(crate) fn should_use_spinner(
    stderr_is_terminal: bool,
    quiet: bool,
    dumb_terminal: bool,
) -> bool {
    stderr_is_terminal && !quiet && !dumb_terminal
}

pub(crate) fn spinner_enabled(cli: &Cli) -> bool {
    should_use_spinner(io::stderr().is_terminal(), cli.quiet, is_dumb_terminal())
}

/// Log level used when `RUST_LOG` is unset.
///
/// Priority: `-q`, then `-v`/`-vv`, then the config file's verbosity, then `info`.
pub(crate) fn resolve_default_log_level(cli: &Cli, file_config: &FileConfig) -> &'static str {
    if cli.quiet {
        return "error";
    }
    match cli.verbose {
        0 => file_config
            .verbosity
            .map_or("info", |verbosity| verbosity.log_level()),
        1 => "debug",
        _ => "trace",
    }
}

pub(crate) fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color_env_requested() && !is_dumb_terminal())
        .with_env_filter(filter)
        .try_init();
}
