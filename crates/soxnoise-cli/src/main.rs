//! sox-noise - SoX-powered noise generator
//!
//! Starts a session from defaults, the settings file and the command line,
//! then reads commands from stdin (or plays until interrupted with `--hide`).

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use soxnoise_cli::cli_args::Cli;
use soxnoise_cli::session;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match session::run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

/// Logs to stderr; stdout may carry the audio stream. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
