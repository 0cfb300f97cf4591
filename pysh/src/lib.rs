//! py.sh CLI library: argument parsing and dispatch for the `pysh` binary.

mod cli;
mod dispatch;

pub use cli::{Cli, Commands};

use clap::Parser;
use pysh_core::config::{env_keys, ObservabilityConfig, VarSource};
use pysh_core::{interrupt, observability};
use std::process::ExitCode;

/// Run the CLI against a snapshot of the process environment.
pub fn run_cli() -> ExitCode {
    let vars = VarSource::from_os(std::env::vars_os());
    observability::init_tracing(&ObservabilityConfig::from_source(&vars));

    if let Err(e) = interrupt::install_handler() {
        tracing::warn!(error = %e, "Interrupts will not be forwarded");
    }

    match Cli::try_parse() {
        Ok(cli) => dispatch::execute(cli, &vars),
        Err(err) => {
            let traceback = vars.bool(env_keys::cli::PYSH_TRACEBACK, false);
            dispatch::parse_failure(err, traceback)
        }
    }
}
