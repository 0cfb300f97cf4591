//! Command dispatch and exit status.

use anyhow::Result;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use pysh_commands::{
    activate, clean, dist, download_deps, install, run, CommandContext, DistOptions,
    InstallOptions,
};
use pysh_core::config::VarSource;
use pysh_core::{Reporter, Settings, TaskError};
use pysh_env::ShellRunner;
use std::process::ExitCode;

use crate::cli::{Cli, Commands};

/// Build settings for `cli`, run the command inside the top-level reporting
/// scope and map the outcome to an exit status.
pub fn execute(cli: Cli, vars: &VarSource) -> ExitCode {
    let settings = Settings::from_source(vars).with_cli_overrides(cli.overrides());
    let reporter = Reporter::stdout(settings.traceback);
    let runner = ShellRunner::new(&settings);
    let ctx = CommandContext::new(&settings, &runner, &reporter);
    tracing::debug!(
        command = ?cli.command,
        root = %settings.root_path.display(),
        env = %settings.conda_env,
        "Dispatching"
    );
    let explicit_env = cli.conda_env;
    ExitCode::from(reporter.capture(|| run_command(&ctx, cli.command, explicit_env)))
}

fn run_command(ctx: &CommandContext<'_>, command: Commands, explicit_env: Option<String>) -> Result<()> {
    match command {
        Commands::Clean => clean(ctx),
        Commands::Install {
            offline,
            production,
        } => install(ctx, InstallOptions { offline, production }),
        Commands::DownloadDeps { production } => download_deps(ctx, production),
        Commands::Dist { dist_dir } => {
            dist(
                ctx,
                &DistOptions {
                    dist_dir,
                    conda_env: explicit_env,
                },
            )?;
            Ok(())
        }
        Commands::Activate => activate(ctx),
        Commands::Run { args } => run(ctx, &args),
    }
}

/// Handle a command line clap rejected. Help and version exit 0; unknown
/// arguments are reported like any other task error; everything else is
/// printed by clap. Failures exit 1.
pub fn parse_failure(err: clap::Error, traceback: bool) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = err.print();
            ExitCode::SUCCESS
        }
        ErrorKind::UnknownArgument => {
            let reporter = Reporter::stdout(traceback);
            let args = unknown_arguments(&err);
            ExitCode::from(reporter.capture(|| Err(TaskError::UnknownArguments(args).into())))
        }
        _ => {
            let _ = err.print();
            ExitCode::FAILURE
        }
    }
}

fn unknown_arguments(err: &clap::Error) -> String {
    match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => arg.clone(),
        Some(ContextValue::Strings(args)) => args.join(" "),
        _ => String::new(),
    }
}
