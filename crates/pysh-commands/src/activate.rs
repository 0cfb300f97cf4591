//! `activate`

use anyhow::Result;
use pysh_core::project::load_config;
use pysh_env::{Environment, ShellCommand};

use crate::CommandContext;

/// Replace this process with an interactive shell inside the environment.
///
/// The task line is opened here and closed by the child, which prints
/// `done!` once activation succeeded.
pub fn activate(ctx: &CommandContext<'_>) -> Result<()> {
    let config = load_config(ctx.settings, ctx.reporter)?;
    let name = config.get("name", ctx.settings.root_name())?;
    let env = Environment::new(ctx.settings, ctx.runner);
    ctx.reporter
        .start(&format!("Activating {} environment", env.name()));
    match env.exec_in_environment(session(ctx, &name))? {}
}

fn session(ctx: &CommandContext<'_>, name: &str) -> ShellCommand {
    let prompt = format!("PS1=({}) \\h:\\W \\u\\$ ", name);
    ShellCommand::new("printf")
        .literal("'%s\\n'")
        .arg("done!")
        .arg("Deactivate environment with exit or [Ctl+D].")
        .literal("&& export")
        .arg(prompt)
        .and(ShellCommand::program(&ctx.settings.shell))
}
