//! `clean`

use anyhow::Result;
use pysh_env::{Environment, EnvironmentManager};

use crate::CommandContext;

/// Remove the environment and any build workspace a crashed `dist` left.
pub fn clean(ctx: &CommandContext<'_>) -> Result<()> {
    let env = Environment::new(ctx.settings, ctx.runner);
    EnvironmentManager::new(&env, ctx.reporter).destroy()?;

    let build = ctx.settings.build_path();
    if build.exists() {
        ctx.reporter.task("Removing build directory", || {
            pysh_fs::remove_tree(&build)?;
            Ok(())
        })?;
    }
    Ok(())
}
