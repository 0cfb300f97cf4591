//! `dist [--dist-dir DIR]`: package the app and its dependencies into an
//! offline zip.
//!
//! The pipeline holds two resources on a [`CleanupStack`]: a production
//! environment (default name `build`) and the build workspace under the work
//! dir. Both are released newest first however the pipeline ends, so a
//! finished or failed run leaves neither behind.

use anyhow::Result;
use pysh_core::project::load_config;
use pysh_core::{interrupt, ConfigNode, Interrupted, Reporter, Settings};
use pysh_fs::FsError;
use pysh_env::{with_cleanup, DependencyMode, Environment, EnvironmentManager, ShellCommand};
use std::path::{Path, PathBuf};

use crate::download_deps::download_all;
use crate::install::reset_environment;
use crate::CommandContext;

/// Environment name used by `dist` unless `--conda-env` is given.
pub const BUILD_ENV: &str = "build";

pub const DEFAULT_DIST_DIR: &str = "dist";

#[derive(Debug, Clone)]
pub struct DistOptions {
    /// Output directory, relative to the project root.
    pub dist_dir: String,
    /// Explicit `--conda-env`; `None` builds in [`BUILD_ENV`].
    pub conda_env: Option<String>,
}

impl Default for DistOptions {
    fn default() -> Self {
        Self {
            dist_dir: DEFAULT_DIST_DIR.to_string(),
            conda_env: None,
        }
    }
}

/// Build the distribution archive and return its path.
pub fn dist(ctx: &CommandContext<'_>, options: &DistOptions) -> Result<PathBuf> {
    let settings = ctx
        .settings
        .with_conda_env(options.conda_env.as_deref().unwrap_or(BUILD_ENV));
    let config = load_config(&settings, ctx.reporter)?;
    let archive = archive_path(&settings, &config, &options.dist_dir)?;

    let env = Environment::new(&settings, ctx.runner);
    let manager = EnvironmentManager::new(&env, ctx.reporter);
    let build = settings.build_path();

    with_cleanup(|stack| {
        stack.acquire(
            "environment",
            || reset_environment(ctx.reporter, &env, &config, DependencyMode::Production),
            || manager.destroy(),
        )?;
        stack.acquire(
            "build workspace",
            || Ok(pysh_fs::reset_dir(&build)?),
            || Ok(pysh_fs::remove_tree(&build)?),
        )?;
        package(ctx.reporter, &env, &config, &archive)
    })?;

    tracing::info!(archive = %archive.display(), "Distribution written");
    Ok(archive)
}

/// `<root>/<dist_dir>/<name>-<version>-<os>-<arch>.zip`
pub fn archive_path(settings: &Settings, config: &ConfigNode, dist_dir: &str) -> Result<PathBuf> {
    let name = config.get("name", settings.root_name())?;
    let version = config.get("version", "0.0.0".to_string())?;
    let file = format!(
        "{}-{}-{}-{}.zip",
        name, version, settings.os_name, settings.arch_name
    );
    Ok(settings.root_path.join(dist_dir).join(file))
}

/// Fill the build workspace and compress it.
fn package(reporter: &Reporter, env: &Environment<'_>, config: &ConfigNode, archive: &Path) -> Result<()> {
    let settings = env.settings();
    let build = settings.build_path();

    reporter.task("Copying source", || {
        let export = ShellCommand::new("git")
            .literal("-C")
            .arg(&settings.root_path)
            .literal("archive")
            .literal("--format=tar")
            .literal("HEAD")
            .pipe(
                ShellCommand::new("tar")
                    .literal("-x")
                    .literal("-C")
                    .arg(&build),
            );
        env.run(&export)
    })?;

    download_all(
        reporter,
        env,
        config,
        DependencyMode::Production,
        &pysh_core::config::schema::packages_under(&settings.build_work_path()),
    )?;

    let lib = settings.lib_path();
    if lib.is_dir() {
        reporter.task("Copying libs", || {
            let target = settings.build_work_path().join(&settings.lib_dir);
            interruptible(pysh_fs::copy_tree(&lib, &target, interrupt::is_pending))?;
            Ok(())
        })?;
    }

    let shown = archive
        .strip_prefix(&settings.root_path)
        .unwrap_or(archive)
        .display()
        .to_string();
    reporter.task(&format!("Creating archive {}", shown), || {
        if let Some(parent) = archive.parent() {
            pysh_fs::ensure_dir(parent)?;
        }
        pysh_fs::remove_tree(archive)?;
        let files = interruptible(pysh_fs::zip_dir(&build, archive, interrupt::is_pending))?;
        tracing::debug!(files, archive = %archive.display(), "Compressed build workspace");
        Ok(())
    })?;
    Ok(())
}

/// A filesystem loop that stopped for a pending Ctrl+C becomes [`Interrupted`].
fn interruptible<T>(result: pysh_fs::Result<T>) -> Result<T> {
    match result {
        Err(FsError::Cancelled) => {
            interrupt::take();
            Err(Interrupted.into())
        }
        other => Ok(other?),
    }
}
