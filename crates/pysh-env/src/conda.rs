//! Lifecycle of the named conda environment.

use anyhow::{Context, Result};
use pysh_core::{Reporter, TaskError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::deps::{CondaBackend, Dependency, PackageBackend};
use crate::runner::Environment;
use crate::shell::ShellCommand;

/// How a fresh environment is populated.
#[derive(Debug, Clone)]
pub enum CreateSpec {
    /// A Python interpreter plus pinned conda packages, from the network.
    Online {
        python_version: String,
        packages: Vec<Dependency>,
    },
    /// A conda environment-definition file.
    EnvironmentFile(PathBuf),
    /// Every cached `*.tar.bz2` archive under the given directory.
    Offline { archives_dir: PathBuf },
}

/// `conda env list --json`
#[derive(Debug, Deserialize)]
struct EnvList {
    #[serde(default)]
    envs: Vec<PathBuf>,
}

pub struct EnvironmentManager<'a> {
    env: &'a Environment<'a>,
    reporter: &'a Reporter,
}

impl<'a> EnvironmentManager<'a> {
    pub fn new(env: &'a Environment<'a>, reporter: &'a Reporter) -> Self {
        Self { env, reporter }
    }

    /// True if conda knows an environment with this name.
    pub fn exists(&self, name: &str) -> Result<bool> {
        let output = self.env.run(
            &ShellCommand::new("conda")
                .literal("env")
                .literal("list")
                .literal("--json"),
        )?;
        let list: EnvList =
            serde_json::from_str(&output.stdout).context("Failed to parse conda env list")?;
        Ok(list
            .envs
            .iter()
            .any(|prefix| prefix.file_name().is_some_and(|n| n == name)))
    }

    /// Remove the environment if it exists. Safe to call repeatedly.
    pub fn destroy(&self) -> Result<()> {
        let name = self.env.name();
        self.reporter
            .task(&format!("Cleaning {} environment", name), || {
                if self.exists(name)? {
                    self.env.run(
                        &ShellCommand::new("conda")
                            .literal("env")
                            .literal("remove")
                            .literal("--yes")
                            .literal("--name")
                            .arg(name),
                    )?;
                } else {
                    tracing::debug!(env = name, "Environment absent, nothing to remove");
                }
                Ok(())
            })?;
        Ok(())
    }

    /// Destroy any existing environment, then create it from `spec`.
    pub fn create(&self, spec: &CreateSpec) -> Result<()> {
        self.destroy()?;
        let name = self.env.name();
        match spec {
            CreateSpec::Online {
                python_version,
                packages,
            } => {
                self.reporter
                    .task(&format!("Installing {} Python {}", name, python_version), || {
                        let cmd = ShellCommand::new("conda")
                            .literal("create")
                            .literal("--yes")
                            .literal("--name")
                            .arg(name)
                            .arg(format!("python={}", python_version))
                            .args(CondaBackend.pins(packages));
                        self.env.run(&cmd)
                    })?;
            }
            CreateSpec::EnvironmentFile(path) => {
                let file = display_name(self.env, path);
                self.reporter
                    .task(&format!("Creating {} environment from {}", name, file), || {
                        if !path.is_file() {
                            return Err(TaskError::MissingFile(path.clone()).into());
                        }
                        let cmd = ShellCommand::new("conda")
                            .literal("env")
                            .literal("create")
                            .literal("--name")
                            .arg(name)
                            .literal("--file")
                            .arg(path);
                        self.env.run(&cmd)
                    })?;
            }
            CreateSpec::Offline { archives_dir } => {
                self.reporter
                    .task(&format!("Installing {} environment offline", name), || {
                        let archives = cached_archives(archives_dir)?;
                        let cmd = ShellCommand::new("conda")
                            .literal("create")
                            .literal("--yes")
                            .literal("--offline")
                            .literal("--name")
                            .arg(name)
                            .args(archives.iter());
                        self.env.run(&cmd)
                    })?;
            }
        }
        Ok(())
    }
}

/// `<dir>/*.tar.bz2`, sorted by path.
fn cached_archives(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(TaskError::MissingFile(dir.to_path_buf()).into());
    }
    let pattern = dir.join("*.tar.bz2");
    let mut archives = glob::glob(&pattern.to_string_lossy())
        .context("Invalid package cache pattern")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to read package cache")?;
    archives.sort();
    Ok(archives)
}

/// Path relative to the project root when possible, for task lines.
fn display_name(env: &Environment<'_>, path: &Path) -> String {
    path.strip_prefix(&env.settings().root_path)
        .unwrap_or(path)
        .display()
        .to_string()
}
