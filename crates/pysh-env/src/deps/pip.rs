use anyhow::Result;
use pysh_core::ConfigNode;
use std::path::Path;

use super::{Dependency, DependencyMode, PackageBackend};
use crate::runner::Environment;
use crate::shell::ShellCommand;

/// pip packages, pinned `name==version`, always run inside the activated
/// environment.
#[derive(Debug, Clone, Default)]
pub struct PipBackend {
    extra_index_urls: Vec<String>,
}

impl PipBackend {
    pub fn new(extra_index_urls: Vec<String>) -> Self {
        Self { extra_index_urls }
    }

    /// Reads `pysh.pip.extra_index_urls`.
    pub fn from_config(config: &ConfigNode) -> Result<Self> {
        let urls = config
            .node("pysh")?
            .node("pip")?
            .get("extra_index_urls", Vec::<String>::new())?;
        Ok(Self::new(urls))
    }

    fn with_index_urls(&self, mut cmd: ShellCommand) -> ShellCommand {
        for url in &self.extra_index_urls {
            cmd = cmd.literal("--extra-index-url").arg(url);
        }
        cmd
    }
}

impl PackageBackend for PipBackend {
    fn key(&self) -> &'static str {
        "pip"
    }

    fn pin(&self, dep: &Dependency) -> String {
        format!("{}=={}", dep.name, dep.version)
    }

    fn install(&self, env: &Environment<'_>, deps: &[Dependency], mode: DependencyMode) -> Result<()> {
        let cmd = if mode.is_offline() {
            ShellCommand::new("pip")
                .literal("install")
                .literal("--no-index")
                .literal("--no-deps")
                .literal("--find-links")
                .arg(env.settings().pip_packages_path())
                .args(self.pins(deps))
        } else {
            self.with_index_urls(
                ShellCommand::new("pip")
                    .literal("install")
                    .args(self.pins(deps)),
            )
        };
        env.run_in_environment(cmd)?;
        Ok(())
    }

    fn download(&self, env: &Environment<'_>, deps: &[Dependency], dest: &Path) -> Result<()> {
        let cmd = ShellCommand::new("pip")
            .literal("download")
            .literal("--dest")
            .arg(dest)
            .args(self.pins(deps));
        env.run_in_environment(self.with_index_urls(cmd))?;
        Ok(())
    }
}
