//! Declared dependencies and the package backends that act on them.
//!
//! Dependencies live under `pysh.<backend>.dependencies` and
//! `pysh.<backend>.devDependencies` as `name: version` mappings.

mod conda;
mod pip;

pub use conda::CondaBackend;
pub use pip::PipBackend;

use anyhow::Result;
use pysh_core::{ConfigNode, Reporter};
use std::path::Path;

use crate::runner::Environment;

/// A pinned package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub version: String,
}

impl Dependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Which dependency lists apply and where packages come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyMode {
    /// Required dependencies only, from the network.
    Production,
    /// Required plus development dependencies, from the network.
    Development,
    /// Required dependencies only, from the local package caches.
    Offline,
}

impl DependencyMode {
    /// Offline implies production.
    pub fn from_flags(offline: bool, production: bool) -> Self {
        match (offline, production) {
            (true, _) => DependencyMode::Offline,
            (false, true) => DependencyMode::Production,
            (false, false) => DependencyMode::Development,
        }
    }

    pub fn includes_dev(self) -> bool {
        self == DependencyMode::Development
    }

    pub fn is_offline(self) -> bool {
        self == DependencyMode::Offline
    }
}

/// Dependencies declared for `backend` (`"conda"` or `"pip"`), required
/// first, then development ones when `mode` includes them. File order.
pub fn resolve(config: &ConfigNode, backend: &str, mode: DependencyMode) -> Result<Vec<Dependency>> {
    let section = config.node("pysh")?.node(backend)?;
    let mut deps = to_deps(section.node("dependencies")?.items()?);
    if mode.includes_dev() {
        deps.extend(to_deps(section.node("devDependencies")?.items()?));
    }
    Ok(deps)
}

fn to_deps(items: Vec<(String, String)>) -> Vec<Dependency> {
    items
        .into_iter()
        .map(|(name, version)| Dependency { name, version })
        .collect()
}

/// A package manager that can install into and download for an environment.
pub trait PackageBackend {
    /// Config section and display name: `conda` or `pip`.
    fn key(&self) -> &'static str;

    /// Render one dependency as a version pin.
    fn pin(&self, dep: &Dependency) -> String;

    /// Install `deps` into the environment.
    fn install(&self, env: &Environment<'_>, deps: &[Dependency], mode: DependencyMode) -> Result<()>;

    /// Fetch package artifacts for `deps` into `dest`, which already exists
    /// and is empty.
    fn download(&self, env: &Environment<'_>, deps: &[Dependency], dest: &Path) -> Result<()>;

    /// True when downloads enumerate what the environment holds rather than
    /// the declared list, so an empty declaration still downloads.
    fn exports_environment(&self) -> bool {
        false
    }

    fn pins(&self, deps: &[Dependency]) -> Vec<String> {
        deps.iter().map(|d| self.pin(d)).collect()
    }
}

/// Install `deps` as task `Installing <env> <backend> dependencies`. An
/// empty list does nothing and prints nothing.
pub fn install_dependencies(
    reporter: &Reporter,
    env: &Environment<'_>,
    backend: &dyn PackageBackend,
    deps: &[Dependency],
    mode: DependencyMode,
) -> Result<()> {
    if deps.is_empty() {
        tracing::debug!(backend = backend.key(), "No dependencies to install");
        return Ok(());
    }
    reporter.task(
        &format!("Installing {} {} dependencies", env.name(), backend.key()),
        || backend.install(env, deps, mode),
    )?;
    Ok(())
}

/// Clear `dest` and download artifacts for `deps` into it as task
/// `Downloading <env> <backend> dependencies`.
pub fn download_dependencies(
    reporter: &Reporter,
    env: &Environment<'_>,
    backend: &dyn PackageBackend,
    deps: &[Dependency],
    dest: &Path,
) -> Result<()> {
    pysh_fs::reset_dir(dest)?;
    if deps.is_empty() && !backend.exports_environment() {
        tracing::debug!(backend = backend.key(), dest = %dest.display(), "No dependencies to download");
        return Ok(());
    }
    reporter.task(
        &format!("Downloading {} {} dependencies", env.name(), backend.key()),
        || backend.download(env, deps, dest),
    )?;
    Ok(())
}
