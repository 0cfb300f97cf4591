//! `download-deps [--production]`

use anyhow::Result;
use pysh_core::project::load_config;
use pysh_core::{ConfigNode, Reporter};
use pysh_env::deps::{self, download_dependencies};
use pysh_env::{CondaBackend, DependencyMode, Environment, PackageBackend, PipBackend};
use std::path::Path;

use crate::CommandContext;

/// Fill the local package caches from the installed environment, for a
/// later `install --offline`.
pub fn download_deps(ctx: &CommandContext<'_>, production: bool) -> Result<()> {
    let config = load_config(ctx.settings, ctx.reporter)?;
    let env = Environment::new(ctx.settings, ctx.runner);
    let mode = DependencyMode::from_flags(false, production);
    download_all(ctx.reporter, &env, &config, mode, &ctx.settings.packages_path())
}

/// Conda artifacts into `<packages>/conda`, then pip artifacts into
/// `<packages>/pip`.
pub(crate) fn download_all(
    reporter: &Reporter,
    env: &Environment<'_>,
    config: &ConfigNode,
    mode: DependencyMode,
    packages: &Path,
) -> Result<()> {
    let conda = CondaBackend;
    let conda_deps = deps::resolve(config, conda.key(), mode)?;
    download_dependencies(reporter, env, &conda, &conda_deps, &packages.join("conda"))?;

    let pip = PipBackend::from_config(config)?;
    let pip_deps = deps::resolve(config, pip.key(), mode)?;
    download_dependencies(reporter, env, &pip, &pip_deps, &packages.join("pip"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pysh_core::config::VarSource;
    use pysh_core::Settings;
    use pysh_env::testing::RecordingRunner;

    fn project(config: &str) -> (tempfile::TempDir, Settings) {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("package.json"), config).unwrap();
        let settings = Settings::from_source(&VarSource::new([(
            "PYSH_ROOT_PATH",
            tmp.path().to_string_lossy().to_string(),
        )]));
        (tmp, settings)
    }

    #[test]
    fn test_download_deps_fills_both_caches() {
        let (_tmp, settings) = project(
            r#"{"pysh": {"pip": {
                "dependencies": {"flask": "0.12"},
                "devDependencies": {"pytest": "3.2.1"},
                "extra_index_urls": ["https://pypi.example.com/simple"]
            }}}"#,
        );
        let stale = settings.pip_packages_path().join("old-0.1.whl");
        std::fs::create_dir_all(settings.pip_packages_path()).unwrap();
        std::fs::write(&stale, "").unwrap();

        let runner = RecordingRunner::new();
        let (reporter, out) = Reporter::buffered(false);
        download_deps(&CommandContext::new(&settings, &runner, &reporter), true).unwrap();

        assert!(!stale.exists());
        assert!(settings.conda_packages_path().is_dir());
        assert_eq!(runner.calls_matching("conda list --explicit").len(), 1);
        let pip = runner.calls_matching("pip download");
        assert_eq!(pip.len(), 1);
        assert!(pip[0].contains(&format!(
            "pip download --dest {} flask==0.12 --extra-index-url https://pypi.example.com/simple ;",
            settings.pip_packages_path().display()
        )));
        assert!(!pip[0].contains("pytest"));
        assert_eq!(
            out.contents(),
            "Loading config from package.json... done!\n\
             Downloading app conda dependencies... done!\n\
             Downloading app pip dependencies... done!\n"
        );
    }

    #[test]
    fn test_no_pip_dependencies_leaves_empty_cache() {
        let (_tmp, settings) = project(r#"{}"#);
        let runner = RecordingRunner::new();
        let (reporter, out) = Reporter::buffered(false);
        download_deps(&CommandContext::new(&settings, &runner, &reporter), false).unwrap();

        assert!(runner.calls_matching("pip download").is_empty());
        let pip_cache = settings.pip_packages_path();
        assert!(pip_cache.is_dir());
        assert_eq!(std::fs::read_dir(&pip_cache).unwrap().count(), 0);
        assert!(!out.contents().contains("pip dependencies"));
    }
}
