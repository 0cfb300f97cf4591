//! `install [--offline] [--production]`

use anyhow::Result;
use pysh_core::project::load_config;
use pysh_core::{ConfigNode, Reporter};
use pysh_env::deps::{self, install_dependencies};
use pysh_env::{
    CondaBackend, CreateSpec, DependencyMode, Environment, EnvironmentManager, PackageBackend,
    PipBackend, ShellCommand,
};

use crate::CommandContext;

#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    /// Install from the local package caches only. Implies `production`.
    pub offline: bool,
    /// Skip development dependencies.
    pub production: bool,
}

/// Recreate the environment, install dependencies, then run the project's
/// install scripts.
pub fn install(ctx: &CommandContext<'_>, options: InstallOptions) -> Result<()> {
    let config = load_config(ctx.settings, ctx.reporter)?;
    let env = Environment::new(ctx.settings, ctx.runner);
    let mode = DependencyMode::from_flags(options.offline, options.production);
    reset_environment(ctx.reporter, &env, &config, mode)?;
    run_install_scripts(ctx.reporter, &env, &config)
}

/// Destroy and create the environment, then install pip dependencies.
///
/// Online creation carries the conda pins in the create call; an
/// environment-definition file gets them layered with a separate install.
/// Offline creation uses the cached conda archives as-is.
pub(crate) fn reset_environment(
    reporter: &Reporter,
    env: &Environment<'_>,
    config: &ConfigNode,
    mode: DependencyMode,
) -> Result<()> {
    let manager = EnvironmentManager::new(env, reporter);
    let pysh = config.node("pysh")?;
    let pip = PipBackend::from_config(config)?;

    if mode.is_offline() {
        manager.create(&CreateSpec::Offline {
            archives_dir: env.settings().conda_packages_path(),
        })?;
    } else {
        let conda = CondaBackend;
        let conda_deps = deps::resolve(config, conda.key(), mode)?;
        let environment_file = pysh.node("conda")?.get("environment_file", String::new())?;
        if environment_file.is_empty() {
            let python_version = pysh.node("python")?.get("version", "3".to_string())?;
            manager.create(&CreateSpec::Online {
                python_version,
                packages: conda_deps,
            })?;
        } else {
            let path = env.settings().root_path.join(environment_file);
            manager.create(&CreateSpec::EnvironmentFile(path))?;
            install_dependencies(reporter, env, &conda, &conda_deps, mode)?;
        }
    }

    let pip_deps = deps::resolve(config, pip.key(), mode)?;
    install_dependencies(reporter, env, &pip, &pip_deps, mode)
}

/// `pysh.install`: trusted script lines, each run in the activated
/// environment.
fn run_install_scripts(reporter: &Reporter, env: &Environment<'_>, config: &ConfigNode) -> Result<()> {
    let scripts = config.node("pysh")?.get("install", Vec::<String>::new())?;
    if scripts.is_empty() {
        return Ok(());
    }
    reporter.task("Running install scripts", || {
        for line in &scripts {
            env.run_in_environment(ShellCommand::script(line))?;
        }
        Ok(())
    })?;
    Ok(())
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

    fn run_install(settings: &Settings, runner: &RecordingRunner, options: InstallOptions) -> (Result<()>, String) {
        let (reporter, out) = Reporter::buffered(false);
        let ctx = CommandContext::new(settings, runner, &reporter);
        let result = install(&ctx, options);
        (result, out.contents())
    }

    #[test]
    fn test_install_development_mode() {
        let (_tmp, settings) = project(
            r#"{"pysh": {
                "python": {"version": "3.6"},
                "conda": {"dependencies": {"numpy": "1.11", "scipy": "0.19"}},
                "pip": {"dependencies": {"flask": "0.12"}, "devDependencies": {"pytest": "3.2.1"}}
            }}"#,
        );
        let runner = RecordingRunner::new();
        let (result, out) = run_install(&settings, &runner, InstallOptions::default());
        result.unwrap();

        assert_eq!(
            runner.calls_matching("conda create"),
            ["conda create --yes --name app python=3.6 numpy=1.11 scipy=0.19"]
        );
        let pip = runner.calls_matching("pip install");
        assert_eq!(pip.len(), 1);
        assert!(pip[0].contains("; pip install flask==0.12 pytest==3.2.1 ;"));
        assert_eq!(
            out,
            "Loading config from package.json... done!\n\
             Cleaning app environment... done!\n\
             Installing app Python 3.6... done!\n\
             Installing app pip dependencies... done!\n"
        );
    }

    #[test]
    fn test_install_production_skips_dev_dependencies() {
        let (_tmp, settings) = project(
            r#"{"pysh": {"pip": {"dependencies": {"flask": "0.12"}, "devDependencies": {"pytest": "3.2.1"}}}}"#,
        );
        let runner = RecordingRunner::new();
        let (result, _out) = run_install(
            &settings,
            &runner,
            InstallOptions {
                production: true,
                ..Default::default()
            },
        );
        result.unwrap();
        let pip = runner.calls_matching("pip install");
        assert!(pip[0].contains("pip install flask==0.12 ;"));
        assert!(!pip[0].contains("pytest"));
    }

    #[test]
    fn test_install_without_dependencies_makes_no_install_calls() {
        let (_tmp, settings) = project(r#"{"pysh": {"pip": {"devDependencies": {}}}}"#);
        let runner = RecordingRunner::new();
        let (result, out) = run_install(&settings, &runner, InstallOptions::default());
        result.unwrap();
        assert!(runner.calls_matching("pip install").is_empty());
        assert!(runner.calls_matching("conda install").is_empty());
        assert!(!out.contains("dependencies"));
    }

    #[test]
    fn test_offline_install_uses_caches_and_skips_dev() {
        let (tmp, settings) = project(
            r#"{"pysh": {"pip": {"dependencies": {"flask": "0.12"}, "devDependencies": {"pytest": "3.2.1"}}}}"#,
        );
        let cache = settings.conda_packages_path();
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join("python-3.6.2-0.tar.bz2"), "").unwrap();
        let runner = RecordingRunner::new();
        let (result, _out) = run_install(
            &settings,
            &runner,
            InstallOptions {
                offline: true,
                production: false,
            },
        );
        result.unwrap();

        let create = runner.calls_matching("conda create");
        assert!(create[0].starts_with("conda create --yes --offline --name app "));
        let pip = runner.calls_matching("pip install");
        let find_links = tmp.path().join(".pysh/packages/pip");
        assert!(pip[0].contains(&format!(
            "pip install --no-index --no-deps --find-links {} flask==0.12 ;",
            find_links.display()
        )));
        assert!(!pip[0].contains("pytest"));
    }

    #[test]
    fn test_environment_file_layers_conda_dependencies() {
        let (tmp, settings) = project(
            r#"{"pysh": {"conda": {"environment_file": "environment.yml", "dependencies": {"numpy": "1.11"}}}}"#,
        );
        std::fs::write(tmp.path().join("environment.yml"), "name: app\n").unwrap();
        let runner = RecordingRunner::new();
        let (result, out) = run_install(&settings, &runner, InstallOptions::default());
        result.unwrap();

        let env_file = tmp.path().join("environment.yml");
        assert_eq!(
            runner.calls_matching("conda env create"),
            [format!("conda env create --name app --file {}", env_file.display())]
        );
        assert_eq!(
            runner.calls_matching("conda install"),
            ["conda install --yes --name app numpy=1.11"]
        );
        assert!(out.contains("Creating app environment from environment.yml... done!\n"));
        assert!(out.contains("Installing app conda dependencies... done!\n"));
    }

    #[test]
    fn test_install_scripts_run_in_order_after_dependencies() {
        let (_tmp, settings) = project(
            r#"{"pysh": {
                "pip": {"dependencies": {"flask": "0.12"}},
                "install": ["python manage.py migrate", "python manage.py collectstatic --noinput"]
            }}"#,
        );
        let runner = RecordingRunner::new();
        let (result, out) = run_install(&settings, &runner, InstallOptions::default());
        result.unwrap();

        let calls = runner.calls();
        let pip_at = calls.iter().position(|c| c.contains("pip install")).unwrap();
        let migrate_at = calls.iter().position(|c| c.contains("manage.py migrate")).unwrap();
        let static_at = calls.iter().position(|c| c.contains("collectstatic")).unwrap();
        assert!(pip_at < migrate_at && migrate_at < static_at);
        assert!(out.ends_with("Running install scripts... done!\n"));
    }

    #[test]
    fn test_failed_pip_install_is_fatal() {
        let (_tmp, settings) = project(r#"{"pysh": {"pip": {"dependencies": {"flask": "99"}}}}"#);
        let runner = RecordingRunner::new();
        runner.fail_on("pip install", "No matching distribution found for flask==99\n");
        let (result, out) = run_install(&settings, &runner, InstallOptions::default());
        let err = result.unwrap_err();
        assert_eq!(pysh_core::error::Outcome::of(&err), pysh_core::error::Outcome::Fatal);
        assert!(out.contains("Installing app pip dependencies... ERROR!\n"));
        assert!(out.contains("No matching distribution found for flask==99"));
    }

    #[test]
    fn test_missing_config_warns_and_continues() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings::from_source(&VarSource::new([(
            "PYSH_ROOT_PATH",
            tmp.path().to_string_lossy().to_string(),
        )]));
        let runner = RecordingRunner::new();
        let (result, out) = run_install(&settings, &runner, InstallOptions::default());
        result.unwrap();
        assert!(out.starts_with("Loading config from package.json... WARNING!\n"));
        assert_eq!(
            runner.calls_matching("conda create"),
            ["conda create --yes --name app python=3"]
        );
    }
}
