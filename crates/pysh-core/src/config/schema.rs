//! Settings structs, built from a [`VarSource`] and then layered with CLI flags.

use super::env_keys::{self, cli, host, observability as obv_keys, paths, system};
use super::loader::VarSource;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Everything a command needs to know about the project and the host.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Project root; the config file, env file and work dir live under it.
    pub root_path: PathBuf,
    /// Name of the wrapper script, used in user-facing hints.
    pub script_name: String,
    pub work_dir: String,
    pub miniconda_dir: String,
    pub lib_dir: String,
    pub build_dir: String,
    pub os_name: String,
    pub arch_name: String,

    pub conda_env: String,
    pub config_file: String,
    pub env_file: String,
    pub shell: PathBuf,
    pub traceback: bool,

    /// Environment for child processes: source vars minus `PYSH_*`, PATH
    /// prefixed with the miniconda bin dir. Non-UTF-8 pairs pass through.
    child_env: Vec<(OsString, OsString)>,
}

/// Global CLI flags. `None` keeps the value from the var source.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub conda_env: Option<String>,
    pub config_file: Option<String>,
    pub env_file: Option<String>,
    pub shell: Option<String>,
    pub traceback: bool,
}

impl Settings {
    pub fn from_source(src: &VarSource) -> Self {
        let root_path = src
            .optional(paths::PYSH_ROOT_PATH)
            .or_else(|| src.optional(system::PWD))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut settings = Self {
            root_path,
            script_name: src.or(paths::PYSH_SCRIPT_NAME, || "py.sh".to_string()),
            work_dir: src.or(paths::PYSH_WORK_DIR, || ".pysh".to_string()),
            miniconda_dir: src.or(paths::PYSH_MINICONDA_DIR, || "miniconda".to_string()),
            lib_dir: src.or(paths::PYSH_LIB_DIR, || "lib".to_string()),
            build_dir: src.or(paths::PYSH_BUILD_DIR, || "build".to_string()),
            os_name: src.or(host::PYSH_OS_NAME, || std::env::consts::OS.to_string()),
            arch_name: src.or(host::PYSH_ARCH_NAME, || {
                default_arch_name(std::env::consts::ARCH).to_string()
            }),
            conda_env: src.or(cli::PYSH_CONDA_ENV, || "app".to_string()),
            config_file: src.or(cli::PYSH_CONFIG_FILE, || "package.json".to_string()),
            env_file: src.or(cli::PYSH_ENV_FILE, || ".env".to_string()),
            shell: PathBuf::from(src.or(cli::PYSH_SHELL, || "/bin/bash".to_string())),
            traceback: src.bool(cli::PYSH_TRACEBACK, false),
            child_env: Vec::new(),
        };
        settings.child_env = settings.build_child_env(src);
        settings
    }

    /// Layer the global CLI flags on top.
    pub fn with_cli_overrides(mut self, overrides: CliOverrides) -> Self {
        if let Some(conda_env) = overrides.conda_env {
            self.conda_env = conda_env;
        }
        if let Some(config_file) = overrides.config_file {
            self.config_file = config_file;
        }
        if let Some(env_file) = overrides.env_file {
            self.env_file = env_file;
        }
        if let Some(shell) = overrides.shell {
            self.shell = PathBuf::from(shell);
        }
        self.traceback |= overrides.traceback;
        self
    }

    /// Copy with a different environment name (dist builds in its own env).
    pub fn with_conda_env(&self, conda_env: impl Into<String>) -> Self {
        let mut s = self.clone();
        s.conda_env = conda_env.into();
        s
    }

    fn build_child_env(&self, src: &VarSource) -> Vec<(OsString, OsString)> {
        let bin = self.miniconda_bin_path();
        let path = match src.get(system::PATH) {
            Some(p) if !p.is_empty() => format!("{}:{}", bin.display(), p),
            _ => bin.display().to_string(),
        };
        let mut env: Vec<(OsString, OsString)> = src
            .iter()
            .filter(|(k, _)| !k.starts_with(env_keys::PREFIX) && *k != system::PATH)
            .map(|(k, v)| (OsString::from(k), OsString::from(v)))
            .collect();
        env.extend(
            src.opaque()
                .filter(|(k, _)| !k.to_string_lossy().starts_with(env_keys::PREFIX))
                .map(|(k, v)| (k.to_os_string(), v.to_os_string())),
        );
        env.push((OsString::from(system::PATH), OsString::from(path)));
        env
    }

    pub fn child_env(&self) -> &[(OsString, OsString)] {
        &self.child_env
    }

    pub fn work_path(&self) -> PathBuf {
        self.root_path.join(&self.work_dir)
    }

    pub fn miniconda_bin_path(&self) -> PathBuf {
        self.work_path().join(&self.miniconda_dir).join("bin")
    }

    /// Local package caches, relative to the work dir: `packages/{conda,pip}`.
    pub fn packages_path(&self) -> PathBuf {
        packages_under(&self.work_path())
    }

    pub fn conda_packages_path(&self) -> PathBuf {
        self.packages_path().join("conda")
    }

    pub fn pip_packages_path(&self) -> PathBuf {
        self.packages_path().join("pip")
    }

    pub fn lib_path(&self) -> PathBuf {
        self.work_path().join(&self.lib_dir)
    }

    pub fn build_path(&self) -> PathBuf {
        self.work_path().join(&self.build_dir)
    }

    /// The work dir as it appears inside the build workspace.
    pub fn build_work_path(&self) -> PathBuf {
        self.build_path().join(&self.work_dir)
    }

    pub fn env_file_path(&self) -> PathBuf {
        self.root_path.join(&self.env_file)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root_path.join(&self.config_file)
    }

    /// Base name of the project root, the fallback package name.
    pub fn root_name(&self) -> String {
        let canonical = self
            .root_path
            .canonicalize()
            .unwrap_or_else(|_| self.root_path.clone());
        canonical
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app".to_string())
    }
}

/// `packages` cache layout below any work dir.
pub fn packages_under(work_path: &Path) -> PathBuf {
    work_path.join("packages")
}

fn default_arch_name(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => other,
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    pub fn from_source(src: &VarSource) -> Self {
        Self {
            log_level: src
                .optional(system::RUST_LOG)
                .or_else(|| src.optional(obv_keys::PYSH_LOG_LEVEL))
                .unwrap_or_else(|| "pysh=warn".to_string()),
            log_json: src.bool(obv_keys::PYSH_LOG_JSON, false),
        }
    }
}
