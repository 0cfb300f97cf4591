use clap::{Parser, Subcommand};
use pysh_core::config::CliOverrides;

/// py.sh - a self-contained Python environment for this project
#[derive(Parser, Debug)]
#[command(name = "py.sh")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Conda environment name (default: $PYSH_CONDA_ENV or "app")
    #[arg(long, global = true, value_name = "NAME")]
    pub conda_env: Option<String>,

    /// Project config file, relative to the project root
    #[arg(long, global = true, value_name = "FILE")]
    pub config_file: Option<String>,

    /// File sourced into the environment before every command
    #[arg(long, global = true, value_name = "FILE")]
    pub env_file: Option<String>,

    /// Shell used to run commands
    #[arg(long, global = true, value_name = "PATH")]
    pub shell: Option<String>,

    /// Show full diagnostics for unexpected errors
    #[arg(long, global = true)]
    pub traceback: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Remove the environment and any leftover build workspace
    Clean,

    /// Recreate the environment and install dependencies
    Install {
        /// Install from the local package caches only (implies --production)
        #[arg(long)]
        offline: bool,

        /// Skip development dependencies
        #[arg(long)]
        production: bool,
    },

    /// Download dependency packages into the local caches
    DownloadDeps {
        /// Skip development dependencies
        #[arg(long)]
        production: bool,
    },

    /// Package the app and its dependencies into an offline zip archive
    Dist {
        /// Output directory, relative to the project root
        #[arg(long, value_name = "DIR", default_value = pysh_commands::dist::DEFAULT_DIST_DIR)]
        dist_dir: String,
    },

    /// Start an interactive shell inside the environment
    Activate,

    /// Run a command inside the environment
    Run {
        #[arg(
            value_name = "COMMAND",
            required = true,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        args: Vec<String>,
    },
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            conda_env: self.conda_env.clone(),
            config_file: self.config_file.clone(),
            env_file: self.env_file.clone(),
            shell: self.shell.clone(),
            traceback: self.traceback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_install_flags() {
        let cli = Cli::try_parse_from(["py.sh", "install", "--offline", "--production"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Install {
                offline: true,
                production: true
            }
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "py.sh",
            "dist",
            "--conda-env",
            "release",
            "--traceback",
            "--dist-dir",
            "out",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.conda_env.as_deref(), Some("release"));
        assert!(overrides.traceback);
        match cli.command {
            Commands::Dist { dist_dir } => assert_eq!(dist_dir, "out"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_dist_dir_default() {
        let cli = Cli::try_parse_from(["py.sh", "dist"]).unwrap();
        match cli.command {
            Commands::Dist { dist_dir } => assert_eq!(dist_dir, "dist"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_keeps_trailing_arguments() {
        let cli = Cli::try_parse_from(["py.sh", "run", "--", "python", "-m", "pytest", "-x"]).unwrap();
        match cli.command {
            Commands::Run { args } => assert_eq!(args, ["python", "-m", "pytest", "-x"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_requires_a_command() {
        assert!(Cli::try_parse_from(["py.sh", "run"]).is_err());
    }

    #[test]
    fn test_unknown_argument_rejected() {
        let err = Cli::try_parse_from(["py.sh", "clean", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
