//! pysh commands.
//!
//! Each command takes a [`CommandContext`] and returns `anyhow::Result`.
//! Progress is printed through the context's [`Reporter`]; the caller owns
//! the top-level [`Reporter::capture`] scope and the exit status.

pub mod activate;
pub mod clean;
pub mod dist;
pub mod download_deps;
pub mod install;
pub mod run;

pub use activate::activate;
pub use clean::clean;
pub use dist::{dist, DistOptions};
pub use download_deps::download_deps;
pub use install::{install, InstallOptions};
pub use run::run;

use pysh_core::{Reporter, Settings};
use pysh_env::ProcessRunner;

/// What every command runs against.
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    pub settings: &'a Settings,
    pub runner: &'a dyn ProcessRunner,
    pub reporter: &'a Reporter,
}

impl<'a> CommandContext<'a> {
    pub fn new(settings: &'a Settings, runner: &'a dyn ProcessRunner, reporter: &'a Reporter) -> Self {
        Self {
            settings,
            runner,
            reporter,
        }
    }
}
