//! pysh core: settings, project config, error taxonomy, task reporting and
//! observability shared by every other crate in the workspace.

pub mod config;
pub mod error;
pub mod interrupt;
pub mod observability;
pub mod project;
pub mod task;

pub use config::Settings;
pub use error::{Interrupted, Reported, TaskError, TaskWarning};
pub use project::ConfigNode;
pub use task::Reporter;
