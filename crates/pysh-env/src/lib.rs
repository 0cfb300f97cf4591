//! pysh environment layer.
//!
//! - `shell`: quoted command builder; rendering is the only way to a string
//! - `runner`: host and activated-environment execution, process replacement
//! - `conda`: create/destroy of the named environment
//! - `deps`: dependency resolution and the conda/pip backends
//! - `scope`: cleanup stack with guaranteed reverse-order release
//! - `testing`: recording runner (tests and the `test-support` feature)

pub mod conda;
pub mod deps;
pub mod runner;
pub mod scope;
pub mod shell;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use conda::{CreateSpec, EnvironmentManager};
pub use deps::{CondaBackend, Dependency, DependencyMode, PackageBackend, PipBackend};
pub use runner::{Environment, ProcessOutput, ProcessRunner, ShellRunner};
pub use scope::{with_cleanup, CleanupStack};
pub use shell::{ShellArgument, ShellCommand};
