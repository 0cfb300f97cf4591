//! pysh settings layer.
//!
//! Settings are assembled once at startup from an injected key-value source
//! (normally a snapshot of the process environment) and passed by reference
//! to every component. Nothing else reads `std::env`.
//!
//! - `env_keys`: key constants, all under the `PYSH_` prefix
//! - `loader`: `VarSource` lookups with typed fallbacks
//! - `schema`: `Settings`, `CliOverrides`, `ObservabilityConfig`

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::VarSource;
pub use schema::{CliOverrides, ObservabilityConfig, Settings};
