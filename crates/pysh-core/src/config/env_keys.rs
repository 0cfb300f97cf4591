//! Environment key constants.
//!
//! Every key pysh reads starts with [`PREFIX`]; keys with that prefix are
//! stripped from the environment handed to child processes.

pub const PREFIX: &str = "PYSH_";

/// Project layout
pub mod paths {
    pub const PYSH_ROOT_PATH: &str = "PYSH_ROOT_PATH";
    pub const PYSH_SCRIPT_NAME: &str = "PYSH_SCRIPT_NAME";
    pub const PYSH_WORK_DIR: &str = "PYSH_WORK_DIR";
    pub const PYSH_MINICONDA_DIR: &str = "PYSH_MINICONDA_DIR";
    pub const PYSH_LIB_DIR: &str = "PYSH_LIB_DIR";
    pub const PYSH_BUILD_DIR: &str = "PYSH_BUILD_DIR";
}

/// Host identification used in archive names
pub mod host {
    pub const PYSH_OS_NAME: &str = "PYSH_OS_NAME";
    pub const PYSH_ARCH_NAME: &str = "PYSH_ARCH_NAME";
}

/// Defaults for the global CLI flags
pub mod cli {
    pub const PYSH_CONDA_ENV: &str = "PYSH_CONDA_ENV";
    pub const PYSH_CONFIG_FILE: &str = "PYSH_CONFIG_FILE";
    pub const PYSH_ENV_FILE: &str = "PYSH_ENV_FILE";
    pub const PYSH_SHELL: &str = "PYSH_SHELL";
    pub const PYSH_TRACEBACK: &str = "PYSH_TRACEBACK";
}

/// Logging
pub mod observability {
    pub const PYSH_LOG_LEVEL: &str = "PYSH_LOG_LEVEL";
    pub const PYSH_LOG_JSON: &str = "PYSH_LOG_JSON";
}

/// Variables pysh reads but does not own.
pub mod system {
    pub const PATH: &str = "PATH";
    pub const PWD: &str = "PWD";
    pub const RUST_LOG: &str = "RUST_LOG";
}
