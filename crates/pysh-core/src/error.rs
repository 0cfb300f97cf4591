//! Error taxonomy.
//!
//! Every failure that reaches the reporter is classified into exactly one of:
//!
//! - [`TaskWarning`]: the step is skipped with a message, the command goes on.
//! - [`Interrupted`]: the user pressed Ctrl+C. Abort with exit status 1.
//! - [`TaskError`]: an expected failure. Its message is shown verbatim.
//! - anything else: shown as "Unexpected error." unless tracebacks are on.
//!
//! [`Reported`] marks a failure the reporter has already printed, so outer
//! scopes only unwind and exit.

use std::path::PathBuf;
use thiserror::Error;

/// Expected, user-facing failures.
#[derive(Debug, Error)]
pub enum TaskError {
    /// An external command exited non-zero. The message is the command line
    /// followed by everything it printed.
    #[error("{command}\n{stdout}{stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("Expected config {path} to be a {expected}.")]
    ConfigType { path: String, expected: &'static str },

    #[error("Invalid {0} config file.")]
    InvalidConfig(String),

    #[error("Missing {}.", .0.display())]
    MissingFile(PathBuf),

    #[error("Unknown arguments: {0}")]
    UnknownArguments(String),

    #[error("Missing command to run.")]
    MissingCommand,
}

/// A recoverable problem: printed as a warning, execution continues.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TaskWarning(pub String);

/// The user interrupted the run (SIGINT).
#[derive(Debug, Error)]
#[error("Interrupted.")]
pub struct Interrupted;

/// A failure that has already been printed by a task scope.
#[derive(Debug, Error)]
#[error("{outcome} (already reported)")]
pub struct Reported {
    pub outcome: Outcome,
}

/// Classification of a failed scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Warning,
    Aborted,
    Fatal,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Outcome::Warning => "warning",
            Outcome::Aborted => "aborted",
            Outcome::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

impl Outcome {
    /// Classify an error by walking its context chain.
    pub fn of(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(reported) = cause.downcast_ref::<Reported>() {
                return reported.outcome;
            }
            if cause.is::<Interrupted>() {
                return Outcome::Aborted;
            }
            if cause.is::<TaskWarning>() {
                return Outcome::Warning;
            }
        }
        Outcome::Fatal
    }
}

/// The message shown for a fatal error: the [`TaskError`] text when there is
/// one in the chain, a generic fallback otherwise.
pub fn user_message(err: &anyhow::Error) -> String {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<TaskError>())
        .map(|e| e.to_string())
        .unwrap_or_else(|| "Unexpected error.".to_string())
}

/// The message of the first [`TaskWarning`] in the chain.
pub fn warning_message(err: &anyhow::Error) -> Option<String> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<TaskWarning>())
        .map(|w| w.0.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_task_error_survives_context() {
        let err = anyhow::Error::new(TaskError::InvalidConfig("package.json".into()))
            .context("loading config");
        assert_eq!(Outcome::of(&err), Outcome::Fatal);
        assert_eq!(user_message(&err), "Invalid package.json config file.");
    }

    #[test]
    fn test_unknown_error_is_generic() {
        let err: anyhow::Error = std::io::Error::other("secret internals").into();
        assert_eq!(Outcome::of(&err), Outcome::Fatal);
        assert_eq!(user_message(&err), "Unexpected error.");
    }

    #[test]
    fn test_interrupt_and_warning_classification() {
        let abort: anyhow::Error = Interrupted.into();
        assert_eq!(Outcome::of(&abort), Outcome::Aborted);

        let warn: anyhow::Result<()> =
            Err(TaskWarning("Missing package.json config file.".into())).context("outer");
        let warn = warn.unwrap_err();
        assert_eq!(Outcome::of(&warn), Outcome::Warning);
        assert_eq!(
            warning_message(&warn).as_deref(),
            Some("Missing package.json config file.")
        );
    }

    #[test]
    fn test_reported_keeps_outcome() {
        let err: anyhow::Error = Reported {
            outcome: Outcome::Aborted,
        }
        .into();
        assert_eq!(Outcome::of(&err), Outcome::Aborted);
    }

    #[test]
    fn test_command_failed_message() {
        let err = TaskError::CommandFailed {
            command: "conda env remove --yes --name app".into(),
            code: Some(1),
            stdout: "out\n".into(),
            stderr: "err\n".into(),
        };
        assert_eq!(
            err.to_string(),
            "conda env remove --yes --name app\nout\nerr\n"
        );
    }
}
