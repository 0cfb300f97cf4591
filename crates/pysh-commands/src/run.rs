//! `run -- <command...>`

use anyhow::Result;
use pysh_core::TaskError;
use pysh_env::{Environment, ShellCommand};

use crate::CommandContext;

/// Replace this process with `args` running in the activated environment.
/// Every argument is quoted; nothing the user typed is re-parsed by the shell.
pub fn run(ctx: &CommandContext<'_>, args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Err(TaskError::MissingCommand.into());
    }
    let env = Environment::new(ctx.settings, ctx.runner);
    match env.exec_in_environment(ShellCommand::from_args(args))? {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use pysh_core::config::VarSource;
    use pysh_core::{Reporter, Settings};
    use pysh_env::testing::{ExecCalled, RecordingRunner};

    #[test]
    fn test_run_quotes_user_arguments() {
        let s = Settings::from_source(&VarSource::new([("PYSH_ROOT_PATH", "/srv/demo")]));
        let runner = RecordingRunner::new();
        let (reporter, out) = Reporter::buffered(false);
        let args = vec!["python".to_string(), "-c".to_string(), "print('hi'); import os".to_string()];

        let err = run(&CommandContext::new(&s, &runner, &reporter), &args).unwrap_err();
        let exec = err.downcast_ref::<ExecCalled>().unwrap();
        assert!(exec.0.contains(
            "; python -c 'print('\"'\"'hi'\"'\"'); import os' ; else"
        ));
        assert!(out.contents().is_empty());
    }

    #[test]
    fn test_run_without_command_is_an_error() {
        let s = Settings::from_source(&VarSource::new([("PYSH_ROOT_PATH", "/srv/demo")]));
        let runner = RecordingRunner::new();
        let (reporter, _out) = Reporter::buffered(false);
        let err = run(&CommandContext::new(&s, &runner, &reporter), &[]).unwrap_err();
        assert_eq!(pysh_core::error::user_message(&err), "Missing command to run.");
        assert!(runner.calls().is_empty());
    }
}
