//! Process execution.
//!
//! Every command runs as `<shell> -c <line>` with the child environment from
//! [`Settings`]: `PYSH_*` keys stripped, `PATH` prefixed with the miniconda
//! bin dir. [`Environment`] composes the activation prelude so activation,
//! the env file and the command always share one shell process.

use anyhow::{Context, Result};
use pysh_core::{interrupt, Interrupted, Settings, TaskError};
use std::convert::Infallible;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::shell::{ShellArgument, ShellCommand};

/// How often a blocked wait checks for a pending interrupt.
pub const WAIT_POLL_INTERVAL_MS: u64 = 50;

/// Captured output of a finished command, decoded permissively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Executes rendered shell commands.
pub trait ProcessRunner {
    /// Run `command` and block until it exits. Non-zero exit is a
    /// [`TaskError::CommandFailed`]; an interrupt while waiting is forwarded
    /// to the child and surfaces as [`Interrupted`].
    fn run(&self, command: &ShellCommand) -> Result<ProcessOutput>;

    /// Replace the current process with the shell running `command`. Only
    /// returns on failure to start.
    fn exec(&self, command: &ShellCommand) -> Result<Infallible>;
}

/// The real runner, driven by the configured shell.
pub struct ShellRunner<'a> {
    settings: &'a Settings,
}

impl<'a> ShellRunner<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    fn command(&self, line: &str) -> Command {
        let mut cmd = Command::new(&self.settings.shell);
        cmd.arg("-c")
            .arg(line)
            .env_clear()
            .envs(self.settings.child_env().iter().map(|(k, v)| (k, v)))
            .current_dir(&self.settings.root_path);
        cmd
    }
}

impl ProcessRunner for ShellRunner<'_> {
    fn run(&self, command: &ShellCommand) -> Result<ProcessOutput> {
        let line = command.render();
        tracing::debug!(command = %line, "Running");
        let mut cmd = self.command(&line);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        own_process_group(&mut cmd);
        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to start {}", self.settings.shell.display()))?;

        // Drain both pipes while the child runs so large output cannot block it.
        let stdout_handle = spawn_reader(child.stdout.take());
        let stderr_handle = spawn_reader(child.stderr.take());

        let waited = wait_forwarding_interrupts(&mut child);
        let output = ProcessOutput {
            stdout: join_reader(stdout_handle),
            stderr: join_reader(stderr_handle),
        };
        let status = waited?;

        if !status.success() {
            tracing::debug!(command = %line, code = ?status.code(), "Command failed");
            return Err(TaskError::CommandFailed {
                command: line,
                code: status.code(),
                stdout: output.stdout,
                stderr: output.stderr,
            }
            .into());
        }
        Ok(output)
    }

    fn exec(&self, command: &ShellCommand) -> Result<Infallible> {
        let line = command.render();
        tracing::debug!(command = %line, "Replacing process");
        let mut cmd = self.command(&line);
        exec_replacing(&mut cmd)
            .with_context(|| format!("Failed to start {}", self.settings.shell.display()))
    }
}

#[cfg(unix)]
fn exec_replacing(cmd: &mut Command) -> Result<Infallible> {
    use std::os::unix::process::CommandExt;
    // exec only returns on failure.
    Err(cmd.exec().into())
}

#[cfg(not(unix))]
fn exec_replacing(cmd: &mut Command) -> Result<Infallible> {
    let status = cmd.status()?;
    std::process::exit(status.code().unwrap_or(1));
}

fn spawn_reader<R>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut p| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = p.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Block until the child exits. A pending interrupt is forwarded to the
/// child, the child is awaited, then the interrupt is raised to the caller.
fn wait_forwarding_interrupts(child: &mut Child) -> Result<ExitStatus> {
    let poll = Duration::from_millis(WAIT_POLL_INTERVAL_MS);
    loop {
        if let Some(status) = child.try_wait().context("Failed to wait for process")? {
            return Ok(status);
        }
        if interrupt::take() {
            forward_interrupt(child);
            let _ = child.wait();
            return Err(Interrupted.into());
        }
        thread::sleep(poll);
    }
}

/// Captured children lead their own process group, so a forwarded SIGINT
/// reaches everything the shell started.
#[cfg(unix)]
fn own_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_cmd: &mut Command) {}

#[cfg(unix)]
fn forward_interrupt(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;
    let pgid = Pid::from_raw(child.id() as i32);
    if let Err(e) = killpg(pgid, Signal::SIGINT) {
        tracing::warn!(pid = child.id(), error = %e, "Failed to forward SIGINT");
    }
}

#[cfg(not(unix))]
fn forward_interrupt(child: &mut Child) {
    let _ = child.kill();
}

/// The named environment plus the runner used to reach it.
pub struct Environment<'a> {
    settings: &'a Settings,
    runner: &'a dyn ProcessRunner,
}

impl<'a> Environment<'a> {
    pub fn new(settings: &'a Settings, runner: &'a dyn ProcessRunner) -> Self {
        Self { settings, runner }
    }

    pub fn name(&self) -> &str {
        &self.settings.conda_env
    }

    pub fn settings(&self) -> &'a Settings {
        self.settings
    }

    /// Run on the host shell (no activation).
    pub fn run(&self, command: &ShellCommand) -> Result<ProcessOutput> {
        self.runner.run(command)
    }

    /// Run inside the activated environment.
    pub fn run_in_environment(&self, command: ShellCommand) -> Result<ProcessOutput> {
        self.runner.run(&self.activated(command))
    }

    /// Replace this process with a shell running `command` inside the
    /// activated environment.
    pub fn exec_in_environment(&self, command: ShellCommand) -> Result<Infallible> {
        self.runner.exec(&self.activated(command))
    }

    /// Wrap `command` so it runs after activating the environment and
    /// sourcing the env file (when present). Failed activation prints a hint
    /// and exits 1 without running `command`.
    pub fn activated(&self, command: ShellCommand) -> ShellCommand {
        let env_file = self.settings.env_file_path();
        let hint = format!(
            "Run ./{} install before attempting other commands.",
            self.settings.script_name
        );
        ShellCommand::new("if")
            .literal("source")
            .literal("activate")
            .arg(self.name())
            .literal("&> /dev/null")
            .literal(";")
            .literal("then")
            .literal("test -f")
            .arg(&env_file)
            .literal("&& source")
            .arg(&env_file)
            .literal(";")
            .command(command)
            .literal(";")
            .literal("else")
            .literal("printf '%s\\n'")
            .arg("ERROR!")
            .arg(ShellArgument::new(hint))
            .literal(";")
            .literal("exit 1")
            .literal(";")
            .literal("fi")
    }
}
