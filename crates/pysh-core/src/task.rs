//! Task reporting.
//!
//! A task prints `<description>... ` and then exactly one marker: `done!`,
//! `WARNING!`, `ABORTED!` or `ERROR!`. Warnings let the command continue;
//! aborts and fatal errors come back as [`Reported`] so cleanup scopes can
//! unwind before the top-level [`Reporter::capture`] exits with status 1.

use crate::error::{self, Outcome, Reported};
use crate::interrupt;
use anyhow::Result;
use std::cell::RefCell;
use std::io::{self, IsTerminal, Write};
use std::rc::Rc;

const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const PLAIN: &str = "\x1b[0m";

/// Writes task progress to a terminal (or any writer).
pub struct Reporter {
    out: RefCell<Box<dyn Write>>,
    traceback: bool,
    color: bool,
}

impl Reporter {
    /// Report to stdout, colored when stdout is a terminal.
    pub fn stdout(traceback: bool) -> Self {
        let color = io::stdout().is_terminal();
        Self::new(Box::new(io::stdout()), traceback, color)
    }

    pub fn new(out: Box<dyn Write>, traceback: bool, color: bool) -> Self {
        Self {
            out: RefCell::new(out),
            traceback,
            color,
        }
    }

    /// Uncolored reporter writing into a shared buffer, for tests.
    pub fn buffered(traceback: bool) -> (Self, SharedBuffer) {
        let buf = SharedBuffer::default();
        (Self::new(Box::new(buf.clone()), traceback, false), buf)
    }

    /// Print a task description without running anything. Used before a
    /// process replacement, where the child prints the completion marker.
    pub fn start(&self, description: &str) {
        self.write(&format!("{}... ", description));
    }

    /// Run `body` as a reported task.
    ///
    /// Returns `Ok(Some(value))` on success, `Ok(None)` when the body failed
    /// with a warning, and a [`Reported`] error for aborts and fatal errors.
    pub fn task<T, F>(&self, description: &str, body: F) -> Result<Option<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        self.start(description);
        let result = interrupt::check().and_then(|()| body());
        match result {
            Ok(value) => {
                self.marker(GREEN, "done!");
                Ok(Some(value))
            }
            Err(err) => match self.report(&err) {
                Outcome::Warning => Ok(None),
                outcome => Err(Reported { outcome }.into()),
            },
        }
    }

    /// Top-level scope: run the command and map the outcome to an exit status.
    pub fn capture<F>(&self, body: F) -> u8
    where
        F: FnOnce() -> Result<()>,
    {
        match body() {
            Ok(()) => 0,
            Err(err) => match self.report(&err) {
                Outcome::Warning => 0,
                Outcome::Aborted | Outcome::Fatal => 1,
            },
        }
    }

    /// Print the marker and message for a failure and return its class.
    /// Failures that were already reported are not printed twice.
    fn report(&self, err: &anyhow::Error) -> Outcome {
        if err.chain().any(|cause| cause.is::<Reported>()) {
            return Outcome::of(err);
        }
        let outcome = Outcome::of(err);
        match outcome {
            Outcome::Warning => {
                self.marker(YELLOW, "WARNING!");
                let msg = error::warning_message(err).unwrap_or_default();
                self.write(&format!("* {}\n", msg));
            }
            Outcome::Aborted => {
                self.marker(YELLOW, "ABORTED!");
            }
            Outcome::Fatal => {
                self.marker(RED, "ERROR!");
                self.write(&format!("{}\n", error::user_message(err).trim_end()));
                if self.traceback {
                    self.write(&format!("{:?}\n", err));
                }
            }
        }
        tracing::debug!(outcome = %outcome, error = %err, "Task failed");
        outcome
    }

    fn marker(&self, color: &str, text: &str) {
        if self.color {
            self.write(&format!("{}{}{}\n", color, text, PLAIN));
        } else {
            self.write(&format!("{}\n", text));
        }
    }

    fn write(&self, text: &str) {
        let mut out = self.out.borrow_mut();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

/// A cloneable in-memory writer.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
