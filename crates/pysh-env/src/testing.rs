//! In-memory [`ProcessRunner`] for tests.
//!
//! Records every rendered command line and simulates the conda environment
//! registry so create/remove/list round trip. Handlers registered with
//! [`RecordingRunner::on`] take precedence and can fail a command or produce
//! files the real tool would have written. [`PackageServer`] serves package
//! bodies over loopback HTTP for the download paths.

use anyhow::Result;
use pysh_core::TaskError;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::convert::Infallible;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use thiserror::Error;

use crate::runner::{ProcessOutput, ProcessRunner};
use crate::shell::ShellCommand;

type Handler = Box<dyn Fn(&str) -> Result<ProcessOutput>>;

/// Returned by [`RecordingRunner::exec`] in place of process replacement.
#[derive(Debug, Error)]
#[error("exec: {0}")]
pub struct ExecCalled(pub String);

#[derive(Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<String>>,
    envs: RefCell<BTreeSet<String>>,
    handlers: RefCell<Vec<(String, Handler)>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle every command line containing `needle` with `handler`. The
    /// most recently registered match wins.
    pub fn on<F>(&self, needle: &str, handler: F)
    where
        F: Fn(&str) -> Result<ProcessOutput> + 'static,
    {
        self.handlers
            .borrow_mut()
            .push((needle.to_string(), Box::new(handler)));
    }

    /// Fail every command line containing `needle` with exit status 1 and
    /// `stderr`.
    pub fn fail_on(&self, needle: &str, stderr: &str) {
        let stderr = stderr.to_string();
        self.on(needle, move |line| {
            Err(TaskError::CommandFailed {
                command: line.to_string(),
                code: Some(1),
                stdout: String::new(),
                stderr: stderr.clone(),
            }
            .into())
        });
    }

    /// Pretend conda already knows `name`.
    pub fn add_env(&self, name: &str) {
        self.envs.borrow_mut().insert(name.to_string());
    }

    pub fn has_env(&self, name: &str) -> bool {
        self.envs.borrow().contains(name)
    }

    /// Every command line run or exec'd so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn calls_matching(&self, needle: &str) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.contains(needle))
            .cloned()
            .collect()
    }

    fn dispatch(&self, line: &str) -> Result<ProcessOutput> {
        let handlers = self.handlers.borrow();
        if let Some((_, handler)) = handlers.iter().rev().find(|(needle, _)| line.contains(needle.as_str())) {
            return handler(line);
        }
        drop(handlers);
        Ok(self.simulate_conda(line))
    }

    fn simulate_conda(&self, line: &str) -> ProcessOutput {
        let mut stdout = String::new();
        if line.starts_with("conda env list --json") {
            let envs: Vec<String> = self
                .envs
                .borrow()
                .iter()
                .map(|name| format!("/opt/miniconda/envs/{}", name))
                .collect();
            stdout = serde_json::json!({ "envs": envs }).to_string();
        } else if line.starts_with("conda env remove") {
            if let Some(name) = name_flag(line) {
                self.envs.borrow_mut().remove(&name);
            }
        } else if line.starts_with("conda create") || line.starts_with("conda env create") {
            if let Some(name) = name_flag(line) {
                self.envs.borrow_mut().insert(name);
            }
        }
        ProcessOutput {
            stdout,
            stderr: String::new(),
        }
    }
}

/// The word after `--name`.
fn name_flag(line: &str) -> Option<String> {
    let mut words = line.split_whitespace();
    words.find(|w| *w == "--name")?;
    words.next().map(String::from)
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, command: &ShellCommand) -> Result<ProcessOutput> {
        let line = command.render();
        self.calls.borrow_mut().push(line.clone());
        self.dispatch(&line)
    }

    fn exec(&self, command: &ShellCommand) -> Result<Infallible> {
        let line = command.render();
        self.calls.borrow_mut().push(line.clone());
        Err(ExecCalled(line).into())
    }
}

/// Minimal HTTP/1.1 file server on `127.0.0.1`. Serves `GET /<name>` from a
/// fixed set of bodies, 404 otherwise, one request per connection.
pub struct PackageServer {
    base_url: String,
    requests: Arc<AtomicUsize>,
}

impl PackageServer {
    pub fn start(files: &[(&str, &str)]) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let base_url = format!("http://{}", listener.local_addr()?);
        let files: HashMap<String, String> = files
            .iter()
            .map(|(name, body)| (name.to_string(), body.to_string()))
            .collect();
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = serve(stream, &files);
            }
        });
        Ok(Self { base_url, requests })
    }

    pub fn url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    /// Connections accepted so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

fn serve(stream: TcpStream, files: &HashMap<String, String>) -> io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 || header == "\r\n" {
            break;
        }
    }
    let path = request_line.split_whitespace().nth(1).unwrap_or("/");
    let (status, body) = match files.get(path.trim_start_matches('/')) {
        Some(body) => ("200 OK", body.as_str()),
        None => ("404 Not Found", ""),
    };
    let mut stream = stream;
    write!(
        stream,
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    )?;
    stream.flush()
}
