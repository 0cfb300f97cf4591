//! Shell command construction.
//!
//! A [`ShellCommand`] is a list of words. Fixed syntax (program names,
//! flags, operators) can only come from `&'static str` literals; every value
//! that originates at runtime goes through [`ShellArgument`] and is quoted
//! when rendered. The one exception is [`ShellCommand::script`], which
//! carries a script line from the project config verbatim.

use std::fmt;
use std::path::{Path, PathBuf};

/// A runtime value that is always escaped on render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellArgument(String);

impl ShellArgument {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// POSIX shell quoting: safe strings pass through, everything else is
    /// wrapped in single quotes with embedded quotes spliced as `'"'"'`.
    pub fn render(&self) -> String {
        quote(&self.0)
    }
}

impl From<&str> for ShellArgument {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ShellArgument {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&String> for ShellArgument {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}

impl From<&Path> for ShellArgument {
    fn from(p: &Path) -> Self {
        Self(p.to_string_lossy().into_owned())
    }
}

impl From<&PathBuf> for ShellArgument {
    fn from(p: &PathBuf) -> Self {
        Self::from(p.as_path())
    }
}

impl From<PathBuf> for ShellArgument {
    fn from(p: PathBuf) -> Self {
        Self::from(p.as_path())
    }
}

impl fmt::Display for ShellArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c)
}

/// Quote a string for a POSIX shell.
pub fn quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    if s.chars().all(is_safe) {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', "'\"'\"'"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Word {
    Literal(&'static str),
    Arg(ShellArgument),
    Script(String),
    Nested(ShellCommand),
}

/// A shell command line under construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellCommand {
    words: Vec<Word>,
}

impl ShellCommand {
    /// Start a command with a fixed program name.
    pub fn new(program: &'static str) -> Self {
        Self {
            words: vec![Word::Literal(program)],
        }
    }

    /// Start from a runtime program path (quoted).
    pub fn program(program: impl Into<ShellArgument>) -> Self {
        Self {
            words: vec![Word::Arg(program.into())],
        }
    }

    /// A command built only from quoted arguments, e.g. a user's `run -- ...`.
    pub fn from_args<I, A>(args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ShellArgument>,
    {
        Self::default().args(args)
    }

    /// A script line from the project config, rendered verbatim.
    pub fn script(line: impl Into<String>) -> Self {
        Self {
            words: vec![Word::Script(line.into())],
        }
    }

    /// Append fixed syntax: a flag, keyword or operator.
    pub fn literal(mut self, word: &'static str) -> Self {
        self.words.push(Word::Literal(word));
        self
    }

    /// Append a quoted argument.
    pub fn arg(mut self, arg: impl Into<ShellArgument>) -> Self {
        self.words.push(Word::Arg(arg.into()));
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ShellArgument>,
    {
        self.words.extend(args.into_iter().map(|a| Word::Arg(a.into())));
        self
    }

    /// Splice another command in place.
    pub fn command(mut self, other: ShellCommand) -> Self {
        self.words.push(Word::Nested(other));
        self
    }

    /// `self && other`
    pub fn and(self, other: ShellCommand) -> Self {
        self.literal("&&").command(other)
    }

    /// `self | other`
    pub fn pipe(self, other: ShellCommand) -> Self {
        self.literal("|").command(other)
    }

    /// Render to a single command line.
    pub fn render(&self) -> String {
        self.words
            .iter()
            .map(|w| match w {
                Word::Literal(s) => (*s).to_string(),
                Word::Arg(a) => a.render(),
                Word::Script(s) => s.clone(),
                Word::Nested(c) => c.render(),
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_safe_passthrough() {
        assert_eq!(quote("flask==1.0"), "flask==1.0");
        assert_eq!(quote("/usr/bin/python3"), "/usr/bin/python3");
    }

    #[test]
    fn test_quote_spaces_and_quotes() {
        assert_eq!(quote(""), "''");
        assert_eq!(quote("hello world"), "'hello world'");
        assert_eq!(quote("it's"), "'it'\"'\"'s'");
        assert_eq!(quote("$(rm -rf /)"), "'$(rm -rf /)'");
    }

    #[test]
    fn test_render_command() {
        let cmd = ShellCommand::new("conda")
            .literal("create")
            .literal("--yes")
            .literal("--name")
            .arg("my env")
            .args(["python=3", "numpy=1.11"]);
        assert_eq!(
            cmd.render(),
            "conda create --yes --name 'my env' python=3 numpy=1.11"
        );
    }

    #[test]
    fn test_injection_is_quoted() {
        let cmd = ShellCommand::from_args(["echo", "a; rm -rf ~"]);
        assert_eq!(cmd.render(), "echo 'a; rm -rf ~'");
    }

    #[test]
    fn test_pipe_and_chain() {
        let cmd = ShellCommand::new("git")
            .literal("archive")
            .pipe(ShellCommand::new("tar").literal("-x"))
            .and(ShellCommand::new("true"));
        assert_eq!(cmd.render(), "git archive | tar -x && true");
    }

    #[test]
    fn test_script_is_verbatim() {
        let cmd = ShellCommand::script("python manage.py migrate && echo ok");
        assert_eq!(cmd.render(), "python manage.py migrate && echo ok");
    }
}
