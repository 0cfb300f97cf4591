//! Scoped resources with guaranteed release.
//!
//! Each acquired resource registers its release before acquisition starts, so
//! a half-built resource is still torn down. Releases run newest first when
//! the stack unwinds: on success, on error, after an interrupt, and on panic
//! through `Drop`. Releases run under an interrupt shield, so a pending
//! Ctrl+C neither stops nor is consumed by teardown.

use anyhow::Result;
use pysh_core::{interrupt, Interrupted};

type Release<'a> = Box<dyn FnOnce() -> Result<()> + 'a>;

/// A stack of pending releases.
#[derive(Default)]
pub struct CleanupStack<'a> {
    releases: Vec<(String, Release<'a>)>,
}

impl<'a> CleanupStack<'a> {
    pub fn new() -> Self {
        Self {
            releases: Vec::new(),
        }
    }

    /// Register `release`, then run `acquire`. The release runs at unwind
    /// whether or not `acquire` succeeded.
    pub fn acquire<T, A, R>(&mut self, label: &str, acquire: A, release: R) -> Result<T>
    where
        A: FnOnce() -> Result<T>,
        R: FnOnce() -> Result<()> + 'a,
    {
        self.push(label, release);
        acquire()
    }

    pub fn push<R>(&mut self, label: &str, release: R)
    where
        R: FnOnce() -> Result<()> + 'a,
    {
        tracing::debug!(resource = label, "Registered release");
        self.releases.push((label.to_string(), Box::new(release)));
    }

    /// Run every pending release, newest first. All releases run even when
    /// one fails; the first failure is returned.
    pub fn unwind(&mut self) -> Result<()> {
        let _shield = interrupt::shield();
        let mut first_err = None;
        while let Some((label, release)) = self.releases.pop() {
            tracing::debug!(resource = %label, "Releasing");
            if let Err(e) = release() {
                tracing::warn!(resource = %label, error = %e, "Release failed");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for CleanupStack<'_> {
    fn drop(&mut self) {
        if !self.releases.is_empty() {
            let _ = self.unwind();
        }
    }
}

/// Run `body` with a fresh stack and release everything it acquired. The
/// body's error wins over release errors; release errors surface only when
/// the body succeeded. An interrupt still pending once everything is
/// released turns success into [`Interrupted`].
pub fn with_cleanup<'a, T, F>(body: F) -> Result<T>
where
    F: FnOnce(&mut CleanupStack<'a>) -> Result<T>,
{
    let mut stack = CleanupStack::new();
    let result = body(&mut stack);
    let released = stack.unwind();
    let interrupted = interrupt::take();
    match (result, released) {
        (Ok(_), Ok(())) if interrupted => Err(Interrupted.into()),
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(release_err)) => Err(release_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(release_err)) => {
            tracing::warn!(error = %release_err, "Cleanup failed after an earlier error");
            Err(err)
        }
    }
}
