//! Process-wide interrupt flag.
//!
//! A single Ctrl+C handler raises the flag; the runner forwards the signal
//! to the child it is waiting on and task scopes turn the flag into an
//! [`Interrupted`](crate::Interrupted) error. Taking the flag clears it so
//! cleanup scopes can still run their own commands afterwards.
//!
//! While a [`Shield`] is alive on a thread, that thread neither sees nor
//! consumes the flag: teardown runs to completion and the interrupt stays
//! pending for whoever checks after the shield drops.

use anyhow::{Context, Result};
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static INSTALLED: OnceLock<()> = OnceLock::new();

thread_local! {
    static SHIELD_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Install the Ctrl+C handler. Safe to call more than once.
pub fn install_handler() -> Result<()> {
    if INSTALLED.get().is_some() {
        return Ok(());
    }
    ctrlc::set_handler(|| {
        INTERRUPTED.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;
    let _ = INSTALLED.set(());
    Ok(())
}

/// Whether an interrupt is pending, without clearing it. Always false on a
/// shielded thread.
pub fn is_pending() -> bool {
    !is_shielded() && INTERRUPTED.load(Ordering::SeqCst)
}

/// Consume a pending interrupt. Returns true if one was pending. A shielded
/// thread never consumes the flag.
pub fn take() -> bool {
    !is_shielded() && INTERRUPTED.swap(false, Ordering::SeqCst)
}

/// Raise the flag by hand (tests, and non-signal cancellation).
pub fn raise() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Hide the flag from this thread until the guard drops. Nests.
pub fn shield() -> Shield {
    SHIELD_DEPTH.with(|d| d.set(d.get() + 1));
    Shield { _private: () }
}

pub fn is_shielded() -> bool {
    SHIELD_DEPTH.with(|d| d.get() > 0)
}

/// Guard returned by [`shield`].
#[must_use = "the shield lifts as soon as the guard is dropped"]
pub struct Shield {
    _private: (),
}

impl Drop for Shield {
    fn drop(&mut self) {
        SHIELD_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Fail with [`Interrupted`](crate::Interrupted) if an interrupt is pending.
pub fn check() -> Result<()> {
    if take() {
        return Err(crate::Interrupted.into());
    }
    Ok(())
}
