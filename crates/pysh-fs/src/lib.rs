//! Filesystem helpers used by the pysh orchestration crates.
//!
//! Plain I/O wrappers: remove a tree, ensure a directory, copy a tree,
//! stream a download to disk, and zip a directory.

pub mod archive;
pub mod download;
pub mod tree;

pub use archive::zip_dir;
pub use download::download;
pub use tree::{copy_tree, ensure_dir, remove_tree, reset_dir};

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the filesystem helpers.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("{op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Download {url} failed: {message}")]
    Download { url: String, message: String },

    #[error("Archive {}: {source}", .path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Cancelled")]
    Cancelled,

    #[error("Walk {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl FsError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FsError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, FsError>;
