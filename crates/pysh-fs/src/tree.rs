//! Directory tree helpers.

use crate::{FsError, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Remove a file or directory tree. Missing paths are not an error.
pub fn remove_tree(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FsError::io("Stat", path, e)),
        Ok(meta) if meta.is_dir() => {
            fs::remove_dir_all(path).map_err(|e| FsError::io("Remove", path, e))
        }
        Ok(_) => fs::remove_file(path).map_err(|e| FsError::io("Remove", path, e)),
    }
}

/// Create a directory and its parents if needed.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| FsError::io("Create", path, e))
}

/// Remove `path` and recreate it empty.
pub fn reset_dir(path: &Path) -> Result<()> {
    remove_tree(path)?;
    ensure_dir(path)
}

/// Recursively copy `src` to `dest`, creating `dest`. Symlinks are copied as
/// the files they point to. `cancelled` is polled before each entry; when it
/// returns true the copy stops with [`FsError::Cancelled`].
pub fn copy_tree<C>(src: &Path, dest: &Path, cancelled: C) -> Result<u64>
where
    C: Fn() -> bool,
{
    let mut copied = 0u64;
    for entry in WalkDir::new(src).follow_links(true) {
        if cancelled() {
            return Err(FsError::Cancelled);
        }
        let entry = entry.map_err(|e| FsError::Walk {
            path: src.to_path_buf(),
            source: e,
        })?;
        let rel = match entry.path().strip_prefix(src) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                ensure_dir(parent)?;
            }
            fs::copy(entry.path(), &target).map_err(|e| FsError::io("Copy", entry.path(), e))?;
            copied += 1;
        }
    }
    tracing::debug!(src = %src.display(), dest = %dest.display(), files = copied, "Copied tree");
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_tree_missing_is_ok() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        remove_tree(&missing).unwrap();
        remove_tree(&missing).unwrap();
    }

    #[test]
    fn test_remove_tree_file_and_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "x").unwrap();
        remove_tree(&file).unwrap();
        assert!(!file.exists());

        let dir = tmp.path().join("d/e");
        ensure_dir(&dir).unwrap();
        fs::write(dir.join("f"), "y").unwrap();
        remove_tree(&tmp.path().join("d")).unwrap();
        assert!(!tmp.path().join("d").exists());
    }

    #[test]
    fn test_reset_dir_empties() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("build");
        ensure_dir(&dir).unwrap();
        fs::write(dir.join("stale"), "old").unwrap();
        reset_dir(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_copy_tree_keeps_relative_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("lib");
        ensure_dir(&src.join("nested")).unwrap();
        fs::write(src.join("top.txt"), "1").unwrap();
        fs::write(src.join("nested/inner.txt"), "2").unwrap();

        let dest = tmp.path().join("out/lib");
        let n = copy_tree(&src, &dest, || false).unwrap();
        assert_eq!(n, 2);
        assert_eq!(fs::read_to_string(dest.join("top.txt")).unwrap(), "1");
        assert_eq!(fs::read_to_string(dest.join("nested/inner.txt")).unwrap(), "2");
    }

    #[test]
    fn test_copy_tree_stops_when_cancelled() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("lib");
        ensure_dir(&src).unwrap();
        for name in ["a", "b", "c"] {
            fs::write(src.join(name), name).unwrap();
        }
        let polls = std::cell::Cell::new(0);
        let err = copy_tree(&src, &tmp.path().join("out"), || {
            polls.set(polls.get() + 1);
            polls.get() > 2
        })
        .unwrap_err();
        assert!(matches!(err, FsError::Cancelled));
        assert_eq!(polls.get(), 3);
    }
}
