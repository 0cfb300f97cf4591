//! Zip a directory tree.

use crate::{FsError, Result};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Compress everything under `src` into a new zip at `dest` with maximum
/// deflate compression. Entry names are paths relative to `src` with `/`
/// separators. `cancelled` is polled before each entry. On any failure,
/// cancellation included, the partial archive is removed. Returns the number
/// of files written.
pub fn zip_dir<C>(src: &Path, dest: &Path, cancelled: C) -> Result<usize>
where
    C: Fn() -> bool,
{
    let result = write_zip(src, dest, cancelled);
    if result.is_err() {
        let _ = std::fs::remove_file(dest);
    }
    result
}

fn write_zip<C>(src: &Path, dest: &Path, cancelled: C) -> Result<usize>
where
    C: Fn() -> bool,
{
    let zip_err = |e| FsError::Zip {
        path: dest.to_path_buf(),
        source: e,
    };
    let file = File::create(dest).map_err(|e| FsError::io("Create", dest, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    let mut files = 0usize;
    let walker = WalkDir::new(src).follow_links(true).sort_by_file_name();
    for entry in walker {
        if cancelled() {
            return Err(FsError::Cancelled);
        }
        let entry = entry.map_err(|e| FsError::Walk {
            path: src.to_path_buf(),
            source: e,
        })?;
        let rel = match entry.path().strip_prefix(src) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel,
            _ => continue,
        };
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let entry_options = options.unix_permissions(unix_mode(entry.path()));
        if entry.file_type().is_dir() {
            zip.add_directory(name, entry_options).map_err(zip_err)?;
        } else {
            zip.start_file(name, entry_options).map_err(zip_err)?;
            let mut f = File::open(entry.path()).map_err(|e| FsError::io("Open", entry.path(), e))?;
            io::copy(&mut f, &mut zip).map_err(|e| FsError::io("Compress", entry.path(), e))?;
            files += 1;
        }
    }
    zip.finish().map_err(zip_err)?;
    tracing::debug!(src = %src.display(), dest = %dest.display(), files, "Wrote archive");
    Ok(files)
}

#[cfg(unix)]
fn unix_mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o777)
        .unwrap_or(0o644)
}

#[cfg(not(unix))]
fn unix_mode(path: &Path) -> u32 {
    if path.is_dir() {
        0o755
    } else {
        0o644
    }
}
