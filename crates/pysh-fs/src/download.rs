//! Streaming HTTP download.

use crate::{tree::ensure_dir, FsError, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Stream `url` into the file at `dest`, creating parent directories.
pub fn download(url: &str, dest: &Path) -> Result<u64> {
    let response = ureq::get(url).call().map_err(|e| FsError::Download {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    if let Some(parent) = dest.parent() {
        ensure_dir(parent)?;
    }
    let file = File::create(dest).map_err(|e| FsError::io("Create", dest, e))?;
    let mut writer = BufWriter::new(file);
    let mut reader = response.into_reader();
    let written = io::copy(&mut reader, &mut writer).map_err(|e| FsError::io("Write", dest, e))?;
    writer.flush().map_err(|e| FsError::io("Write", dest, e))?;
    tracing::debug!(url = %url, dest = %dest.display(), bytes = written, "Downloaded");
    Ok(written)
}

/// The last path segment of a URL, without query or fragment.
pub fn file_name_from_url(url: &str) -> Option<&str> {
    let url = url.split(['?', '#']).next().unwrap_or(url);
    url.rsplit('/').next().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("https://repo.anaconda.com/pkgs/main/linux-64/python-3.6.0-0.tar.bz2"),
            Some("python-3.6.0-0.tar.bz2")
        );
        assert_eq!(
            file_name_from_url("https://x/pkg-1.0.tar.bz2#a1b2c3"),
            Some("pkg-1.0.tar.bz2")
        );
        assert_eq!(file_name_from_url("https://x/dir/"), None);
    }

    #[test]
    fn test_download_bad_url_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let err = download("not a url", &tmp.path().join("f")).unwrap_err();
        assert!(matches!(err, FsError::Download { .. }));
    }
}
