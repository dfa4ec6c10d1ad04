//! Whole-file replacement for the on-disk stores.

use std::io::Write;
use std::path::Path;

/// Replace `path` with `bytes`.
///
/// Each call writes to its own uniquely named temp file in the target
/// directory and renames it into place, so readers see either the old or the
/// new contents and concurrent writers never share a temp file.
pub async fn write_atomic(path: &Path, bytes: Vec<u8>) -> std::io::Result<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(std::io::Error::other)?
}
