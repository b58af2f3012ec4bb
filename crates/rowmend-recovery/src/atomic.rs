//! Crash-safe file replacement
//!
//! Content is written to a sibling temp file, synced, then renamed over the
//! target. The parent directory is synced after the rename so the new entry
//! survives power loss.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Sibling temp path: `<path>.tmp`
#[must_use]
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` to `<path>.tmp` and sync it; the target is not touched
///
/// # Errors
/// Any I/O error creating, writing or syncing the temp file.
pub fn write_temp(path: &Path, bytes: &[u8]) -> io::Result<PathBuf> {
    let tmp = temp_path(path);
    let mut file = fs::File::create(&tmp)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()?;
    Ok(tmp)
}

/// Rename `tmp` over `path` and sync the parent directory
///
/// # Errors
/// Any I/O error from the rename or directory sync.
pub fn replace(tmp: &Path, path: &Path) -> io::Result<()> {
    fs::rename(tmp, path)?;
    sync_parent_dir(path)
}

/// [`write_temp`] then [`replace`]; the temp file is removed on failure
///
/// # Errors
/// Any I/O error from either step.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = write_temp(path, bytes)?;
    replace(&tmp, path).inspect_err(|_| discard(&tmp))
}

/// Best-effort removal of an abandoned temp file
pub fn discard(tmp: &Path) {
    if let Err(err) = fs::remove_file(tmp) {
        if err.kind() != io::ErrorKind::NotFound {
            tracing::warn!(path = %tmp.display(), %err, "failed to remove temp file");
        }
    }
}

fn sync_parent_dir(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::File::open(parent)?.sync_all()?;
        }
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
