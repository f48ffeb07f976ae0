//! Path utilities for cfgkeeper filesystem operations.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::constants::BACKUP_SUFFIX;

/// Sibling backup path: the original path with `~` appended to its last component.
#[must_use]
pub fn backup_path_for(original: &Path) -> PathBuf {
    let mut s = OsString::from(original.as_os_str());
    s.push(BACKUP_SUFFIX);
    PathBuf::from(s)
}

/// True when `path` exists and is a regular file (symlinks are followed).
#[must_use]
pub fn is_existing_file(path: &Path) -> bool {
    path.is_file()
}

/// Resolve `path` against the current directory without touching symlinks.
/// Falls back to the input when the current directory is unavailable.
#[must_use]
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Create `dir` and all missing ancestors.
///
/// # Errors
///
/// Returns an IO error if any component cannot be created or is not a directory.
pub fn mkpath(dir: &Path) -> std::io::Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(dir)
}

/// Remove a regular file if present. Returns `Ok(true)` when something was removed.
///
/// # Errors
///
/// Returns an IO error if the file exists but cannot be removed.
pub fn remove_file_if_exists(path: &Path) -> std::io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
