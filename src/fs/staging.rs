//! Temp staging: the private working copy every session reads and writes.
//!
//! Layout: `<temp_root>/<app_dir>/<base64url(sha256(absolute source path))>`.
//! The name is a pure function of the source path, so reopening the same file lands on the same
//! working copy and a stale copy left by a crashed run is found and replaced.
//!
//! Within one process a working copy belongs to at most one live session at a time; see
//! [`WorkingCopyClaim`].
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::constants::LOCK_SUFFIX;
use crate::policy::Staging;
use crate::types::errors::{Error, Result};

use super::meta::path_digest_b64url;
use super::paths::{absolutize, is_existing_file, remove_file_if_exists};

static LIVE_WORKING_COPIES: Mutex<BTreeSet<PathBuf>> = Mutex::new(BTreeSet::new());

/// Deterministic working-copy path for `source` under the staging directory.
#[must_use]
pub fn temp_path_for(source: &Path, staging: &Staging) -> PathBuf {
    staging.dir().join(path_digest_b64url(&absolutize(source)))
}

/// Advisory lock file for the configuration at `original`, under the staging directory.
///
/// Keyed on the original path, not on the chosen source, so a session restoring from `path~`
/// and one reading `path` contend for the same lock.
#[must_use]
pub fn lock_path_for(original: &Path, staging: &Staging) -> PathBuf {
    let mut name = path_digest_b64url(&absolutize(original));
    name.push_str(LOCK_SUFFIX);
    staging.dir().join(name)
}

/// Copy `source` into `temp`, replacing any stale working copy. The staging directory must exist.
///
/// # Errors
///
/// Returns `Io` if a stale copy cannot be removed or the copy fails.
pub fn stage(source: &Path, temp: &Path) -> Result<()> {
    if is_existing_file(temp) {
        log::debug!("removing stale working copy {}", temp.display());
        std::fs::remove_file(temp).map_err(|e| Error::io_at("could not remove file", temp, &e))?;
    }
    std::fs::copy(source, temp).map_err(|e| {
        Error::io(format!(
            "could not copy file \"{}\" to \"{}\": {e}",
            source.display(),
            temp.display()
        ))
    })?;
    Ok(())
}

/// Remove the working copy if present.
///
/// # Errors
///
/// Returns the underlying IO error when the file exists but cannot be removed.
pub fn discard(temp: &Path) -> std::io::Result<bool> {
    remove_file_if_exists(temp)
}

/// In-process ownership of a working copy path; released on drop.
#[derive(Debug)]
pub struct WorkingCopyClaim {
    path: PathBuf,
}

impl WorkingCopyClaim {
    /// Claim `temp` for the calling session.
    ///
    /// # Errors
    ///
    /// Returns `Io` if another live session in this process already owns `temp`.
    pub fn acquire(temp: &Path) -> Result<Self> {
        let mut live = LIVE_WORKING_COPIES.lock().unwrap_or_else(PoisonError::into_inner);
        if !live.insert(temp.to_path_buf()) {
            return Err(Error::io(format!(
                "working copy \"{}\" is in use by another open session",
                temp.display()
            )));
        }
        Ok(Self { path: temp.to_path_buf() })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkingCopyClaim {
    fn drop(&mut self) {
        LIVE_WORKING_COPIES
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.path);
    }
}

/// Removes a freshly staged working copy unless the owner takes it over with [`StageGuard::keep`].
#[derive(Debug)]
pub struct StageGuard {
    path: PathBuf,
    armed: bool,
}

impl StageGuard {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    pub fn keep(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = discard(&self.path) {
                log::warn!("could not remove working copy {}: {e}", self.path.display());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn staging_in(root: &Path) -> Staging {
        Staging {
            temp_root: root.to_path_buf(),
            app_dir: "app".to_string(),
        }
    }

    #[test]
    fn temp_path_is_deterministic_and_rooted() {
        let td = tempfile::tempdir().unwrap();
        let st = staging_in(td.path());
        let a = temp_path_for(Path::new("/srv/a.ini"), &st);
        let b = temp_path_for(Path::new("/srv/a.ini"), &st);
        assert_eq!(a, b);
        assert_eq!(a.parent().unwrap(), td.path().join("app"));
        assert_ne!(a, temp_path_for(Path::new("/srv/b.ini"), &st));
    }

    #[test]
    fn stage_replaces_stale_copy() {
        let td = tempfile::tempdir().unwrap();
        let src = td.path().join("a.ini");
        std::fs::write(&src, b"fresh").unwrap();
        let tmp = temp_path_for(&src, &staging_in(td.path()));
        std::fs::create_dir_all(tmp.parent().unwrap()).unwrap();
        std::fs::write(&tmp, b"stale from a crashed run").unwrap();

        stage(&src, &tmp).unwrap();
        assert_eq!(std::fs::read(&tmp).unwrap(), b"fresh");
    }

    #[test]
    fn lock_path_ignores_backup_suffix_choice() {
        let td = tempfile::tempdir().unwrap();
        let st = staging_in(td.path());
        let lock = lock_path_for(Path::new("/srv/a.toml"), &st);
        assert_eq!(lock.parent().unwrap(), td.path().join("app"));
        assert!(lock.to_string_lossy().ends_with(LOCK_SUFFIX));
        assert_ne!(lock, temp_path_for(Path::new("/srv/a.toml"), &st));
    }

    #[test]
    fn claim_is_exclusive_until_dropped() {
        let td = tempfile::tempdir().unwrap();
        let p = td.path().join("claimed");
        let first = WorkingCopyClaim::acquire(&p).unwrap();
        assert_eq!(first.path(), p);
        let err = WorkingCopyClaim::acquire(&p).unwrap_err();
        assert_eq!(err.kind, crate::types::ErrorKind::Io);
        assert!(WorkingCopyClaim::acquire(&td.path().join("other")).is_ok());
        drop(first);
        assert!(WorkingCopyClaim::acquire(&p).is_ok());
    }

    #[test]
    fn stage_missing_source_is_io() {
        let td = tempfile::tempdir().unwrap();
        let tmp = td.path().join("x");
        let err = stage(&td.path().join("missing.ini"), &tmp).unwrap_err();
        assert_eq!(err.kind, crate::types::ErrorKind::Io);
    }

    #[test]
    fn guard_removes_unless_kept() {
        let td = tempfile::tempdir().unwrap();
        let p = td.path().join("w");
        std::fs::write(&p, b"x").unwrap();
        drop(StageGuard::new(p.clone()));
        assert!(!p.exists());

        std::fs::write(&p, b"x").unwrap();
        let kept = StageGuard::new(p.clone()).keep();
        assert_eq!(kept, p);
        assert!(p.exists());
    }
}
