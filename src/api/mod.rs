// Facade for API module; delegates to submodules under src/api/

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::Level;
use serde_json::json;

use crate::adapters::{KeyValueStore, LockGuard, StoreOpener};
use crate::fs::WorkingCopyClaim;
use crate::logging::audit::{AuditCtx, Stage};
use crate::logging::{now_iso, AuditSink, FactsEmitter, StageLogger};
use crate::policy::Policy;
use crate::types::{Error, HandleId, Result};

mod builder;
pub mod errors;
mod handles;
mod open;
mod remove;
mod save;

pub use builder::ConfigFileBuilder;

/// A configuration file opened for one editing session.
///
/// All handles read and write a private working copy; the original (`path`) and the backup
/// (`path~`) change only through [`save`](ConfigFile::save), [`remove`](ConfigFile::remove) and
/// [`create`](ConfigFile::create). Dropping the instance deletes the working copy and, unless
/// read-only, the backup.
pub struct ConfigFile {
    original_path: PathBuf,
    backup_path: PathBuf,
    read_only: bool,
    file_version: i32,
    handles: BTreeMap<HandleId, Box<dyn KeyValueStore>>,
    next_handle: u64,
    policy: Policy,
    opener: Box<dyn StoreOpener>,
    facts: Box<dyn FactsEmitter>,
    audit: Box<dyn AuditSink>,
    lock: Option<Box<dyn LockGuard>>,
    /// Owns the working copy path; released after `Drop` has discarded the file.
    claim: WorkingCopyClaim,
}

impl std::fmt::Debug for ConfigFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigFile")
            .field("original_path", &self.original_path)
            .field("temp_path", &self.claim.path())
            .field("read_only", &self.read_only)
            .field("file_version", &self.file_version)
            .field("open_handles", &self.handles.len())
            .finish_non_exhaustive()
    }
}

impl ConfigFile {
    #[must_use]
    pub fn builder() -> ConfigFileBuilder {
        ConfigFileBuilder::new()
    }

    /// Open an existing configuration file.
    ///
    /// With `restore_from_backup` the `~` backup is used as source when it exists, which recovers
    /// the state of a session that was interrupted after a backup save.
    ///
    /// # Errors
    ///
    /// `NotFound` if the chosen source does not exist; `Io` if the working copy cannot be staged
    /// or its store reports an error.
    pub fn open(path: impl AsRef<Path>, restore_from_backup: bool, read_only: bool) -> Result<Self> {
        ConfigFileBuilder::new().open(path, restore_from_backup, read_only)
    }

    /// Create (or overwrite) a configuration file and open it.
    /// `initial_version` of `-1` leaves the version unset.
    ///
    /// # Errors
    ///
    /// `Io` if the destination cannot be prepared or the initial version cannot be persisted.
    pub fn create(path: impl AsRef<Path>, initial_version: i32) -> Result<Self> {
        ConfigFileBuilder::new().create(path, initial_version)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.original_path
    }

    #[must_use]
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Working copy every handle is bound to.
    #[must_use]
    pub fn temp_path(&self) -> &Path {
        self.claim.path()
    }

    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Version read at open or last written by `set_version`; `-1` when unknown.
    #[must_use]
    pub const fn version(&self) -> i32 {
        self.file_version
    }

    #[must_use]
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    fn ensure_writable(&self, what: &str) -> Result<()> {
        if self.read_only {
            return Err(Error::logic(format!("cannot {what} read-only file")));
        }
        Ok(())
    }

    fn audit_ctx(&self) -> AuditCtx<'_> {
        AuditCtx::new(
            self.facts.as_ref(),
            self.original_path.display().to_string(),
            now_iso(),
        )
    }
}

impl Drop for ConfigFile {
    fn drop(&mut self) {
        let leaked = self.handles.len();
        if leaked > 0 {
            self.audit.log(
                Level::Error,
                &format!(
                    "defect: {leaked} store handle(s) still open while closing \"{}\"; unflushed changes are dropped",
                    self.original_path.display()
                ),
            );
        }
        // Drop without flushing.
        self.handles.clear();

        let mut notes = Vec::new();
        if let Err(e) = crate::fs::discard(self.claim.path()) {
            notes.push(format!("could not remove \"{}\": {e}", self.claim.path().display()));
        }
        if !self.read_only {
            if let Err(e) = crate::fs::remove_file_if_exists(&self.backup_path) {
                notes.push(format!("could not remove \"{}\": {e}", self.backup_path.display()));
            }
        }
        for n in &notes {
            self.audit.log(Level::Warn, n);
        }
        {
            let tctx = self.audit_ctx();
            let slog = StageLogger::new(&tctx);
            let ev = slog
                .stage(Stage::Drop)
                .field("leaked_handles", json!(leaked))
                .field("notes", json!(notes));
            if leaked > 0 || !notes.is_empty() {
                ev.emit_warn();
            } else {
                ev.emit_success();
            }
        }
        self.lock.take();
    }
}
