use std::path::Path;
use std::time::Instant;

use log::Level;
use serde_json::json;

use crate::fs::{atomic_replace_from, fsync_parent_dir, is_existing_file, sha256_hex_of};
use crate::logging::StageLogger;
use crate::policy::SaveStrategy;
use crate::types::{Error, Result};

use super::ConfigFile;

impl ConfigFile {
    /// Promote the working copy to the original file (`to_original`) or to the `~` backup.
    ///
    /// Every open handle is flushed first, in acquisition order. A failed flush aborts the save;
    /// flushes that already happened stay in the working copy, which is never delivered as is.
    ///
    /// # Errors
    ///
    /// `Logic` on a read-only file; `Io` if a flush, the replace, or the final existence check fails.
    pub fn save(&mut self, to_original: bool) -> Result<()> {
        self.ensure_writable("save")?;
        let target = if to_original {
            self.original_path.clone()
        } else {
            self.backup_path.clone()
        };
        let t0 = Instant::now();
        let res = self.save_to(&target);
        let duration_ms = u64::try_from(t0.elapsed().as_millis()).unwrap_or(u64::MAX);

        let tctx = self.audit_ctx();
        let ev = StageLogger::new(&tctx)
            .save()
            .field("target", json!(target.display().to_string()))
            .field("to_original", json!(to_original))
            .field("strategy", json!(format!("{:?}", self.policy.save.strategy)))
            .field("flushed_handles", json!(self.handles.len()))
            .field("duration_ms", json!(duration_ms));
        match &res {
            Ok(()) => ev
                .field("after_hash", json!(sha256_hex_of(&target)))
                .emit_success(),
            Err(e) => ev.error(e).emit_failure(),
        }
        res
    }

    fn save_to(&mut self, target: &Path) -> Result<()> {
        for (id, store) in &mut self.handles {
            store.flush().map_err(|e| {
                Error::io(format!(
                    "error while writing to file \"{}\" ({id}): {e}",
                    target.display()
                ))
            })?;
        }

        let fsync = self.policy.save.fsync;
        match self.policy.save.strategy {
            SaveStrategy::AtomicRename => {
                atomic_replace_from(self.claim.path(), target, fsync).map_err(|e| {
                    Error::io(format!(
                        "could not replace file \"{}\" with \"{}\": {e}",
                        target.display(),
                        self.claim.path().display()
                    ))
                })?;
            }
            SaveStrategy::RemoveThenCopy => {
                if is_existing_file(target) {
                    std::fs::remove_file(target)
                        .map_err(|e| Error::io_at("could not remove file", target, &e))?;
                }
                std::fs::copy(self.claim.path(), target).map_err(|e| {
                    Error::io(format!(
                        "could not copy file \"{}\" to \"{}\": {e}",
                        self.claim.path().display(),
                        target.display()
                    ))
                })?;
                if fsync {
                    // The bytes are already in place; a failed sync only weakens durability.
                    if let Err(e) = std::fs::File::open(target).and_then(|f| f.sync_all()) {
                        self.audit.log(
                            Level::Warn,
                            &format!("could not sync \"{}\": {e}", target.display()),
                        );
                    }
                    if let Err(e) = fsync_parent_dir(target) {
                        self.audit.log(
                            Level::Warn,
                            &format!("could not sync directory of \"{}\": {e}", target.display()),
                        );
                    }
                }
            }
        }

        // Some filesystems report success for a copy that produced nothing.
        if !is_existing_file(target) {
            return Err(Error::io(format!(
                "error while writing to file \"{}\": file missing after save",
                target.display()
            )));
        }
        Ok(())
    }
}
