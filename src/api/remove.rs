use log::Level;
use serde_json::json;

use crate::fs::{discard, remove_file_if_exists};
use crate::logging::StageLogger;
use crate::types::{Error, Result};

use super::ConfigFile;

impl ConfigFile {
    /// Delete the original, the backup and, when no handle is open, the working copy.
    ///
    /// Every deletion is attempted even if an earlier one fails; failures are reported together.
    ///
    /// # Errors
    ///
    /// `Logic` on a read-only file; `Io` listing every path that could not be removed.
    pub fn remove(&self) -> Result<()> {
        self.ensure_writable("remove")?;
        let mut failures = Vec::new();

        for p in [&self.original_path, &self.backup_path] {
            if let Err(e) = remove_file_if_exists(p) {
                failures.push(format!("\"{}\": {e}", p.display()));
            }
        }

        let open = self.handles.len();
        let kept_temp = open > 0;
        if kept_temp {
            self.audit.log(
                Level::Error,
                &format!(
                    "defect: {open} store handle(s) still open; keeping working copy \"{}\"",
                    self.claim.path().display()
                ),
            );
        } else if let Err(e) = discard(self.claim.path()) {
            failures.push(format!("\"{}\": {e}", self.claim.path().display()));
        }

        let tctx = self.audit_ctx();
        let ev = StageLogger::new(&tctx)
            .remove()
            .field("kept_temp", json!(kept_temp))
            .field("open_handles", json!(open));
        if failures.is_empty() {
            if kept_temp {
                ev.emit_warn();
            } else {
                ev.emit_success();
            }
            return Ok(());
        }
        let err = Error::io(format!(
            "could not remove file(s) of \"{}\": {}",
            self.original_path.display(),
            failures.join("; ")
        ));
        ev.error(&err).emit_failure();
        Err(err)
    }

    /// Delete the working copy once every handle has been released, e.g. after a `remove` that
    /// had to keep it.
    ///
    /// # Errors
    ///
    /// `Logic` while handles are still open; `Io` if the file cannot be removed.
    pub fn discard_working_copy(&self) -> Result<()> {
        if !self.handles.is_empty() {
            return Err(Error::logic(format!(
                "{} store handle(s) still use \"{}\"",
                self.handles.len(),
                self.claim.path().display()
            )));
        }
        discard(self.claim.path())
            .map(|_| ())
            .map_err(|e| Error::io_at("could not remove file", self.claim.path(), &e))
    }
}
