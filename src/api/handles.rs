use log::Level;
use serde_json::json;

use crate::adapters::KeyValueStore;
use crate::constants::META_VERSION_KEY;
use crate::logging::audit::Stage;
use crate::logging::StageLogger;
use crate::types::{Error, HandleId, Result};

use super::ConfigFile;

impl ConfigFile {
    /// Open a new store bound to the working copy and register it.
    ///
    /// Several handles may be open at once; they are independent views of the same file and
    /// writes between them are not coordinated.
    ///
    /// # Errors
    ///
    /// `Io` if the store cannot be opened or reports an error right after opening.
    pub fn acquire_handle(&mut self) -> Result<HandleId> {
        let store = self.opener.open(self.claim.path()).map_err(|e| {
            Error::io(format!(
                "error while opening file \"{}\": {e}",
                self.claim.path().display()
            ))
        })?;
        store.status().map_err(|e| {
            Error::io(format!(
                "error while opening file \"{}\": {e}",
                self.claim.path().display()
            ))
        })?;
        let id = HandleId(self.next_handle);
        self.next_handle += 1;
        self.handles.insert(id, store);
        Ok(id)
    }

    /// Flush and unregister a handle.
    ///
    /// When the flush fails the handle stays registered and alive so the pending data is not
    /// lost; retry the release, or let `save` report the failure.
    ///
    /// # Errors
    ///
    /// `Logic` if `id` is not registered; `Io` if the flush fails.
    pub fn release_handle(&mut self, id: HandleId) -> Result<()> {
        let store = self
            .handles
            .get_mut(&id)
            .ok_or_else(|| Error::logic(format!("{id} is not registered with this file")))?;
        match store.flush() {
            Ok(()) => {
                self.handles.remove(&id);
                Ok(())
            }
            Err(e) => {
                let err = Error::io(format!(
                    "error while writing to file \"{}\": {e}",
                    self.claim.path().display()
                ));
                self.audit.log(
                    Level::Warn,
                    &format!("{id} kept open after failed flush: {}", err.msg),
                );
                let tctx = self.audit_ctx();
                StageLogger::new(&tctx)
                    .stage(Stage::Release)
                    .field("handle", json!(id.get()))
                    .error(&err)
                    .emit_failure();
                Err(err)
            }
        }
    }

    /// Borrow a registered store.
    ///
    /// # Errors
    ///
    /// `Logic` if `id` is not registered.
    pub fn store(&self, id: HandleId) -> Result<&dyn KeyValueStore> {
        match self.handles.get(&id) {
            Some(s) => Ok(s.as_ref()),
            None => Err(Error::logic(format!("{id} is not registered with this file"))),
        }
    }

    /// Mutably borrow a registered store.
    ///
    /// # Errors
    ///
    /// `Logic` if `id` is not registered.
    pub fn store_mut(&mut self, id: HandleId) -> Result<&mut dyn KeyValueStore> {
        match self.handles.get_mut(&id) {
            Some(s) => Ok(s.as_mut()),
            None => Err(Error::logic(format!("{id} is not registered with this file"))),
        }
    }

    #[must_use]
    pub fn open_handle_count(&self) -> usize {
        self.handles.len()
    }

    /// Registered handles in acquisition order.
    #[must_use]
    pub fn handle_ids(&self) -> Vec<HandleId> {
        self.handles.keys().copied().collect()
    }

    /// Write `version` into the working copy under `meta.file_version`.
    ///
    /// The cached version changes only once the write reached the working copy.
    ///
    /// # Errors
    ///
    /// `Logic` on a read-only file; `Io` if the transient handle cannot be acquired or flushed.
    pub fn set_version(&mut self, version: i32) -> Result<()> {
        self.ensure_writable("change the version of")?;
        let id = self.acquire_handle()?;
        self.store_mut(id)?.set(META_VERSION_KEY, &version.to_string());
        self.release_handle(id)?;
        self.file_version = version;

        let tctx = self.audit_ctx();
        StageLogger::new(&tctx)
            .stage(Stage::SetVersion)
            .field("file_version", json!(version))
            .emit_success();
        Ok(())
    }
}
