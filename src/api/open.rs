use std::collections::BTreeMap;
use std::path::Path;

use log::Level;
use serde_json::json;

use crate::adapters::{FileLockManager, KeyValueStore, LockGuard, LockManager};
use crate::constants::{META_VERSION_KEY, VERSION_UNKNOWN};
use crate::fs::{
    backup_path_for, is_existing_file, lock_path_for, mkpath, remove_file_if_exists, stage,
    temp_path_for, StageGuard, WorkingCopyClaim,
};
use crate::logging::audit::{AuditCtx, StageLogger};
use crate::logging::now_iso;
use crate::policy::{LockingPolicy, Staging};
use crate::types::{Error, HandleId, Result};

use super::builder::ConfigFileBuilder;
use super::ConfigFile;

/// Everything `open` sets up before the instance exists.
struct Staged {
    claim: WorkingCopyClaim,
    lock: Option<Box<dyn LockGuard>>,
    version: i32,
    /// Transient store whose flush failed; kept alive as a registered handle.
    retained: Option<Box<dyn KeyValueStore>>,
}

fn parse_version(raw: Option<String>) -> i32 {
    raw.and_then(|s| s.trim().parse::<i32>().ok())
        .unwrap_or(VERSION_UNKNOWN)
}

fn acquire_lock(
    policy: LockingPolicy,
    original: &Path,
    staging: &Staging,
) -> Result<Option<Box<dyn LockGuard>>> {
    match policy {
        LockingPolicy::None => Ok(None),
        LockingPolicy::Advisory { timeout_ms } => {
            let mgr = FileLockManager::new(lock_path_for(original, staging));
            mgr.acquire_process_lock(timeout_ms).map(Some)
        }
    }
}

pub(super) fn open(
    b: ConfigFileBuilder,
    path: &Path,
    restore_from_backup: bool,
    read_only: bool,
) -> Result<ConfigFile> {
    open_claimed(b, path, restore_from_backup, read_only, None)
}

/// `open`, reusing `claimed` when it already covers the working copy the source maps to.
fn open_claimed(
    b: ConfigFileBuilder,
    path: &Path,
    restore_from_backup: bool,
    read_only: bool,
    claimed: Option<WorkingCopyClaim>,
) -> Result<ConfigFile> {
    let tctx = AuditCtx::new(b.facts.as_ref(), path.display().to_string(), now_iso());
    let slog = StageLogger::new(&tctx);

    let original = path.to_path_buf();
    let backup = backup_path_for(&original);
    let restored = restore_from_backup && is_existing_file(&backup);
    let source = if restored { backup.clone() } else { original.clone() };

    let staged = (|| -> Result<Staged> {
        if !is_existing_file(&source) {
            return Err(Error::not_found(&source));
        }
        let staging = &b.policy.staging;
        let temp = temp_path_for(&source, staging);
        let claim = match claimed {
            Some(c) if c.path() == temp => c,
            _ => WorkingCopyClaim::acquire(&temp)?,
        };
        if let Some(dir) = temp.parent() {
            mkpath(dir).map_err(|e| Error::io_at("could not create directory", dir, &e))?;
        }
        // Lock before staging so a live session's working copy is never clobbered.
        let lock = acquire_lock(b.policy.locking, &original, staging)?;
        stage(&source, &temp)?;
        let guard = StageGuard::new(temp.clone());

        // Transient store: only reads the version, but still flushed because opening may have
        // normalized the file.
        let mut store = b.opener.open(&temp)?;
        store.status()?;
        let version = parse_version(store.get(META_VERSION_KEY));
        let retained = match store.flush() {
            Ok(()) => None,
            Err(e) => {
                b.audit.log(
                    Level::Warn,
                    &format!("could not flush \"{}\" after reading its version: {e}", temp.display()),
                );
                Some(store)
            }
        };
        guard.keep();
        Ok(Staged { claim, lock, version, retained })
    })();

    let Staged { claim, lock, version, retained } = match staged {
        Ok(v) => v,
        Err(e) => {
            slog.open()
                .field("source", json!(source.display().to_string()))
                .field("read_only", json!(read_only))
                .error(&e)
                .emit_failure();
            return Err(e);
        }
    };

    let mut handles: BTreeMap<HandleId, Box<dyn KeyValueStore>> = BTreeMap::new();
    let mut next_handle = 0;
    if let Some(store) = retained {
        handles.insert(HandleId(next_handle), store);
        next_handle += 1;
    }

    let mut ev = slog
        .open()
        .field("source", json!(source.display().to_string()))
        .field("restored_from_backup", json!(restored))
        .field("read_only", json!(read_only))
        .field("file_version", json!(version))
        .field("temp_path", json!(claim.path().display().to_string()));
    if let Some(held) = &lock {
        let waited = u64::try_from(held.waited().as_millis()).unwrap_or(u64::MAX);
        ev = ev.field("lock_wait_ms", json!(waited));
    }
    ev.emit_success();
    drop(slog);
    drop(tctx);

    Ok(ConfigFile {
        original_path: original,
        backup_path: backup,
        read_only,
        file_version: version,
        handles,
        next_handle,
        policy: b.policy,
        opener: b.opener,
        facts: b.facts,
        audit: b.audit,
        lock,
        claim,
    })
}

pub(super) fn create(b: ConfigFileBuilder, path: &Path, initial_version: i32) -> Result<ConfigFile> {
    let prepared = (|| -> Result<WorkingCopyClaim> {
        // The placeholder below makes `open` stage from the backup; claim that working copy
        // before touching any file so a live session on `path` is left alone.
        let backup = backup_path_for(path);
        let claim = WorkingCopyClaim::acquire(&temp_path_for(&backup, &b.policy.staging))?;
        remove_file_if_exists(path).map_err(|e| Error::io_at("cannot remove file", path, &e))?;
        if let Some(dir) = path.parent() {
            mkpath(dir).map_err(|e| Error::io_at("cannot create directory", dir, &e))?;
        }
        std::fs::File::create(&backup).map_err(|e| Error::io_at("cannot create file", &backup, &e))?;
        Ok(claim)
    })();
    let claim = match prepared {
        Ok(c) => c,
        Err(e) => {
            let tctx = AuditCtx::new(b.facts.as_ref(), path.display().to_string(), now_iso());
            StageLogger::new(&tctx).create().error(&e).emit_failure();
            return Err(e);
        }
    };

    let mut obj = open_claimed(b, path, true, false, Some(claim))?;
    if initial_version > VERSION_UNKNOWN {
        // On error `obj` is dropped here, which removes the working copy and the placeholder.
        obj.set_version(initial_version)?;
        obj.save(false)?;
    }
    let tctx = obj.audit_ctx();
    StageLogger::new(&tctx)
        .create()
        .field("file_version", json!(initial_version))
        .emit_success();
    drop(tctx);
    Ok(obj)
}
