use std::path::PathBuf;

use crate::constants::{DEFAULT_APP_DIR, DEFAULT_LOCK_TIMEOUT_MS};

/// How `save` puts the staged bytes in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveStrategy {
    /// Copy into a sibling temp file, fsync, then `renameat` over the target.
    AtomicRename,
    /// Remove the target, then copy the working copy onto it. A crash in between leaves no target.
    RemoveThenCopy,
}

impl Default for SaveStrategy {
    fn default() -> Self { SaveStrategy::AtomicRename }
}

/// Cross-process coordination for sessions that stage the same source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockingPolicy {
    None,
    /// Hold an exclusive `fs2` lock on `<temp>.lock` for the lifetime of the `ConfigFile`.
    Advisory { timeout_ms: u64 },
}

impl Default for LockingPolicy {
    fn default() -> Self { LockingPolicy::None }
}

impl LockingPolicy {
    #[must_use]
    pub const fn advisory() -> Self {
        LockingPolicy::Advisory { timeout_ms: DEFAULT_LOCK_TIMEOUT_MS }
    }
}

/// Where working copies are staged.
#[derive(Clone, Debug)]
pub struct Staging {
    /// Process-wide temp root; defaults to `std::env::temp_dir()`.
    pub temp_root: PathBuf,
    /// Directory under `temp_root` that holds the hashed working copies.
    pub app_dir: String,
}

impl Default for Staging {
    fn default() -> Self {
        Self { temp_root: std::env::temp_dir(), app_dir: DEFAULT_APP_DIR.to_string() }
    }
}

impl Staging {
    /// Directory that holds the staged working copies.
    #[must_use]
    pub fn dir(&self) -> PathBuf {
        self.temp_root.join(&self.app_dir)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SaveFlow {
    pub strategy: SaveStrategy,
    /// Fsync the written target and its parent directory.
    pub fsync: bool,
}

impl Default for SaveFlow {
    fn default() -> Self {
        Self { strategy: SaveStrategy::AtomicRename, fsync: true }
    }
}
