use std::path::PathBuf;

use super::types::{LockingPolicy, SaveFlow, SaveStrategy, Staging};

/// Policy governs staging location, save behavior and cross-process locking for a `ConfigFile`.
///
/// Grouped fields provide clearer ownership and ergonomics.
#[derive(Clone, Debug, Default)]
pub struct Policy {
    pub staging: Staging,
    pub save: SaveFlow,
    pub locking: LockingPolicy,
}

impl Policy {
    /// Construct a Policy that reproduces the historical on-disk behavior exactly:
    /// - `save.strategy = RemoveThenCopy`
    /// - `save.fsync = false`
    /// - `locking = None`
    #[must_use]
    pub fn legacy_preset() -> Self {
        let mut p = Self::default();
        p.save.strategy = SaveStrategy::RemoveThenCopy;
        p.save.fsync = false;
        p.locking = LockingPolicy::None;
        p
    }

    /// Construct a Policy with every hardening knob on:
    /// - `save.strategy = AtomicRename` with fsync
    /// - `locking = Advisory` with the default timeout
    ///
    /// # Example
    /// ```rust
    /// use cfgkeeper::policy::Policy;
    /// let mut policy = Policy::hardened_preset();
    /// policy.staging.app_dir = "my-app".to_string();
    /// # let _ = policy;
    /// ```
    #[must_use]
    pub fn hardened_preset() -> Self {
        let mut p = Self::default();
        p.save.strategy = SaveStrategy::AtomicRename;
        p.save.fsync = true;
        p.locking = LockingPolicy::advisory();
        p
    }

    /// Stage working copies under `root` instead of the OS temp directory.
    #[must_use]
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.staging.temp_root = root.into();
        self
    }
}
