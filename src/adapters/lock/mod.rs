use std::time::Duration;

use crate::types::errors::Result;

pub mod file;

pub use file::FileLockManager;

/// A held lock; dropping it releases the lock.
pub trait LockGuard: Send {
    /// Time spent waiting for the lock before it was granted.
    fn waited(&self) -> Duration;
}

pub trait LockManager: Send + Sync {
    /// Acquire an exclusive lock with the specified timeout.
    /// # Errors
    /// Returns an error if the lock cannot be acquired within the timeout period.
    fn acquire_process_lock(&self, timeout_ms: u64) -> Result<Box<dyn LockGuard>>;
}
