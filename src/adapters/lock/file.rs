use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use crate::constants::LOCK_POLL_MS;
use crate::types::errors::{Error, Result};
use fs2::FileExt;

use super::{LockGuard, LockManager};

/// `fs2` exclusive lock on a side file named after the configuration's original path.
///
/// The side file is created on first use and never removed: unlinking it while another
/// process waits on the old inode would let two sessions hold "the" lock at once.
#[derive(Debug)]
pub struct FileLockManager {
    lock_path: PathBuf,
}

impl FileLockManager {
    #[must_use]
    pub const fn new(lock_path: PathBuf) -> Self {
        Self { lock_path }
    }
}

struct HeldLock {
    file: File,
    lock_path: PathBuf,
    waited: Duration,
}

impl Drop for HeldLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            log::warn!("could not unlock \"{}\": {e}", self.lock_path.display());
        }
    }
}

impl LockGuard for HeldLock {
    fn waited(&self) -> Duration {
        self.waited
    }
}

impl LockManager for FileLockManager {
    fn acquire_process_lock(&self, timeout_ms: u64) -> Result<Box<dyn LockGuard>> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| Error::io_at("could not open lock file", &self.lock_path, &e))?;
        let deadline = Duration::from_millis(timeout_ms);
        let t0 = Instant::now();
        while file.try_lock_exclusive().is_err() {
            if t0.elapsed() >= deadline {
                return Err(Error::io(format!(
                    "configuration is locked by another session (\"{}\", waited {timeout_ms} ms)",
                    self.lock_path.display()
                )));
            }
            thread::sleep(Duration::from_millis(LOCK_POLL_MS));
        }
        Ok(Box::new(HeldLock {
            file,
            lock_path: self.lock_path.clone(),
            waited: t0.elapsed(),
        }))
    }
}
