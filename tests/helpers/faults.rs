// tests/helpers/faults.rs
// Store opener that wraps the TOML store and fails on demand.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cfgkeeper::adapters::{KeyValueStore, StoreError, StoreOpener, StoreResult, TomlStore};

#[derive(Default, Clone)]
pub struct Faults {
    pub fail_open: Arc<AtomicBool>,
    pub fail_flush: Arc<AtomicBool>,
}

impl Faults {
    pub fn set_fail_open(&self, on: bool) { self.fail_open.store(on, Ordering::SeqCst) }
    pub fn set_fail_flush(&self, on: bool) { self.fail_flush.store(on, Ordering::SeqCst) }
    pub fn opener(&self) -> Box<dyn StoreOpener> { Box::new(FaultyOpener { faults: self.clone() }) }
}

pub struct FaultyOpener {
    faults: Faults,
}

struct FaultyStore {
    inner: TomlStore,
    faults: Faults,
}

fn injected(path: &Path, what: &str) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source: std::io::Error::other(format!("injected {what} failure")),
    }
}

impl StoreOpener for FaultyOpener {
    fn open(&self, path: &Path) -> StoreResult<Box<dyn KeyValueStore>> {
        if self.faults.fail_open.load(Ordering::SeqCst) {
            return Err(injected(path, "open"));
        }
        Ok(Box::new(FaultyStore { inner: TomlStore::open(path)?, faults: self.faults.clone() }))
    }
}

impl KeyValueStore for FaultyStore {
    fn path(&self) -> &Path { self.inner.path() }
    fn get(&self, key: &str) -> Option<String> { self.inner.get(key) }
    fn set(&mut self, key: &str, value: &str) { self.inner.set(key, value) }
    fn flush(&mut self) -> StoreResult<()> {
        if self.faults.fail_flush.load(Ordering::SeqCst) {
            return Err(injected(self.inner.path(), "flush"));
        }
        self.inner.flush()
    }
    fn status(&self) -> StoreResult<()> { self.inner.status() }
}
