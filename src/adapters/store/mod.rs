//! Key/value store seam.
//!
//! A store is an in-memory document bound to one file. `ConfigFile` only ever binds stores to its
//! private working copy; the file format itself is the store's business.
use std::path::Path;

use thiserror::Error;

use crate::types::errors::{Error, ErrorKind};

pub mod toml;

pub use self::toml::{TomlStore, TomlStoreOpener};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("format error in {path}: {msg}")]
    Format { path: String, msg: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Error {
            kind: ErrorKind::Io,
            msg: e.to_string(),
        }
    }
}

pub trait KeyValueStore: Send {
    /// File this store is bound to.
    fn path(&self) -> &Path;

    /// Value under a dotted hierarchical key (`section.key`).
    fn get(&self, key: &str) -> Option<String>;

    /// Set a value in memory; it reaches disk on the next `flush`.
    fn set(&mut self, key: &str, value: &str);

    /// Write pending changes to the bound file and pick up changes other stores wrote there.
    /// # Errors
    /// Returns an error if the file cannot be read back or written, or the store is in error state.
    fn flush(&mut self) -> StoreResult<()>;

    /// Health of the store; checked right after opening to detect malformed files.
    /// # Errors
    /// Returns the error that put the store into a failed state.
    fn status(&self) -> StoreResult<()>;
}

pub trait StoreOpener: Send + Sync {
    /// Open a store bound to `path`. A missing file yields an empty document.
    /// # Errors
    /// Returns an error if the file exists but cannot be read.
    fn open(&self, path: &Path) -> StoreResult<Box<dyn KeyValueStore>>;
}
