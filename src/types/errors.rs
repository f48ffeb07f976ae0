//! Error types used across cfgkeeper.
use std::path::Path;

use thiserror::Error;

/// High-level error categories surfaced by every public operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// The expected source file is absent.
    #[error("not found")]
    NotFound,
    /// A copy, remove, create, flush or mkpath step failed, or a post-condition check did not hold.
    #[error("io error")]
    Io,
    /// The operation is forbidden (read-only instance) or the API was misused.
    #[error("logic error")]
    Logic,
}

/// Structured error with a kind and human message.
#[derive(Debug, Error)]
#[error("{kind:?}: {msg}")]
pub struct Error {
    pub kind: ErrorKind,
    pub msg: String,
}

impl Error {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            msg: msg.into(),
        }
    }

    pub fn not_found(path: &Path) -> Self {
        Self::new(
            ErrorKind::NotFound,
            format!("the file \"{}\" does not exist", path.display()),
        )
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, msg)
    }

    pub fn logic(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Logic, msg)
    }

    /// Wrap an OS error with the action and path it happened on.
    pub fn io_at(action: &str, path: &Path, e: &std::io::Error) -> Self {
        Self::io(format!("{action} \"{}\": {e}", path.display()))
    }
}

/// Convenient alias for results returning a `types::Error`.
pub type Result<T> = std::result::Result<T, Error>;
