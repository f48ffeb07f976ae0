//! Shared crate-wide constants for cfgkeeper.
//!
//! Centralizes magic values used across modules.
//! Adjusting these here will propagate through the crate.

/// Suffix appended to the original path to form the sibling backup, e.g. `settings.ini~`.
pub const BACKUP_SUFFIX: &str = "~";

/// Directory created under the temp root that holds all staged working copies.
pub const DEFAULT_APP_DIR: &str = "cfgkeeper";

/// Hierarchical key holding the file format version as a decimal string.
pub const META_VERSION_KEY: &str = "meta.file_version";

/// Sentinel for "no version recorded".
pub const VERSION_UNKNOWN: i32 = -1;

/// Temporary filename suffix used when staging an atomic replace within the target directory.
/// The temporary name is constructed as `.{fname}.{pid}.{ctr}{TMP_SUFFIX}`.
pub const TMP_SUFFIX: &str = ".cfgkeeper.tmp";

/// Suffix of the advisory lock file kept in the staging directory, named after the original path.
/// Lock files are left in place after release.
pub const LOCK_SUFFIX: &str = ".lock";

/// Poll interval in milliseconds for the file-backed lock manager (see `adapters/lock/file.rs`).
pub const LOCK_POLL_MS: u64 = 25;

/// Default lock timeout used by `LockingPolicy::advisory()`.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 2_000;

/// Subsystem label attached to every emitted fact.
pub const SUBSYSTEM: &str = "cfgkeeper";
