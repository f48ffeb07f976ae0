//! Atomic file replace primitives and helpers.
//!
//! This module implements a TOCTOU-safe sequence using directory handles:
//! `open_dir_nofollow(parent) -> openat(tmp, O_CREAT|O_EXCL) -> copy -> fsync(tmp) -> renameat(tmp, final) -> fsync(dirfd)`.
//!
//! Readers of the target observe either the previous bytes or the new bytes, never a partial file
//! and never an absent file.
use std::ffi::CString;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt as _;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::constants::TMP_SUFFIX;
use rustix::fd::OwnedFd;
use rustix::fs::{fchmod, openat, renameat, unlinkat, AtFlags, Mode, OFlags, CWD};
use rustix::io::Errno;

fn errno_to_io(e: Errno) -> std::io::Error {
    std::io::Error::from_raw_os_error(e.raw_os_error())
}

fn cstring(bytes: &[u8]) -> std::io::Result<CString> {
    CString::new(bytes)
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid cstring"))
}

// Global counter to produce unique temporary names within a process.
static NEXT_TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Open a directory with `O_DIRECTORY` | `O_NOFOLLOW` for atomic operations.
///
/// # Errors
///
/// Returns an IO error if the directory cannot be opened.
pub fn open_dir_nofollow(dir: &Path) -> std::io::Result<OwnedFd> {
    let c = cstring(dir.as_os_str().as_bytes())?;
    openat(
        CWD,
        c.as_c_str(),
        OFlags::RDONLY | OFlags::DIRECTORY | OFlags::CLOEXEC | OFlags::NOFOLLOW,
        Mode::empty(),
    )
    .map_err(errno_to_io)
}

/// Fsync the parent directory of `path` for durability.
///
/// # Errors
///
/// Returns an IO error if the parent directory cannot be opened or fsynced.
pub fn fsync_parent_dir(path: &Path) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::File::open(parent)?.sync_all()
}

/// Replace `target` with the bytes of `source` via a sibling temp file and `renameat`.
///
/// The temp file is created with `O_EXCL` next to the target so the rename never crosses a
/// filesystem boundary. On any failure the temp file is unlinked and `target` is left untouched.
///
/// # Errors
///
/// Returns an IO error if the parent cannot be opened, the temp file cannot be written, or the
/// rename fails.
pub fn atomic_replace_from(source: &Path, target: &Path, fsync: bool) -> std::io::Result<()> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let fname_os = target.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "target has no file name")
    })?;
    let pid = std::process::id();
    let ctr = NEXT_TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut tmp_name = Vec::with_capacity(fname_os.len() + 32);
    tmp_name.push(b'.');
    tmp_name.extend_from_slice(fname_os.as_bytes());
    tmp_name.extend_from_slice(format!(".{pid}.{ctr}{TMP_SUFFIX}").as_bytes());
    let tmp_c = cstring(&tmp_name)?;
    let new_c = cstring(fname_os.as_bytes())?;

    let mut src = fs::File::open(source)?;
    // Keep the permissions of the file being replaced.
    let prior_mode = fs::metadata(target)
        .ok()
        .filter(fs::Metadata::is_file)
        .map(|m| m.permissions().mode());
    let dirfd = open_dir_nofollow(parent)?;
    let tmpfd = openat(
        &dirfd,
        tmp_c.as_c_str(),
        OFlags::WRONLY | OFlags::CREATE | OFlags::EXCL | OFlags::CLOEXEC,
        Mode::from_bits_truncate(0o644),
    )
    .map_err(errno_to_io)?;

    let staged = (|| -> std::io::Result<()> {
        let mut dst = fs::File::from(tmpfd);
        if let Some(mode) = prior_mode {
            fchmod(&dst, Mode::from_bits_truncate(mode)).map_err(errno_to_io)?;
        }
        std::io::copy(&mut src, &mut dst)?;
        if fsync {
            dst.sync_all()?;
        }
        renameat(&dirfd, tmp_c.as_c_str(), &dirfd, new_c.as_c_str()).map_err(errno_to_io)
    })();

    if let Err(e) = staged {
        // Best-effort: do not leave the staging file behind.
        let _ = unlinkat(&dirfd, tmp_c.as_c_str(), AtFlags::empty());
        return Err(e);
    }
    if fsync {
        let _ = rustix::fs::fsync(&dirfd);
    }
    Ok(())
}
