//! Content hashing helpers used for staging names and save facts.
use std::path::Path;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Compute SHA-256 of a file at `path`, returning a lowercase hex string.
pub fn sha256_hex_of(path: &Path) -> Option<String> {
    let mut f = std::fs::File::open(path).ok()?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut f, &mut hasher).ok()?;
    let out = hasher.finalize();
    Some(hex::encode(out))
}

/// SHA-256 of the raw path bytes, encoded as URL-safe base64 without padding.
///
/// The output is always 43 characters from `[A-Za-z0-9_-]`, so it is a valid file name everywhere.
#[must_use]
pub fn path_digest_b64url(path: &Path) -> String {
    use std::os::unix::ffi::OsStrExt;
    let digest = Sha256::digest(path.as_os_str().as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}
