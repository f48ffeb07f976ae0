pub mod atomic;
pub mod meta;
pub mod paths;
pub mod staging;

pub use atomic::{atomic_replace_from, fsync_parent_dir, open_dir_nofollow};
pub use meta::{path_digest_b64url, sha256_hex_of};
pub use paths::{absolutize, backup_path_for, is_existing_file, mkpath, remove_file_if_exists};
pub use staging::{discard, lock_path_for, stage, temp_path_for, StageGuard, WorkingCopyClaim};
