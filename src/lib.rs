#![forbid(unsafe_code)]
//! cfgkeeper: crash-resilient key/value configuration files.
//!
//! Safety model highlights:
//! - Every session works on a private temp copy (`<temp_root>/<app_dir>/<sha256-b64url>`); the original
//!   and its `~` backup are only touched by an explicit `save`, `remove` or `create`.
//! - `open` prefers the `~` backup when asked to restore, so an interrupted session can be recovered.
//! - `save` replaces the target through a sibling temp file + `renameat` + parent fsync by default.
//! - Store handles are counted per `ConfigFile`; a handle whose flush fails is never dropped silently.
//! - This crate forbids `unsafe` and uses `rustix` for syscalls.

pub mod constants;
pub mod adapters;
pub mod api;
pub mod fs;
pub mod logging;
pub mod policy;
pub mod types;

pub use api::*;
