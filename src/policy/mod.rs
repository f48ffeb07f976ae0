//! Policy configuration for staging, saving and locking.
//!
//! The `policy` module centralizes the knobs that decide where working copies live, how a save
//! replaces its target, and whether sessions coordinate across processes. Consumers typically
//! construct a [`Policy`](crate::policy::Policy) via `Policy::default()` or a preset
//! (`legacy_preset`, `hardened_preset`) and then pass it to
//! [`ConfigFile::builder`](crate::ConfigFile::builder).
//!
//! Submodules:
//! - `config`: policy struct and presets
//! - `types`: grouped sub-structs and enums

pub mod config;
pub mod types;

pub use config::Policy;
pub use types::{LockingPolicy, SaveFlow, SaveStrategy, Staging};
