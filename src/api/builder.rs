use std::path::Path;

use crate::adapters::{StoreOpener, TomlStoreOpener};
use crate::logging::{AuditSink, FactsEmitter, LogSink};
use crate::policy::Policy;
use crate::types::errors::Result;

use super::ConfigFile;

/// Builder for opening or creating a `ConfigFile` with non-default collaborators.
/// `ConfigFile::open` / `ConfigFile::create` are shorthands for `ConfigFile::builder().open(..)`.
pub struct ConfigFileBuilder {
    pub(super) policy: Policy,
    pub(super) opener: Box<dyn StoreOpener>,
    pub(super) facts: Box<dyn FactsEmitter>,
    pub(super) audit: Box<dyn AuditSink>,
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self {
            policy: Policy::default(),
            opener: Box::new(TomlStoreOpener),
            facts: Box::new(LogSink),
            audit: Box::new(LogSink),
        }
    }
}

impl ConfigFileBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_store_opener(mut self, opener: Box<dyn StoreOpener>) -> Self {
        self.opener = opener;
        self
    }

    #[must_use]
    pub fn with_facts(mut self, facts: Box<dyn FactsEmitter>) -> Self {
        self.facts = facts;
        self
    }

    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// See [`ConfigFile::open`].
    ///
    /// # Errors
    ///
    /// `NotFound` if neither the chosen source exists; `Io` if staging fails.
    pub fn open(
        self,
        path: impl AsRef<Path>,
        restore_from_backup: bool,
        read_only: bool,
    ) -> Result<ConfigFile> {
        super::open::open(self, path.as_ref(), restore_from_backup, read_only)
    }

    /// See [`ConfigFile::create`].
    ///
    /// # Errors
    ///
    /// `Io` if the destination cannot be prepared or the initial version cannot be written.
    pub fn create(self, path: impl AsRef<Path>, initial_version: i32) -> Result<ConfigFile> {
        super::open::create(self, path.as_ref(), initial_version)
    }
}
