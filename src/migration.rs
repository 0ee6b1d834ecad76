//! Migration units and the version-ordered catalog.
//!
//! A migration unit is a versioned, reversible pair of operation producers.
//! The catalog is the full ordered mapping from version to unit; it is
//! populated once at startup and never mutated during a run.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::operation::Operation;
use crate::version::Version;

/// Transactional wrapping for one migration unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransactionBehavior {
    /// Wrap the unit's operations in a single transaction.
    #[default]
    Default,
    /// Run the operations without a transaction. A failure can leave the
    /// database partially changed for this unit.
    None,
}

/// A versioned, reversible migration.
pub trait Migration {
    /// The globally unique version ordering this migration.
    fn version(&self) -> Version;

    /// Human-readable name for logs and reports.
    fn name(&self) -> &str;

    fn transaction_behavior(&self) -> TransactionBehavior {
        TransactionBehavior::Default
    }

    /// Free-form labels attached to this migration. Filtering on tags is a
    /// caller concern; the runner ignores them.
    fn tags(&self) -> &[String] {
        &[]
    }

    /// Operations that apply this migration.
    fn up(&self) -> Vec<Box<dyn Operation>>;

    /// Operations that revert this migration.
    fn down(&self) -> Vec<Box<dyn Operation>>;
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate migration version {version}: '{existing}' and '{incoming}'")]
    DuplicateVersion {
        version: Version,
        existing: String,
        incoming: String,
    },
}

/// The ordered mapping from version to migration unit.
#[derive(Default)]
pub struct MigrationCatalog {
    migrations: BTreeMap<Version, Box<dyn Migration>>,
}

impl MigrationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a migration. Versions are unique by construction: inserting a
    /// second migration with an existing version is rejected.
    pub fn insert(&mut self, migration: Box<dyn Migration>) -> Result<(), CatalogError> {
        let version = migration.version();
        if let Some(existing) = self.migrations.get(&version) {
            return Err(CatalogError::DuplicateVersion {
                version,
                existing: existing.name().to_string(),
                incoming: migration.name().to_string(),
            });
        }
        self.migrations.insert(version, migration);
        Ok(())
    }

    pub fn get(&self, version: Version) -> Option<&dyn Migration> {
        self.migrations.get(&version).map(|migration| &**migration)
    }

    pub fn contains(&self, version: Version) -> bool {
        self.migrations.contains_key(&version)
    }

    /// All versions in ascending order.
    pub fn versions(&self) -> Vec<Version> {
        self.migrations.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

impl std::fmt::Debug for MigrationCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationCatalog")
            .field("versions", &self.versions())
            .finish()
    }
}
