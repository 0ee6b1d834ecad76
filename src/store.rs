//! Version store: the persisted record of applied migration versions.
//!
//! The backing storage (one row per applied version) is a processor/driver
//! concern; the runner only sees this trait. The store's table exists iff
//! at least one version has ever been recorded in the current lineage, and
//! it is dropped once the applied set is empty again; the runner calls
//! [`drop_store`](VersionStore::drop_store) at exactly those points.

use crate::version::{Version, VersionInfo};

/// Read/write access to the applied-version record.
///
/// Reads are served from state loaded once per run; mutations are persisted
/// incrementally, one migration at a time. No optimistic concurrency check
/// is performed before a write; concurrent runs against the same database
/// are not synchronized by this crate.
pub trait VersionStore {
    fn has_applied(&self, version: Version) -> bool;

    /// The highest applied version, or `0` if nothing has been applied.
    fn latest(&self) -> Version;

    /// All applied versions in ascending order.
    fn applied_migrations(&self) -> Vec<Version>;

    /// Persist `version` as applied.
    fn record_applied(&mut self, version: Version) -> anyhow::Result<()>;

    /// Remove the record for `version`.
    fn record_removed(&mut self, version: Version) -> anyhow::Result<()>;

    /// Drop the backing storage entirely. Called by the runner once no
    /// version remains applied.
    fn drop_store(&mut self) -> anyhow::Result<()>;
}

/// An in-process version store.
///
/// Backs the runner in tests and dry runs. Tracks whether the backing
/// "table" currently exists so the drop-once-empty invariant is observable.
#[derive(Debug, Clone, Default)]
pub struct MemoryVersionStore {
    info: VersionInfo,
    exists: bool,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the backing storage currently exists.
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn version_info(&self) -> &VersionInfo {
        &self.info
    }
}

impl VersionStore for MemoryVersionStore {
    fn has_applied(&self, version: Version) -> bool {
        self.info.has_applied(version)
    }

    fn latest(&self) -> Version {
        self.info.latest()
    }

    fn applied_migrations(&self) -> Vec<Version> {
        self.info.applied_migrations()
    }

    fn record_applied(&mut self, version: Version) -> anyhow::Result<()> {
        self.exists = true;
        self.info.add(version);
        Ok(())
    }

    fn record_removed(&mut self, version: Version) -> anyhow::Result<()> {
        self.info.remove(version);
        Ok(())
    }

    fn drop_store(&mut self) -> anyhow::Result<()> {
        self.info.clear();
        self.exists = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_exists_only_after_first_record() {
        let mut store = MemoryVersionStore::new();
        assert!(!store.exists());
        store.record_applied(1).expect("record");
        assert!(store.exists());
        assert_eq!(store.latest(), 1);
    }

    #[test]
    fn drop_store_clears_everything() {
        let mut store = MemoryVersionStore::new();
        store.record_applied(1).expect("record");
        store.record_applied(2).expect("record");
        store.record_removed(2).expect("remove");
        assert_eq!(store.applied_migrations(), vec![1]);
        store.drop_store().expect("drop");
        assert!(!store.exists());
        assert_eq!(store.latest(), 0);
        assert!(store.applied_migrations().is_empty());
    }
}
