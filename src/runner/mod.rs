//! Migration execution engine.
//!
//! The scheduler: given a target state, the catalog, and the version store,
//! it computes which migration units to apply or revert, validates their
//! operations, executes them through a [`Processor`], and keeps the version
//! store in step, one unit at a time, in version order.
//!
//! Failure containment is per unit: a failing transactional unit rolls back
//! only itself; previously committed units stay applied. There is no
//! cross-unit atomicity, and a failing non-transactional unit can leave the
//! database partially changed; that risk is accepted, not recovered.


use log::{debug, info, warn};
use thiserror::Error;

use crate::migration::{MigrationCatalog, TransactionBehavior};
use crate::operation::Operation;
use crate::processor::Processor;
use crate::store::VersionStore;
use crate::version::Version;

#[derive(Debug, Error)]
pub enum MigrateError {
    /// Operation validation failed; nothing was executed for this unit.
    #[error("migration {version} failed validation: {}", errors.join("; "))]
    Validation {
        version: Version,
        errors: Vec<String>,
    },

    /// The processor failed while executing this unit.
    #[error("migration {version} failed during execution")]
    Execution {
        version: Version,
        #[source]
        source: anyhow::Error,
    },

    /// The version store could not be updated for this unit.
    #[error("version store update failed for migration {version}")]
    Store {
        version: Version,
        #[source]
        source: anyhow::Error,
    },

    /// Dropping the emptied version store failed.
    #[error("failed to drop the version store")]
    DropStore {
        #[source]
        source: anyhow::Error,
    },

    /// Unapplied versions exist below the latest applied version: a
    /// migration was inserted "in the past".
    #[error("unapplied migrations {invalid:?} precede the latest applied version {latest}")]
    Ordering {
        latest: Version,
        invalid: Vec<Version>,
    },

    /// The store reports a version applied that the catalog does not know.
    #[error("version {version} is recorded as applied but missing from the catalog")]
    UnknownVersion { version: Version },
}

/// Run configuration for the engine.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Stop at the first failing unit (the default). When cleared, failures
    /// are collected in the [`RunReport`] and the run continues.
    pub abort_on_error: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            abort_on_error: true,
        }
    }
}

/// A failure collected while running with `abort_on_error` off.
#[derive(Debug)]
pub struct UnitFailure {
    pub version: Version,
    pub error: MigrateError,
}

/// What a run did: versions applied, versions reverted, and any failures
/// collected in continue-on-failure mode.
#[derive(Debug, Default)]
pub struct RunReport {
    pub applied: Vec<Version>,
    pub reverted: Vec<Version>,
    pub failures: Vec<UnitFailure>,
}

enum Direction {
    Up,
    Down,
}

/// The migration runner.
///
/// Borrows the store and processor exclusively for its lifetime; a run is
/// single-threaded and synchronous.
pub struct Runner<'a> {
    catalog: &'a MigrationCatalog,
    store: &'a mut dyn VersionStore,
    processor: &'a mut dyn Processor,
    options: RunnerOptions,
}

impl<'a> Runner<'a> {
    pub fn new(
        catalog: &'a MigrationCatalog,
        store: &'a mut dyn VersionStore,
        processor: &'a mut dyn Processor,
    ) -> Self {
        Self::with_options(catalog, store, processor, RunnerOptions::default())
    }

    pub fn with_options(
        catalog: &'a MigrationCatalog,
        store: &'a mut dyn VersionStore,
        processor: &'a mut dyn Processor,
        options: RunnerOptions,
    ) -> Self {
        Self {
            catalog,
            store,
            processor,
            options,
        }
    }

    /// Apply every unapplied migration, ascending.
    pub fn migrate_to_latest(&mut self) -> Result<RunReport, MigrateError> {
        self.run_up(None)
    }

    /// Apply every unapplied migration with version ≤ `target`, ascending.
    pub fn migrate_up_to(&mut self, target: Version) -> Result<RunReport, MigrateError> {
        self.run_up(Some(target))
    }

    /// Revert every applied migration with version > `target`, descending.
    pub fn migrate_down_to(&mut self, target: Version) -> Result<RunReport, MigrateError> {
        let plan = self.plan_down(target)?;
        self.run_down(plan, false)
    }

    /// Revert up to `steps` applied migrations, newest first. Drops the
    /// version store if nothing remains applied afterwards.
    pub fn rollback_steps(&mut self, steps: usize) -> Result<RunReport, MigrateError> {
        let plan: Vec<Version> = self
            .catalog
            .versions()
            .into_iter()
            .rev()
            .filter(|&version| self.store.has_applied(version))
            .take(steps)
            .collect();
        self.run_down(plan, true)
    }

    /// Revert every applied migration with version > `target`. With
    /// `target == 0`, drops the version store once nothing remains applied.
    pub fn rollback_to_version(&mut self, target: Version) -> Result<RunReport, MigrateError> {
        let plan = self.plan_down(target)?;
        self.run_down(plan, target == 0)
    }

    /// Fail if any unapplied version is older than the latest applied one.
    pub fn validate_version_order(&self) -> Result<(), MigrateError> {
        let latest = self.store.latest();
        let invalid: Vec<Version> = self
            .catalog
            .versions()
            .into_iter()
            .filter(|&version| version < latest && !self.store.has_applied(version))
            .collect();
        if invalid.is_empty() {
            Ok(())
        } else {
            Err(MigrateError::Ordering { latest, invalid })
        }
    }

    fn run_up(&mut self, target: Option<Version>) -> Result<RunReport, MigrateError> {
        let plan: Vec<Version> = self
            .catalog
            .versions()
            .into_iter()
            .filter(|&version| target.is_none_or(|t| version <= t))
            .filter(|&version| !self.store.has_applied(version))
            .collect();

        let mut report = RunReport::default();
        for version in plan {
            match self.apply_up(version) {
                Ok(()) => report.applied.push(version),
                Err(error) => self.collect_failure(&mut report, version, error)?,
            }
        }
        Ok(report)
    }

    fn run_down(
        &mut self,
        plan: Vec<Version>,
        drop_when_empty: bool,
    ) -> Result<RunReport, MigrateError> {
        let mut report = RunReport::default();
        for version in plan {
            match self.apply_down(version) {
                Ok(()) => report.reverted.push(version),
                Err(error) => self.collect_failure(&mut report, version, error)?,
            }
        }

        if drop_when_empty && self.store.applied_migrations().is_empty() {
            info!("no migrations remain applied, dropping the version store");
            self.store
                .drop_store()
                .map_err(|source| MigrateError::DropStore { source })?;
        }
        Ok(report)
    }

    /// Descending plan of applied versions above `target`. An applied
    /// version the catalog does not contain cannot be reverted and fails
    /// the whole plan.
    fn plan_down(&self, target: Version) -> Result<Vec<Version>, MigrateError> {
        for version in self.store.applied_migrations() {
            if version > target && !self.catalog.contains(version) {
                return Err(MigrateError::UnknownVersion { version });
            }
        }
        Ok(self
            .catalog
            .versions()
            .into_iter()
            .rev()
            .filter(|&version| version > target && self.store.has_applied(version))
            .collect())
    }

    /// Apply one unit. No-op when the version is already applied.
    fn apply_up(&mut self, version: Version) -> Result<(), MigrateError> {
        if self.store.has_applied(version) {
            return Ok(());
        }
        let migration = self
            .catalog
            .get(version)
            .ok_or(MigrateError::UnknownVersion { version })?;
        info!("applying migration {} '{}'", version, migration.name());
        let operations = prepare_operations(migration.up(), version)?;
        let transactional = migration.transaction_behavior() == TransactionBehavior::Default;
        self.execute_unit(version, &operations, transactional, Direction::Up)
    }

    /// Revert one unit. No-op when the version is not applied.
    fn apply_down(&mut self, version: Version) -> Result<(), MigrateError> {
        if !self.store.has_applied(version) {
            return Ok(());
        }
        let migration = self
            .catalog
            .get(version)
            .ok_or(MigrateError::UnknownVersion { version })?;
        info!("reverting migration {} '{}'", version, migration.name());
        let operations = prepare_operations(migration.down(), version)?;
        let transactional = migration.transaction_behavior() == TransactionBehavior::Default;
        self.execute_unit(version, &operations, transactional, Direction::Down)
    }

    /// Execute prepared operations, update the store, commit. On any
    /// failure: roll back (if transactional) and propagate; the store is
    /// left untouched by this unit.
    fn execute_unit(
        &mut self,
        version: Version,
        operations: &[Box<dyn Operation>],
        transactional: bool,
        direction: Direction,
    ) -> Result<(), MigrateError> {
        if transactional {
            self.processor
                .begin_transaction()
                .map_err(|source| MigrateError::Execution { version, source })?;
        }

        for operation in operations {
            debug!("executing {}", operation.describe());
            if let Err(source) = self.processor.execute(operation.as_ref()) {
                self.abort_unit(version, transactional);
                return Err(MigrateError::Execution { version, source });
            }
        }

        let recorded = match direction {
            Direction::Up => self.store.record_applied(version),
            Direction::Down => self.store.record_removed(version),
        };
        if let Err(source) = recorded {
            self.abort_unit(version, transactional);
            return Err(MigrateError::Store { version, source });
        }

        if transactional {
            self.processor
                .commit_transaction()
                .map_err(|source| MigrateError::Execution { version, source })?;
        }
        Ok(())
    }

    fn abort_unit(&mut self, version: Version, transactional: bool) {
        if transactional {
            warn!("rolling back migration {version}");
            if let Err(error) = self.processor.rollback_transaction() {
                warn!("rollback of migration {version} itself failed: {error:#}");
            }
        }
    }

    fn collect_failure(
        &self,
        report: &mut RunReport,
        version: Version,
        error: MigrateError,
    ) -> Result<(), MigrateError> {
        if self.options.abort_on_error {
            return Err(error);
        }
        warn!("migration {version} failed, continuing: {error}");
        report.failures.push(UnitFailure { version, error });
        Ok(())
    }
}

/// Run `apply_defaults` and `validate` over every operation, aggregating
/// all errors. A unit with any invalid operation fails before the first
/// processor call.
fn prepare_operations(
    mut operations: Vec<Box<dyn Operation>>,
    version: Version,
) -> Result<Vec<Box<dyn Operation>>, MigrateError> {
    let mut errors = Vec::new();
    for operation in &mut operations {
        operation.apply_defaults();
        errors.extend(operation.validate());
    }
    if errors.is_empty() {
        Ok(operations)
    } else {
        Err(MigrateError::Validation { version, errors })
    }
}
