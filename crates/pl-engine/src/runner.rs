//! Migration runner: brings a database up to the latest patch level.
//!
//! A run moves through `Idle → LoadingLevel → Discovering → Applying(i)` and
//! ends in `Done` or `Failed`. Patches are applied one at a time in ascending
//! version order. Each patch gets its own connection, and the ledger advances
//! on that connection right after the patch succeeds. The first failure
//! stops the run; earlier patches stay applied.

use crate::dispatcher::PatchDispatcher;
use crate::error::{MigrateError, MigrateResult};
use crate::ledger::VersionLedger;
use crate::task::TaskRegistry;
use pl_core::{discover, DatabaseConfig, Patch, PatchCatalog, PatchKind, PatchName, PatchSource};
use pl_db::{ConnectionProvider, DbHandle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Runner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    LoadingLevel,
    Discovering,
    /// Applying the pending patch at this index
    Applying(usize),
    Done,
    Failed,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::LoadingLevel => write!(f, "loading level"),
            RunState::Discovering => write!(f, "discovering"),
            RunState::Applying(i) => write!(f, "applying #{}", i),
            RunState::Done => write!(f, "done"),
            RunState::Failed => write!(f, "failed"),
        }
    }
}

/// How a successful run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every selected patch was applied
    Done,
    /// Stopped between patches on request
    Cancelled,
    /// Nothing was pending
    UpToDate,
}

/// A patch applied during a run
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedPatch {
    pub version: u64,
    pub name: PatchName,
    pub kind: PatchKind,
    pub duration: Duration,
}

/// Identity of a patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRef {
    pub version: u64,
    pub name: PatchName,
}

impl From<&Patch> for PatchRef {
    fn from(patch: &Patch) -> Self {
        Self {
            version: patch.version,
            name: patch.name.clone(),
        }
    }
}

impl std::fmt::Display for PatchRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (v{})", self.name, self.version)
    }
}

/// Outcome of a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Level read from the ledger before anything ran
    pub starting_level: u64,
    /// Last version successfully recorded in the ledger
    pub final_level: u64,
    pub applied: Vec<AppliedPatch>,
    pub status: RunStatus,
}

impl RunReport {
    fn starting_at(level: u64) -> Self {
        Self {
            starting_level: level,
            final_level: level,
            applied: Vec::new(),
            status: RunStatus::UpToDate,
        }
    }

    /// Total time spent inside patches.
    pub fn total_duration(&self) -> Duration {
        self.applied.iter().map(|p| p.duration).sum()
    }
}

/// A run that stopped on an error.
///
/// `report` covers what was applied before the failure; `failed` names the
/// patch that was being applied, if the run got that far.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct RunFailure {
    pub report: RunReport,
    pub failed: Option<PatchRef>,
    pub error: MigrateError,
}

/// Pending work, computed without touching the database schema.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    pub current_level: u64,
    /// Highest version in the catalog (0 when empty)
    pub latest_version: u64,
    /// Patches a run would apply, in order
    pub pending: Vec<Patch>,
}

impl MigrationPlan {
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Progress callbacks. Every method defaults to doing nothing.
pub trait RunObserver {
    fn on_state(&self, _state: RunState) {}
    fn on_patch_start(&self, _patch: &Patch) {}
    fn on_patch_applied(&self, _applied: &AppliedPatch) {}
    fn on_patch_failed(&self, _patch: &Patch, _error: &MigrateError) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Applies pending patches from a source to one database.
pub struct MigrationRunner {
    provider: Box<dyn ConnectionProvider>,
    database: DatabaseConfig,
    source: Box<dyn PatchSource>,
    ledger: VersionLedger,
    dispatcher: PatchDispatcher,
    observer: Box<dyn RunObserver>,
    target_version: Option<u64>,
    cancel: Arc<AtomicBool>,
}

impl MigrationRunner {
    pub fn new(
        provider: impl ConnectionProvider + 'static,
        database: DatabaseConfig,
        source: impl PatchSource + 'static,
    ) -> Self {
        Self {
            provider: Box::new(provider),
            database,
            source: Box::new(source),
            ledger: VersionLedger::default(),
            dispatcher: PatchDispatcher::default(),
            observer: Box::new(NoopObserver),
            target_version: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_ledger(mut self, ledger: VersionLedger) -> Self {
        self.ledger = ledger;
        self
    }

    /// Use `tasks` for `kind: task` patches.
    pub fn with_tasks(mut self, tasks: TaskRegistry) -> Self {
        self.dispatcher = PatchDispatcher::new(tasks);
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: PatchDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_observer(mut self, observer: impl RunObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Stop after the patch with this version (inclusive).
    pub fn with_target_version(mut self, target: Option<u64>) -> Self {
        self.target_version = target;
        self
    }

    /// Share an externally owned cancellation flag.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    /// Flag that, once set, stops the run before the next patch.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn ledger(&self) -> &VersionLedger {
        &self.ledger
    }

    /// Read the level and list pending patches without applying them.
    pub fn plan(&self) -> MigrateResult<MigrationPlan> {
        let level = {
            let db = self.acquire()?;
            self.ledger.peek_level(db.as_ref())?
        };
        let catalog = discover(self.source.as_ref())?;
        Ok(MigrationPlan {
            current_level: level,
            latest_version: catalog.latest_version(),
            pending: self.select_pending(&catalog, level),
        })
    }

    /// Apply every pending patch.
    pub fn run(&self) -> Result<RunReport, RunFailure> {
        self.enter(RunState::Idle);

        self.enter(RunState::LoadingLevel);
        let level = self
            .load_level()
            .map_err(|error| self.fail(RunReport::starting_at(0), None, error))?;
        let mut report = RunReport::starting_at(level);
        log::debug!("Current patch level is {}", level);

        self.enter(RunState::Discovering);
        let catalog = match discover(self.source.as_ref()) {
            Ok(catalog) => catalog,
            Err(e) => return Err(self.fail(report, None, e.into())),
        };
        let pending = self.select_pending(&catalog, level);
        log::debug!(
            "Discovered {} patches, {} pending",
            catalog.len(),
            pending.len()
        );

        if pending.is_empty() {
            self.enter(RunState::Done);
            return Ok(report);
        }

        for (i, patch) in pending.iter().enumerate() {
            if self.cancel.load(Ordering::SeqCst) {
                log::info!("Run cancelled at level {}", report.final_level);
                report.status = RunStatus::Cancelled;
                self.enter(RunState::Done);
                return Ok(report);
            }

            self.enter(RunState::Applying(i));
            self.observer.on_patch_start(patch);
            let started = Instant::now();

            if let Err(error) = self.apply(patch) {
                self.observer.on_patch_failed(patch, &error);
                return Err(self.fail(report, Some(PatchRef::from(patch)), error));
            }

            let applied = AppliedPatch {
                version: patch.version,
                name: patch.name.clone(),
                kind: patch.kind(),
                duration: started.elapsed(),
            };
            log::info!("Applied {} in {:?}", patch, applied.duration);
            report.final_level = patch.version;
            self.observer.on_patch_applied(&applied);
            report.applied.push(applied);
        }

        report.status = RunStatus::Done;
        self.enter(RunState::Done);
        Ok(report)
    }

    fn load_level(&self) -> MigrateResult<u64> {
        let db = self.acquire()?;
        self.ledger.current_level(db.as_ref())
    }

    fn apply(&self, patch: &Patch) -> MigrateResult<()> {
        let db = self.acquire()?;
        self.dispatcher.execute(patch, db.as_ref())?;
        self.ledger.advance_to(db.as_ref(), patch.version)
    }

    fn acquire(&self) -> MigrateResult<DbHandle> {
        self.provider
            .acquire(&self.database)
            .map_err(|e| MigrateError::from_acquire(self.database.display_location(), e))
    }

    fn select_pending(&self, catalog: &PatchCatalog, level: u64) -> Vec<Patch> {
        catalog
            .pending(level)
            .filter(|p| self.target_version.map_or(true, |target| p.version <= target))
            .cloned()
            .collect()
    }

    fn enter(&self, state: RunState) {
        log::debug!("Runner state: {}", state);
        self.observer.on_state(state);
    }

    fn fail(&self, report: RunReport, failed: Option<PatchRef>, error: MigrateError) -> RunFailure {
        self.enter(RunState::Failed);
        RunFailure {
            report,
            failed,
            error,
        }
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
