//! pl-engine - Migration engine for patchlevel
//!
//! Reads the current patch level from the version ledger, discovers patches
//! from a [`pl_core::PatchSource`], and applies the pending ones in order.

pub mod dispatcher;
pub mod error;
pub mod ledger;
pub mod runner;
pub mod task;

pub use dispatcher::PatchDispatcher;
pub use error::{MigrateError, MigrateResult, PatchFailure, TaskError};
pub use ledger::VersionLedger;
pub use runner::{
    AppliedPatch, MigrationPlan, MigrationRunner, NoopObserver, PatchRef, RunFailure, RunObserver,
    RunReport, RunState, RunStatus,
};
pub use task::{PatchTask, TaskContext, TaskRegistry, TaskResult};
