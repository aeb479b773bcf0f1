//! Error types for pl-engine

use pl_core::CoreError;
use pl_db::DbError;
use thiserror::Error;

/// Errors that stop a migration run
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Patch discovery failed; nothing was applied (M001)
    #[error("[M001] Patch discovery failed: {0}")]
    Discovery(#[from] CoreError),

    /// No backend for the configured database kind (M002)
    #[error("[M002] Unsupported database kind '{kind}' (supported: {supported})")]
    UnsupportedDatabaseKind { kind: String, supported: String },

    /// The backend could not open a connection (M003)
    #[error("[M003] Could not connect to {location}: {source}")]
    Connection {
        location: String,
        #[source]
        source: DbError,
    },

    /// The version ledger could not be read or created (M004)
    #[error("[M004] Version ledger '{table}' unavailable: {source}")]
    LedgerUnavailable {
        table: String,
        #[source]
        source: DbError,
    },

    /// A patch failed; the ledger was not advanced past it (M005)
    #[error("[M005] Patch {name} (v{version}) failed: {cause}")]
    PatchExecution {
        version: u64,
        name: String,
        cause: PatchFailure,
    },

    /// A patch ran but its version could not be recorded (M006)
    #[error(
        "[M006] Patch v{version} ran but the ledger could not be advanced: {cause}. \
         The database may already contain its changes; manual reconciliation may be required"
    )]
    LedgerWrite { version: u64, cause: DbError },
}

impl MigrateError {
    /// Map an acquisition failure, keeping unsupported kinds distinct.
    pub(crate) fn from_acquire(location: String, err: DbError) -> Self {
        match err {
            DbError::UnsupportedDatabaseKind { kind, supported } => {
                MigrateError::UnsupportedDatabaseKind { kind, supported }
            }
            source => MigrateError::Connection { location, source },
        }
    }

    /// Version of the patch involved, if any.
    pub fn patch_version(&self) -> Option<u64> {
        match self {
            MigrateError::PatchExecution { version, .. } | MigrateError::LedgerWrite { version, .. } => {
                Some(*version)
            }
            _ => None,
        }
    }
}

/// Boxed error returned by programmatic tasks
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// Why a single patch failed
#[derive(Error, Debug)]
pub enum PatchFailure {
    /// Statement or row write rejected by the database
    #[error(transparent)]
    Database(#[from] DbError),

    /// Referenced task has no registration
    #[error("task '{0}' is not registered")]
    UnknownTask(String),

    /// Task returned an error
    #[error("task '{task}' failed: {error}")]
    Task { task: String, error: TaskError },

    /// Tabular resource does not fit the load declaration
    #[error("{0}")]
    Data(String),
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;
