//! Version ledger: the single-row table recording the last applied patch.
//!
//! The table holds exactly one `level BIGINT NOT NULL` row. Level 0 means no
//! patch has been applied. The level only moves forward, and always inside a
//! transaction that deletes the old row before inserting the new one.

use crate::error::{MigrateError, MigrateResult};
use pl_core::config::DEFAULT_LEDGER_TABLE;
use pl_core::LedgerConfig;
use pl_db::sql_utils::quote_qualified;
use pl_db::{with_transaction, Database, DbError, DbResult, SqlValue};

/// Reads and advances the patch level stored in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionLedger {
    table: String,
}

impl Default for VersionLedger {
    fn default() -> Self {
        Self::new(DEFAULT_LEDGER_TABLE)
    }
}

impl VersionLedger {
    /// Ledger stored in `table` (optionally schema-qualified).
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.table.clone())
    }

    /// Ledger table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Current level, creating the ledger at level 0 when it does not exist.
    pub fn current_level(&self, db: &dyn Database) -> MigrateResult<u64> {
        let exists = db
            .relation_exists(&self.table)
            .map_err(|e| self.unavailable(e))?;
        if !exists {
            self.initialize(db).map_err(|e| self.unavailable(e))?;
            log::debug!("Created version ledger '{}' at level 0", self.table);
            return Ok(0);
        }
        self.read_level(db)
    }

    /// Current level without creating anything; an absent ledger reads as 0.
    pub fn peek_level(&self, db: &dyn Database) -> MigrateResult<u64> {
        let exists = db
            .relation_exists(&self.table)
            .map_err(|e| self.unavailable(e))?;
        if exists {
            self.read_level(db)
        } else {
            Ok(0)
        }
    }

    /// Record `version` as the new level.
    ///
    /// A failure here means the patch ran but its level was not stored, so
    /// it is reported as [`MigrateError::LedgerWrite`] and never retried.
    pub fn advance_to(&self, db: &dyn Database, version: u64) -> MigrateResult<()> {
        let level = i64::try_from(version).map_err(|_| MigrateError::LedgerWrite {
            version,
            cause: DbError::Internal(format!("level {} does not fit in a BIGINT", version)),
        })?;
        let table = quote_qualified(&self.table);

        with_transaction(db, |db| {
            db.execute(&format!("DELETE FROM {}", table))?;
            db.execute_with_params(
                &format!("INSERT INTO {} (level) VALUES (?)", table),
                &[SqlValue::Integer(level)],
            )?;
            Ok(())
        })
        .map_err(|cause| {
            log::warn!(
                "Patch v{} ran but ledger '{}' was not advanced: {}",
                version,
                self.table,
                cause
            );
            MigrateError::LedgerWrite { version, cause }
        })
    }

    fn initialize(&self, db: &dyn Database) -> DbResult<()> {
        let table = quote_qualified(&self.table);
        with_transaction(db, |db| {
            db.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} (level BIGINT NOT NULL)",
                table
            ))?;
            db.execute(&format!("INSERT INTO {} (level) VALUES (0)", table))?;
            Ok(())
        })
    }

    fn read_level(&self, db: &dyn Database) -> MigrateResult<u64> {
        let sql = format!("SELECT MAX(level) FROM {}", quote_qualified(&self.table));
        let level = db.query_i64(&sql).map_err(|e| self.unavailable(e))?;
        match level {
            None => Ok(0),
            Some(level) => u64::try_from(level).map_err(|_| {
                self.unavailable(DbError::ExecutionError(format!(
                    "ledger holds a negative level ({})",
                    level
                )))
            }),
        }
    }

    fn unavailable(&self, source: DbError) -> MigrateError {
        MigrateError::LedgerUnavailable {
            table: self.table.clone(),
            source,
        }
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
