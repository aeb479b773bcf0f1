//! Database trait definition

use crate::error::{DbError, DbResult};
use crate::value::SqlValue;

/// Database abstraction trait for patchlevel.
///
/// All calls block until the backend returns. Handles are used by one runner
/// on one thread, so implementations need not be `Sync`.
pub trait Database {
    /// Execute a single statement, returns affected rows
    fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute a single statement with positional `?` parameters
    fn execute_with_params(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize>;

    /// Execute multiple `;`-separated statements in order.
    ///
    /// Rows produced by any statement are drained before the next one runs
    /// or an error is surfaced.
    fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Run a query and return every row
    fn query_rows(&self, sql: &str) -> DbResult<Vec<Vec<SqlValue>>>;

    /// Check if a table or view exists (optionally schema-qualified)
    fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;

    /// First column of the first row as an integer, `None` for no rows or NULL
    fn query_i64(&self, sql: &str) -> DbResult<Option<i64>> {
        let rows = self.query_rows(sql)?;
        let Some(value) = rows.into_iter().next().and_then(|r| r.into_iter().next()) else {
            return Ok(None);
        };
        if value.is_null() {
            return Ok(None);
        }
        value.as_i64().map(Some).ok_or_else(|| {
            DbError::ExecutionError(format!("expected an integer from '{}', got {}", sql, value))
        })
    }
}

/// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
/// error.
pub fn with_transaction<T, F>(db: &dyn Database, body: F) -> DbResult<T>
where
    F: FnOnce(&dyn Database) -> DbResult<T>,
{
    db.execute_batch("BEGIN TRANSACTION")
        .map_err(|e| DbError::ExecutionError(format!("BEGIN failed: {e}")))?;

    let result = body(db);

    match &result {
        Ok(_) => {
            if let Err(commit_err) = db.execute_batch("COMMIT") {
                let _ = db.execute_batch("ROLLBACK");
                return Err(DbError::ExecutionError(format!(
                    "COMMIT failed: {commit_err}"
                )));
            }
        }
        Err(_) => {
            let _ = db.execute_batch("ROLLBACK");
        }
    }
    result
}
