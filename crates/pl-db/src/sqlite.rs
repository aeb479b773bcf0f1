//! SQLite database backend implementation

use crate::error::{DbError, DbResult};
use crate::sql_utils::{quote_ident, split_qualified_name};
use crate::traits::Database;
use crate::value::SqlValue;
use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::types::{ToSqlOutput, Value};
use rusqlite::{Batch, Connection};
use std::path::Path;

/// SQLite database backend
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Create a new in-memory SQLite connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Open (or create) a SQLite database file
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self { conn })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Step one statement of a batch to completion, discarding any rows.
    fn drain(stmt: &mut rusqlite::Statement<'_>) -> rusqlite::Result<()> {
        let mut rows = stmt.query([])?;
        while rows.next()?.is_some() {}
        Ok(())
    }
}

fn to_sql_value(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(i),
        Value::Real(r) => SqlValue::Real(r),
        Value::Text(s) => SqlValue::Text(s),
        Value::Blob(b) => SqlValue::Text(String::from_utf8_lossy(&b).into_owned()),
    }
}

impl rusqlite::ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            SqlValue::Null => Value::Null,
            SqlValue::Integer(i) => Value::Integer(*i),
            SqlValue::Real(r) => Value::Real(*r),
            SqlValue::Text(s) => Value::Text(s.clone()),
            SqlValue::Boolean(b) => Value::Integer(i64::from(*b)),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

impl Database for SqliteBackend {
    fn execute(&self, sql: &str) -> DbResult<usize> {
        self.conn
            .execute(sql, [])
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    fn execute_with_params(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize> {
        self.conn
            .execute(sql, rusqlite::params_from_iter(params.iter()))
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let mut batch = Batch::new(&self.conn, sql);
        let mut index = 0usize;
        loop {
            index += 1;
            let outcome = match batch.next() {
                Ok(Some(mut stmt)) => Self::drain(&mut stmt),
                Ok(None) => return Ok(()),
                Err(e) => Err(e),
            };
            if let Err(e) = outcome {
                // A failed statement inside an explicit transaction leaves it
                // open; close it so the connection stays usable.
                if !self.conn.is_autocommit() {
                    let _ = self.conn.execute_batch("ROLLBACK");
                }
                return Err(DbError::BatchStatementFailed {
                    index,
                    message: e.to_string(),
                });
            }
        }
    }

    fn query_rows(&self, sql: &str) -> DbResult<Vec<Vec<SqlValue>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let col_count = stmt.column_count();
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..col_count)
                .map(|i| row.get::<_, Value>(i).map(to_sql_value))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            out.push(values);
        }
        Ok(out)
    }

    fn relation_exists(&self, name: &str) -> DbResult<bool> {
        let (schema, table) = split_qualified_name(name, "main");
        // An unattached schema holds no relations
        let attached: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pragma_database_list WHERE name = ?1",
            [schema],
            |row| row.get(0),
        )?;
        if attached == 0 {
            return Ok(false);
        }

        let sql = format!(
            "SELECT COUNT(*) FROM {}.sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
            quote_ident(schema)
        );
        let count: i64 = self.conn.query_row(&sql, [table], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn db_type(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;
