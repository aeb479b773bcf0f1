//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::sql_utils::split_qualified_name;
use crate::traits::Database;
use crate::value::SqlValue;
use chrono::{DateTime, NaiveDate, NaiveTime};
use duckdb::types::{TimeUnit, ToSqlOutput, Value, ValueRef};
use duckdb::Connection;
use std::path::Path;

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Connection,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Create a new DuckDB connection from a file path
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

    /// Run a query and return column names alongside the rows.
    pub(crate) fn query_with_columns(
        &self,
        sql: &str,
    ) -> DbResult<(Vec<String>, Vec<Vec<SqlValue>>)> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows_out = Vec::new();
        {
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let col_count = row.as_ref().column_count();
                let values = (0..col_count)
                    .map(|i| read_value(row, i))
                    .collect::<DbResult<Vec<_>>>()?;
                rows_out.push(values);
            }
        }

        // Column metadata is only reliable after the statement has executed
        let column_names = (0..stmt.column_count())
            .map(|i| {
                stmt.column_name(i)
                    .map_or("?".to_string(), |v| v.to_string())
            })
            .collect();

        Ok((column_names, rows_out))
    }
}

/// Days from 0001-01-01 to the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Convert one column of a DuckDB row into a [`SqlValue`].
///
/// Temporal values become ISO-8601 text and decimals keep their exact
/// digits as text; the target column's type coerces them on insert.
fn read_value(row: &duckdb::Row<'_>, idx: usize) -> DbResult<SqlValue> {
    let value = match row.get_ref(idx)? {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Boolean(b) => SqlValue::Boolean(b),
        ValueRef::TinyInt(i) => SqlValue::Integer(i.into()),
        ValueRef::SmallInt(i) => SqlValue::Integer(i.into()),
        ValueRef::Int(i) => SqlValue::Integer(i.into()),
        ValueRef::BigInt(i) => SqlValue::Integer(i),
        ValueRef::UTinyInt(i) => SqlValue::Integer(i.into()),
        ValueRef::USmallInt(i) => SqlValue::Integer(i.into()),
        ValueRef::UInt(i) => SqlValue::Integer(i.into()),
        ValueRef::UBigInt(i) => i64::try_from(i)
            .map(SqlValue::Integer)
            .unwrap_or_else(|_| SqlValue::Text(i.to_string())),
        ValueRef::HugeInt(i) => i64::try_from(i)
            .map(SqlValue::Integer)
            .unwrap_or_else(|_| SqlValue::Text(i.to_string())),
        ValueRef::Float(f) => SqlValue::Real(f.into()),
        ValueRef::Double(f) => SqlValue::Real(f),
        ValueRef::Decimal(d) => SqlValue::Text(d.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            SqlValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
        ValueRef::Date32(days) => UNIX_EPOCH_DAYS_FROM_CE
            .checked_add(days)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(|d| SqlValue::Text(d.format("%Y-%m-%d").to_string()))
            .ok_or_else(|| out_of_range(idx, "date"))?,
        ValueRef::Timestamp(unit, raw) => DateTime::from_timestamp_micros(to_micros(unit, raw))
            .map(|ts| SqlValue::Text(ts.naive_utc().format("%Y-%m-%d %H:%M:%S%.f").to_string()))
            .ok_or_else(|| out_of_range(idx, "timestamp"))?,
        ValueRef::Time64(unit, raw) => {
            let micros = to_micros(unit, raw);
            u32::try_from(micros.div_euclid(1_000_000))
                .ok()
                .and_then(|secs| {
                    // rem_euclid keeps the sub-second part below 10^6
                    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
                    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
                })
                .map(|t| SqlValue::Text(t.format("%H:%M:%S%.f").to_string()))
                .ok_or_else(|| out_of_range(idx, "time"))?
        }
        _ => {
            return Err(DbError::ExecutionError(format!(
                "column {} has an unsupported type; cast it to VARCHAR",
                idx
            )))
        }
    };
    Ok(value)
}

fn to_micros(unit: TimeUnit, raw: i64) -> i64 {
    match unit {
        TimeUnit::Second => raw.saturating_mul(1_000_000),
        TimeUnit::Millisecond => raw.saturating_mul(1_000),
        TimeUnit::Microsecond => raw,
        TimeUnit::Nanosecond => raw / 1_000,
    }
}

fn out_of_range(idx: usize, what: &str) -> DbError {
    DbError::ExecutionError(format!("column {} holds a {} outside the supported range", idx, what))
}

impl duckdb::ToSql for SqlValue {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        let value = match self {
            SqlValue::Null => Value::Null,
            SqlValue::Integer(i) => Value::BigInt(*i),
            SqlValue::Real(r) => Value::Double(*r),
            SqlValue::Text(s) => Value::Text(s.clone()),
            SqlValue::Boolean(b) => Value::Boolean(*b),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

impl Database for DuckDbBackend {
    fn execute(&self, sql: &str) -> DbResult<usize> {
        self.conn
            .execute(sql, [])
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    fn execute_with_params(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize> {
        self.conn
            .execute(sql, duckdb::params_from_iter(params.iter()))
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    fn execute_batch(&self, sql: &str) -> DbResult<()> {
        // DuckDB's batch API runs every statement and discards their results
        self.conn
            .execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

    fn query_rows(&self, sql: &str) -> DbResult<Vec<Vec<SqlValue>>> {
        self.query_with_columns(sql).map(|(_, rows)| rows)
    }

    fn relation_exists(&self, name: &str) -> DbResult<bool> {
        let (schema, table) = split_qualified_name(name, "main");
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
            duckdb::params![schema, table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
