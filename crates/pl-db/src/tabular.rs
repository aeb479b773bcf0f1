//! Reading tabular resources (CSV, JSON, Parquet) for data-load patches.
//!
//! The default reader parses files with an in-process DuckDB instance, so
//! the target database never needs file access of its own. CSV cells are
//! read as text and left to the target column's type to coerce.

use crate::duckdb::DuckDbBackend;
use crate::error::{DbError, DbResult};
use crate::sql_utils::escape_sql_string;
use crate::value::SqlValue;
use pl_core::{DataLoadSpec, TabularFormat};
use std::io::Write;
use std::path::Path;

/// Rows read from a tabular resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names in file order
    pub columns: Vec<String>,
    /// Row values, each aligned with `columns`
    pub rows: Vec<Vec<SqlValue>>,
}

impl Table {
    /// Position of a named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Parsing options for a tabular resource
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabularOptions {
    pub format: TabularFormat,
    pub delimiter: char,
    pub header: bool,
}

impl Default for TabularOptions {
    fn default() -> Self {
        Self {
            format: TabularFormat::Csv,
            delimiter: ',',
            header: true,
        }
    }
}

impl From<&DataLoadSpec> for TabularOptions {
    fn from(spec: &DataLoadSpec) -> Self {
        Self {
            format: spec.resolved_format().unwrap_or(TabularFormat::Csv),
            delimiter: spec.delimiter,
            header: spec.header,
        }
    }
}

/// Reads a tabular file into memory.
pub trait TabularReader {
    fn read(&self, path: &Path, options: &TabularOptions) -> DbResult<Table>;

    /// Read content held in memory. `name` is used for errors and as the
    /// file-extension hint.
    ///
    /// The default stages `text` in a temporary file and hands it to
    /// [`read`](Self::read).
    fn read_text(&self, name: &str, text: &str, options: &TabularOptions) -> DbResult<Table> {
        let staging_error = |e: std::io::Error| DbError::TabularReadError {
            path: name.to_string(),
            message: format!("cannot stage embedded content: {e}"),
        };
        let suffix = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();

        let mut staged = tempfile::Builder::new()
            .prefix("patchlevel-")
            .suffix(&suffix)
            .tempfile()
            .map_err(staging_error)?;
        staged.write_all(text.as_bytes()).map_err(staging_error)?;
        staged.flush().map_err(staging_error)?;

        self.read(staged.path(), options).map_err(|e| match e {
            DbError::TabularReadError { message, .. } => DbError::TabularReadError {
                path: name.to_string(),
                message,
            },
            other => other,
        })
    }
}

/// [`TabularReader`] backed by an in-memory DuckDB connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct DuckDbTabularReader;

impl DuckDbTabularReader {
    pub fn new() -> Self {
        Self
    }

    fn scan_sql(path: &str, options: &TabularOptions) -> String {
        let path = escape_sql_string(path);
        match options.format {
            TabularFormat::Csv => format!(
                "SELECT * FROM read_csv('{}', header = {}, delim = '{}', all_varchar = true)",
                path,
                options.header,
                escape_sql_string(&options.delimiter.to_string())
            ),
            TabularFormat::Json => format!("SELECT * FROM read_json_auto('{}')", path),
            TabularFormat::Parquet => format!("SELECT * FROM read_parquet('{}')", path),
        }
    }
}

impl TabularReader for DuckDbTabularReader {
    fn read(&self, path: &Path, options: &TabularOptions) -> DbResult<Table> {
        let display = path.display().to_string();
        let read_error = |message: String| DbError::TabularReadError {
            path: display.clone(),
            message,
        };

        if !path.is_file() {
            return Err(read_error("file not found".to_string()));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| read_error("path is not valid UTF-8".to_string()))?;

        let scratch = DuckDbBackend::in_memory()?;
        let (columns, rows) = scratch
            .query_with_columns(&Self::scan_sql(path_str, options))
            .map_err(|e| read_error(e.to_string()))?;
        log::debug!("Read {} rows from {}", rows.len(), display);
        Ok(Table { columns, rows })
    }
}

#[cfg(test)]
#[path = "tabular_test.rs"]
mod tests;
