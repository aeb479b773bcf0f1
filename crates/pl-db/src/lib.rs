//! pl-db - Database abstraction layer for patchlevel
//!
//! This crate provides the [`Database`] trait, DuckDB and SQLite backends,
//! the connection provider and the tabular reader used by data loads.

pub mod duckdb;
pub mod error;
pub mod provider;
pub mod sql_utils;
pub mod sqlite;
pub mod tabular;
pub mod traits;
pub mod value;

pub use self::duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use provider::{acquire, BackendProvider, ConnectionProvider, Connector, DbHandle, SharedProvider};
pub use sqlite::SqliteBackend;
pub use tabular::{DuckDbTabularReader, Table, TabularOptions, TabularReader};
pub use traits::{with_transaction, Database};
pub use value::SqlValue;
