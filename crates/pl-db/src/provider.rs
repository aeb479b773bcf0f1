//! Connection provider: turns a [`DatabaseConfig`] into a live handle.
//!
//! Lookup is keyed by the configured `kind` and is case-sensitive. An unknown
//! kind is an error; there is no fallback backend.

use crate::duckdb::DuckDbBackend;
use crate::error::{DbError, DbResult};
use crate::sqlite::SqliteBackend;
use crate::traits::Database;
use pl_core::DatabaseConfig;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared handle to an open database connection
pub type DbHandle = Arc<dyn Database>;

/// Opens a connection for a database configuration.
pub trait ConnectionProvider {
    /// Acquire a connection. The caller owns it; dropping it releases it.
    fn acquire(&self, config: &DatabaseConfig) -> DbResult<DbHandle>;
}

impl<P: ConnectionProvider + ?Sized> ConnectionProvider for Box<P> {
    fn acquire(&self, config: &DatabaseConfig) -> DbResult<DbHandle> {
        (**self).acquire(config)
    }
}

/// Function that opens one kind of backend
pub type Connector = fn(&DatabaseConfig) -> DbResult<DbHandle>;

fn connect_duckdb(config: &DatabaseConfig) -> DbResult<DbHandle> {
    Ok(Arc::new(DuckDbBackend::new(&config.path)?))
}

fn connect_sqlite(config: &DatabaseConfig) -> DbResult<DbHandle> {
    Ok(Arc::new(SqliteBackend::new(&config.path)?))
}

/// Provider that opens a fresh connection per request, picked by `kind`.
pub struct BackendProvider {
    connectors: BTreeMap<String, Connector>,
}

impl BackendProvider {
    /// Provider with the built-in `duckdb` and `sqlite` backends.
    pub fn new() -> Self {
        let mut connectors: BTreeMap<String, Connector> = BTreeMap::new();
        connectors.insert("duckdb".to_string(), connect_duckdb);
        connectors.insert("sqlite".to_string(), connect_sqlite);
        Self { connectors }
    }

    /// Register (or replace) the connector for `kind`.
    pub fn with_connector(mut self, kind: impl Into<String>, connector: Connector) -> Self {
        self.connectors.insert(kind.into(), connector);
        self
    }

    /// Registered kinds, sorted.
    pub fn supported_kinds(&self) -> Vec<&str> {
        self.connectors.keys().map(String::as_str).collect()
    }
}

impl Default for BackendProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionProvider for BackendProvider {
    fn acquire(&self, config: &DatabaseConfig) -> DbResult<DbHandle> {
        let connector =
            self.connectors
                .get(&config.kind)
                .ok_or_else(|| DbError::UnsupportedDatabaseKind {
                    kind: config.kind.clone(),
                    supported: self.supported_kinds().join(", "),
                })?;
        log::debug!("Opening {} connection", config.display_location());
        connector(config)
    }
}

/// Provider that hands out clones of one already-open handle.
///
/// In-memory databases exist only inside their connection, so every patch
/// must see the same one.
pub struct SharedProvider {
    handle: DbHandle,
}

impl SharedProvider {
    /// Wrap an open handle.
    pub fn new(handle: DbHandle) -> Self {
        Self { handle }
    }

    /// The wrapped handle.
    pub fn handle(&self) -> &DbHandle {
        &self.handle
    }
}

impl ConnectionProvider for SharedProvider {
    fn acquire(&self, config: &DatabaseConfig) -> DbResult<DbHandle> {
        if config.kind != self.handle.db_type() {
            return Err(DbError::UnsupportedDatabaseKind {
                kind: config.kind.clone(),
                supported: self.handle.db_type().to_string(),
            });
        }
        Ok(Arc::clone(&self.handle))
    }
}

/// Acquire a connection with the built-in backends.
pub fn acquire(config: &DatabaseConfig) -> DbResult<DbHandle> {
    BackendProvider::new().acquire(config)
}

#[cfg(test)]
#[path = "provider_test.rs"]
mod tests;
