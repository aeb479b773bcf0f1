//! Shared utilities for CLI commands

use anyhow::Result;
use pl_core::{Config, DatabaseConfig, DirectorySource};
use pl_db::{acquire, BackendProvider, ConnectionProvider, SharedProvider};
use pl_engine::{MigrateError, MigrationRunner, VersionLedger};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; the failure has already been reported.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Discovery or validation failure
pub(crate) const EXIT_VALIDATION: i32 = 1;
/// Missing or invalid configuration
pub(crate) const EXIT_CONFIG: i32 = 3;
/// Database or patch failure
pub(crate) const EXIT_DATABASE: i32 = 4;

/// Print `err` to stderr and turn it into an [`ExitCode`].
pub(crate) fn fail(code: i32, err: impl fmt::Display) -> anyhow::Error {
    eprintln!("Error: {}", err);
    ExitCode(code).into()
}

/// Exit code for an engine error.
pub(crate) fn exit_code_for(err: &MigrateError) -> i32 {
    match err {
        MigrateError::Discovery(_) => EXIT_VALIDATION,
        MigrateError::UnsupportedDatabaseKind { .. } => EXIT_CONFIG,
        MigrateError::Connection { .. }
        | MigrateError::LedgerUnavailable { .. }
        | MigrateError::PatchExecution { .. }
        | MigrateError::LedgerWrite { .. } => EXIT_DATABASE,
    }
}

/// Report an engine error and turn it into an [`ExitCode`].
pub(crate) fn fail_migrate(err: MigrateError) -> anyhow::Error {
    fail(exit_code_for(&err), err)
}

/// A loaded `patchlevel.yml` and the directory it applies to.
pub(crate) struct Project {
    pub root: PathBuf,
    pub config: Config,
}

impl Project {
    pub fn patch_dir(&self) -> PathBuf {
        self.config.patch_path_absolute(&self.root)
    }

    pub fn patch_source(&self) -> DirectorySource {
        DirectorySource::new(self.patch_dir())
    }

    pub fn ledger(&self) -> VersionLedger {
        VersionLedger::from_config(&self.config.ledger)
    }
}

/// Load the project config named by the global arguments.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = PathBuf::from(&global.project_dir);
    let loaded = match &global.config {
        Some(path) => Config::load(Path::new(path)),
        None => Config::load_from_dir(&root),
    };
    let config = loaded.map_err(|e| fail(EXIT_CONFIG, e))?;
    log::debug!("Loaded project '{}' from {}", config.name, root.display());
    Ok(Project { root, config })
}

/// Database settings for the selected target.
///
/// Relative file paths are taken relative to the project directory.
pub(crate) fn resolve_database(project: &Project, global: &GlobalArgs) -> Result<DatabaseConfig> {
    let target = Config::resolve_target(global.target.as_deref());
    if let Some(name) = &target {
        log::debug!("Using target '{}'", name);
    }
    let mut database = project
        .config
        .database_config(target.as_deref())
        .map_err(|e| fail(EXIT_CONFIG, e))?;
    if !database.is_in_memory() && Path::new(&database.path).is_relative() {
        database.path = project.root.join(&database.path).display().to_string();
    }
    Ok(database)
}

/// Provider for `database`.
///
/// An in-memory database only exists inside its connection, so it is opened
/// once and shared for the whole run.
pub(crate) fn provider_for(database: &DatabaseConfig) -> Result<Box<dyn ConnectionProvider>> {
    if database.is_in_memory() {
        let handle = acquire(database).map_err(|e| fail(EXIT_CONFIG, e))?;
        return Ok(Box::new(SharedProvider::new(handle)));
    }
    Ok(Box::new(BackendProvider::new()))
}

/// Runner over the project's patch directory and ledger.
pub(crate) fn build_runner(project: &Project, database: &DatabaseConfig) -> Result<MigrationRunner> {
    let provider = provider_for(database)?;
    Ok(
        MigrationRunner::new(provider, database.clone(), project.patch_source())
            .with_ledger(project.ledger()),
    )
}

/// Calculate column widths for a table given headers and row data.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }
    widths
}

/// Print a left-aligned table with a dashed separator under the header.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);

    let header_parts: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, &w)| format!("{:<width$}", h, width = w))
        .collect();
    println!("{}", header_parts.join("  ").trim_end());

    let sep_parts: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep_parts.join("  "));

    for row in rows {
        let row_parts: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect();
        println!("{}", row_parts.join("  ").trim_end());
    }
}

/// Milliseconds, for progress lines.
pub(crate) fn format_duration(duration: std::time::Duration) -> String {
    let ms = duration.as_millis();
    if ms >= 1000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", ms)
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
