//! Configuration types and parsing for patchlevel.yml

use crate::error::{CoreError, CoreResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Plain or schema-qualified SQL identifier (`patch_level`, `meta.patch_level`).
static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .expect("identifier pattern is valid")
});

/// Main project configuration from patchlevel.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Directory holding patch files, relative to the project root
    #[serde(default = "default_patch_path")]
    pub patch_path: String,

    /// What `pl migrate` does when no mode flag is given
    #[serde(default)]
    pub launcher: Launcher,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Version ledger settings
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Named target configurations (e.g., dev, staging, prod)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

/// Target-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Database configuration override
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

/// Runner variant selected by the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Launcher {
    /// Apply all pending patches (default)
    #[default]
    Apply,
    /// Report pending patches without executing them
    Plan,
}

impl std::fmt::Display for Launcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Launcher::Apply => write!(f, "apply"),
            Launcher::Plan => write!(f, "plan"),
        }
    }
}

/// Database connection configuration.
///
/// `kind` stays a plain string: an unknown kind must be rejected by the
/// connection provider, not coerced into a default while parsing.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Backend identifier (`duckdb`, `sqlite`)
    #[serde(default = "default_db_kind")]
    pub kind: String,

    /// Database path for file-based backends (or `:memory:`)
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Server host for networked backends
    #[serde(default)]
    pub host: Option<String>,

    /// Server port for networked backends
    #[serde(default)]
    pub port: Option<u16>,

    /// Login user
    #[serde(default)]
    pub user: Option<String>,

    /// Login password
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// Logical database name
    #[serde(default)]
    pub name: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            kind: default_db_kind(),
            path: default_db_path(),
            host: None,
            port: None,
            user: None,
            password: None,
            name: None,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("kind", &self.kind)
            .field("path", &self.path)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("name", &self.name)
            .finish()
    }
}

impl DatabaseConfig {
    /// Convenience constructor for file-based backends.
    pub fn file(kind: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Human-readable location used in progress output (never includes credentials).
    pub fn display_location(&self) -> String {
        match (&self.host, self.port) {
            (Some(host), Some(port)) => format!("{}://{}:{}", self.kind, host, port),
            (Some(host), None) => format!("{}://{}", self.kind, host),
            _ => format!("{}:{}", self.kind, self.path),
        }
    }

    /// Returns `true` when the database lives only inside one connection.
    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY_PATH
    }
}

/// Version ledger settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Table holding the current patch level
    #[serde(default = "default_ledger_table")]
    pub table: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            table: default_ledger_table(),
        }
    }
}

/// Path value that selects an in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Default ledger table name.
pub const DEFAULT_LEDGER_TABLE: &str = "patch_level";

/// Environment variable consulted when no `--target` flag is given.
pub const TARGET_ENV_VAR: &str = "PL_TARGET";

fn default_patch_path() -> String {
    "patches".to_string()
}

fn default_db_kind() -> String {
    "duckdb".to_string()
}

fn default_db_path() -> String {
    IN_MEMORY_PATH.to_string()
}

fn default_ledger_table() -> String {
    DEFAULT_LEDGER_TABLE.to_string()
}

/// Check that `name` is a plain or schema-qualified SQL identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn parse(content: &str) -> CoreResult<Self> {
        let config: Config =
            serde_yaml::from_str(content).map_err(|e| CoreError::ConfigParseError {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for patchlevel.yml or patchlevel.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("patchlevel.yml");
        let yaml_path = dir.join("patchlevel.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        if self.patch_path.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "patch_path cannot be empty".to_string(),
            });
        }

        if !is_valid_identifier(&self.ledger.table) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "ledger.table '{}' is not a valid SQL identifier",
                    self.ledger.table
                ),
            });
        }

        for (name, target) in &self.targets {
            if let Some(db) = &target.database {
                if db.kind.is_empty() {
                    return Err(CoreError::ConfigInvalid {
                        message: format!("Target '{}' has an empty database kind", name),
                    });
                }
            }
        }

        Ok(())
    }

    /// Get absolute patch directory relative to a project root
    pub fn patch_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.patch_path)
    }

    /// Get the list of available target names, sorted
    pub fn available_targets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get database configuration, optionally applying target overrides
    ///
    /// If target is specified and exists, uses target's database config.
    /// Otherwise, uses the base database config.
    pub fn database_config(&self, target: Option<&str>) -> CoreResult<DatabaseConfig> {
        match target {
            Some(name) => {
                let target_config =
                    self.targets
                        .get(name)
                        .ok_or_else(|| CoreError::ConfigInvalid {
                            message: format!(
                                "Target '{}' not found. Available targets: {}",
                                name,
                                self.available_targets().join(", ")
                            ),
                        })?;

                Ok(target_config
                    .database
                    .clone()
                    .unwrap_or_else(|| self.database.clone()))
            }
            None => Ok(self.database.clone()),
        }
    }

    /// Resolve target from CLI flag or PL_TARGET environment variable
    ///
    /// Priority: CLI flag > PL_TARGET env var > None
    pub fn resolve_target(cli_target: Option<&str>) -> Option<String> {
        cli_target
            .map(String::from)
            .or_else(|| std::env::var(TARGET_ENV_VAR).ok())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
