//! Error types for pl-core

use thiserror::Error;

/// Core error type for patchlevel
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Failed to parse configuration file
    #[error("[C002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// C003: Invalid configuration value
    #[error("[C003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    // Discovery error types (P001-P005)
    /// P001: Two patch entries resolve to the same version
    #[error("[P001] Duplicate patch version {version}: '{first}' and '{second}'")]
    DuplicatePatchVersion {
        version: u64,
        first: String,
        second: String,
    },

    /// P002: Patch name matches the convention but the version is unusable
    #[error("[P002] Invalid patch version in '{name}': {reason}")]
    InvalidPatchVersion { name: String, reason: String },

    /// P003: Patch body could not be interpreted
    #[error("[P003] Failed to parse patch '{name}': {message}")]
    PatchParseError { name: String, message: String },

    /// P004: The patch source itself could not be enumerated
    #[error("[P004] Patch source '{location}' is unreadable: {source}")]
    PatchSourceUnreadable {
        location: String,
        source: std::io::Error,
    },

    /// P005: A single patch entry could not be read
    #[error("[P005] Patch entry '{name}' not found in {location}")]
    PatchEntryNotFound { name: String, location: String },

    /// C014: IO error
    #[error("[C014] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// C016: IO error with file path context
    #[error("[C016] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C015: YAML parse error
    #[error("[C015] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

impl CoreError {
    /// Returns `true` for errors raised while building the patch catalog.
    pub fn is_discovery_error(&self) -> bool {
        matches!(
            self,
            CoreError::DuplicatePatchVersion { .. }
                | CoreError::InvalidPatchVersion { .. }
                | CoreError::PatchParseError { .. }
                | CoreError::PatchSourceUnreadable { .. }
                | CoreError::PatchEntryNotFound { .. }
        )
    }
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
