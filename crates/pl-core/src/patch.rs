//! Patch representation and the `patch<digits>_<description>.<ext>` naming
//! convention.

use crate::declaration::{DataLoadSpec, TaskRef};
use crate::error::{CoreError, CoreResult};
use crate::newtype_string::define_newtype_string;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

define_newtype_string! {
    /// The source identifier of a patch (its file name).
    pub struct PatchName;
}

static PATCH_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^patch([0-9]+)_(.+)\.([A-Za-z0-9]+)$").expect("patch name pattern is valid")
});

/// Extensions discovery turns into patches, compared case-insensitively.
pub const PATCH_EXTENSIONS: [&str; 4] = ["sql", "csv", "yml", "yaml"];

/// Whether `name` ends in one of [`PATCH_EXTENSIONS`].
pub fn has_patch_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            PATCH_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Components of a file name that follows the patch naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPatchName<'a> {
    /// Numeric version from the digit run
    pub version: u64,
    /// Descriptive text between the separator and the extension
    pub description: &'a str,
    /// File extension without the dot
    pub extension: &'a str,
}

/// Split a file name into version, description and extension.
///
/// Returns `Ok(None)` for names that do not follow the convention, so
/// unrelated files can live next to patches. A name that does follow it but
/// carries an unusable version (zero, or too many digits) is an error.
pub fn parse_patch_file_name(name: &str) -> CoreResult<Option<ParsedPatchName<'_>>> {
    let Some(caps) = PATCH_NAME_RE.captures(name) else {
        return Ok(None);
    };

    let (Some(digits), Some(description), Some(extension)) = (caps.get(1), caps.get(2), caps.get(3))
    else {
        return Ok(None);
    };

    let version: u64 = digits
        .as_str()
        .parse()
        .map_err(|e| CoreError::InvalidPatchVersion {
            name: name.to_string(),
            reason: format!("'{}' is not a usable version number: {}", digits.as_str(), e),
        })?;

    if version == 0 {
        return Err(CoreError::InvalidPatchVersion {
            name: name.to_string(),
            reason: "version 0 is reserved for \"no patches applied\"".to_string(),
        });
    }

    Ok(Some(ParsedPatchName {
        version,
        description: description.as_str(),
        extension: extension.as_str(),
    }))
}

/// The kind of change a patch carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchKind {
    /// One or more SQL statements executed as a batch
    SqlScript,
    /// Rows loaded from a tabular resource
    DataLoad,
    /// Code registered with the runner under a task name
    ProgrammaticTask,
}

impl std::fmt::Display for PatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchKind::SqlScript => write!(f, "sql"),
            PatchKind::DataLoad => write!(f, "data-load"),
            PatchKind::ProgrammaticTask => write!(f, "task"),
        }
    }
}

/// What a patch executes. The variant determines the [`PatchKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum PatchPayload {
    /// Script text
    SqlScript(String),
    /// Loader configuration
    DataLoad(DataLoadSpec),
    /// Reference to a registered task
    Task(TaskRef),
}

impl PatchPayload {
    /// The kind this payload belongs to.
    pub fn kind(&self) -> PatchKind {
        match self {
            PatchPayload::SqlScript(_) => PatchKind::SqlScript,
            PatchPayload::DataLoad(_) => PatchKind::DataLoad,
            PatchPayload::Task(_) => PatchKind::ProgrammaticTask,
        }
    }
}

/// One versioned unit of database change. Immutable once discovered.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Unique, positive version
    pub version: u64,
    /// Source identifier (file name)
    pub name: PatchName,
    /// Descriptive part of the name
    pub description: String,
    /// Directory that relative resource paths in the payload resolve against
    pub base_dir: PathBuf,
    /// What to execute
    pub payload: PatchPayload,
}

impl Patch {
    /// The kind of this patch.
    pub fn kind(&self) -> PatchKind {
        self.payload.kind()
    }

    /// Resolve a resource path declared by this patch.
    pub fn resolve_resource(&self, relative: &str) -> PathBuf {
        let path = Path::new(relative);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl std::fmt::Display for Patch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (v{}, {})", self.name, self.version, self.kind())
    }
}

#[cfg(test)]
#[path = "patch_test.rs"]
mod tests;
