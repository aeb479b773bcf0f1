//! Declarative patch bodies: data loads and task references.
//!
//! A YAML patch file names its kind in a top-level `kind` field
//! (`data_load` or `task`); the remaining keys are the body. A bare `.csv`
//! patch is shorthand for a data load into the table named by its
//! description.

use crate::config::is_valid_identifier;
use crate::error::{CoreError, CoreResult};
use crate::newtype_string::define_newtype_string;
use crate::patch::PatchPayload;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

define_newtype_string! {
    /// Name under which a programmatic task is registered.
    pub struct TaskName;
}

/// How loaded rows are written to the target table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Plain INSERT per row (default)
    #[default]
    Insert,
    /// DELETE rows matching `key_columns`, then INSERT
    Upsert,
}

impl std::fmt::Display for LoadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadMode::Insert => write!(f, "insert"),
            LoadMode::Upsert => write!(f, "upsert"),
        }
    }
}

/// File format of a tabular resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabularFormat {
    /// Delimited text
    Csv,
    /// Newline-delimited or array JSON
    Json,
    /// Apache Parquet
    Parquet,
}

impl TabularFormat {
    /// Guess the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "tsv" | "txt" => Some(TabularFormat::Csv),
            "json" | "ndjson" | "jsonl" => Some(TabularFormat::Json),
            "parquet" => Some(TabularFormat::Parquet),
            _ => None,
        }
    }
}

impl std::fmt::Display for TabularFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TabularFormat::Csv => write!(f, "csv"),
            TabularFormat::Json => write!(f, "json"),
            TabularFormat::Parquet => write!(f, "parquet"),
        }
    }
}

/// Loader configuration for a data-load patch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataLoadSpec {
    /// Resource path, relative to the patch directory
    pub source: String,

    /// Target table
    pub table: String,

    /// Resource format; inferred from the source extension when absent
    #[serde(default)]
    pub format: Option<TabularFormat>,

    /// Write mode
    #[serde(default)]
    pub mode: LoadMode,

    /// Target columns identifying a row for `upsert`
    #[serde(default)]
    pub key_columns: Vec<String>,

    /// Source column -> target column. When non-empty, only mapped columns load.
    #[serde(default)]
    pub columns: BTreeMap<String, String>,

    /// CSV delimiter (default: comma)
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Whether the first CSV line is a header (default: true)
    #[serde(default = "default_header")]
    pub header: bool,

    /// Resource content carried by an embedded patch; `source` then only names it
    #[serde(skip)]
    pub inline: Option<String>,
}

fn default_delimiter() -> char {
    ','
}

fn default_header() -> bool {
    true
}

impl DataLoadSpec {
    /// Spec for a bare `.csv` patch: load every column into `table`.
    pub fn csv(source: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            table: table.into(),
            format: Some(TabularFormat::Csv),
            mode: LoadMode::Insert,
            key_columns: Vec::new(),
            columns: BTreeMap::new(),
            delimiter: default_delimiter(),
            header: default_header(),
            inline: None,
        }
    }

    /// The effective resource format.
    pub fn resolved_format(&self) -> Option<TabularFormat> {
        self.format.or_else(|| {
            std::path::Path::new(&self.source)
                .extension()
                .and_then(|e| e.to_str())
                .and_then(TabularFormat::from_extension)
        })
    }

    /// Map a source column to its target column, or `None` if it is not loaded.
    pub fn target_column<'a>(&'a self, source_column: &'a str) -> Option<&'a str> {
        if self.columns.is_empty() {
            Some(source_column)
        } else {
            self.columns.get(source_column).map(String::as_str)
        }
    }

    fn validate(&self, patch_name: &str) -> CoreResult<()> {
        let fail = |message: String| CoreError::PatchParseError {
            name: patch_name.to_string(),
            message,
        };

        if self.source.trim().is_empty() {
            return Err(fail("data load 'source' cannot be empty".to_string()));
        }
        if !is_valid_identifier(&self.table) {
            return Err(fail(format!(
                "data load table '{}' is not a valid SQL identifier",
                self.table
            )));
        }
        if self.resolved_format().is_none() {
            return Err(fail(format!(
                "cannot infer format of '{}'; set 'format' explicitly",
                self.source
            )));
        }
        for target in self.columns.values() {
            if !is_valid_identifier(target) {
                return Err(fail(format!("column '{}' is not a valid SQL identifier", target)));
            }
        }
        if self.mode == LoadMode::Upsert {
            if self.key_columns.is_empty() {
                return Err(fail("upsert mode requires 'key_columns'".to_string()));
            }
            if !self.columns.is_empty() {
                if let Some(missing) = self
                    .key_columns
                    .iter()
                    .find(|k| !self.columns.values().any(|t| t == *k))
                {
                    return Err(fail(format!(
                        "key column '{}' is not a mapped target column",
                        missing
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Reference to a programmatic task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskRef {
    /// Registered task name
    pub task: TaskName,

    /// Free-form parameters handed to the task
    #[serde(default)]
    pub params: BTreeMap<String, serde_yaml::Value>,
}

impl TaskRef {
    /// Reference a task without parameters.
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: TaskName::new(task),
            params: BTreeMap::new(),
        }
    }
}

/// Parse the body of a YAML patch file into a payload.
pub fn parse_declaration(patch_name: &str, content: &str) -> CoreResult<PatchPayload> {
    let fail = |message: String| CoreError::PatchParseError {
        name: patch_name.to_string(),
        message,
    };

    let value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| fail(e.to_string()))?;
    let serde_yaml::Value::Mapping(mut mapping) = value else {
        return Err(fail("expected a mapping at the top level".to_string()));
    };

    let kind = mapping
        .remove("kind")
        .ok_or_else(|| fail("missing required 'kind' field (data_load or task)".to_string()))?;
    let kind = kind
        .as_str()
        .ok_or_else(|| fail("'kind' must be a string".to_string()))?
        .to_string();
    let body = serde_yaml::Value::Mapping(mapping);

    match kind.as_str() {
        "data_load" => {
            let spec: DataLoadSpec =
                serde_yaml::from_value(body).map_err(|e| fail(e.to_string()))?;
            spec.validate(patch_name)?;
            Ok(PatchPayload::DataLoad(spec))
        }
        "task" => {
            let task: TaskRef = serde_yaml::from_value(body).map_err(|e| fail(e.to_string()))?;
            Ok(PatchPayload::Task(task))
        }
        other => Err(fail(format!(
            "unknown kind '{}', expected 'data_load' or 'task'",
            other
        ))),
    }
}

#[cfg(test)]
#[path = "declaration_test.rs"]
mod tests;
