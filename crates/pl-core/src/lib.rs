//! pl-core - Core library for patchlevel
//!
//! This crate provides configuration parsing, the patch model and naming
//! convention, patch sources, and catalog discovery used by the engine and
//! the CLI.

pub mod catalog;
pub mod config;
pub mod declaration;
pub mod error;
mod newtype_string;
pub mod patch;
pub mod source;

pub use catalog::{discover, PatchCatalog};
pub use config::{Config, DatabaseConfig, Launcher, LedgerConfig};
pub use declaration::{DataLoadSpec, LoadMode, TabularFormat, TaskName, TaskRef};
pub use error::{CoreError, CoreResult};
pub use patch::{
    has_patch_extension, parse_patch_file_name, Patch, PatchKind, PatchName, PatchPayload,
    PATCH_EXTENSIONS,
};
pub use source::{DirectorySource, MemorySource, PatchSource};
