//! Patch sources: where the catalog finds patch entries.

use crate::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// An enumerable collection of named patch entries.
pub trait PatchSource {
    /// Human-readable location for error messages and logs.
    fn location(&self) -> String;

    /// Names of all entries in the source. Order is not significant.
    fn entry_names(&self) -> CoreResult<Vec<String>>;

    /// Read the text body of one entry.
    fn read_entry(&self, name: &str) -> CoreResult<String>;

    /// Directory that relative resource paths declared by patches resolve against.
    fn base_dir(&self) -> PathBuf;

    /// Whether entry bodies live only in the source, not as files under
    /// [`base_dir`](Self::base_dir).
    fn is_embedded(&self) -> bool {
        false
    }
}

/// Patch files in a single directory (not recursive).
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Create a source over `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory being scanned.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PatchSource for DirectorySource {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    fn entry_names(&self) -> CoreResult<Vec<String>> {
        let unreadable = |source: std::io::Error| CoreError::PatchSourceUnreadable {
            location: self.location(),
            source,
        };

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root).map_err(unreadable)? {
            let entry = entry.map_err(unreadable)?;
            if !entry.file_type().map_err(unreadable)?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => log::debug!("Skipping non UTF-8 entry {:?}", raw),
            }
        }
        Ok(names)
    }

    fn read_entry(&self, name: &str) -> CoreResult<String> {
        let path = self.root.join(name);
        std::fs::read_to_string(&path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })
    }

    fn base_dir(&self) -> PathBuf {
        self.root.clone()
    }
}

/// Patches held in memory, e.g. embedded with `include_str!`.
///
/// Bare `.csv` entries load from their embedded body. Declared data loads
/// still read their `source` file under the base dir.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: Vec<(String, String)>,
    base_dir: PathBuf,
}

impl MemorySource {
    /// Create an empty source whose resources resolve against the working directory.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            base_dir: PathBuf::from("."),
        }
    }

    /// Add an entry.
    pub fn with_entry(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.entries.push((name.into(), body.into()));
        self
    }

    /// Set the directory that data-load resources resolve against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }
}

impl PatchSource for MemorySource {
    fn location(&self) -> String {
        "<memory>".to_string()
    }

    fn entry_names(&self) -> CoreResult<Vec<String>> {
        Ok(self.entries.iter().map(|(name, _)| name.clone()).collect())
    }

    fn read_entry(&self, name: &str) -> CoreResult<String> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, body)| body.clone())
            .ok_or_else(|| CoreError::PatchEntryNotFound {
                name: name.to_string(),
                location: self.location(),
            })
    }

    fn base_dir(&self) -> PathBuf {
        self.base_dir.clone()
    }

    fn is_embedded(&self) -> bool {
        true
    }
}
