//! Patch catalog discovery.
//!
//! The catalog is rebuilt from its source on every run: entries following
//! the `patch<digits>_<description>.<ext>` convention are classified, checked
//! for version collisions, and sorted by numeric version.

use crate::config::is_valid_identifier;
use crate::declaration::{parse_declaration, DataLoadSpec};
use crate::error::{CoreError, CoreResult};
use crate::patch::{has_patch_extension, parse_patch_file_name, Patch, PatchName, PatchPayload};
use crate::source::PatchSource;
use std::collections::HashMap;

/// Ordered, duplicate-free set of patches.
#[derive(Debug, Clone, Default)]
pub struct PatchCatalog {
    patches: Vec<Patch>,
}

impl PatchCatalog {
    /// Build a catalog from already-constructed patches, enforcing the same
    /// uniqueness and ordering rules as [`discover`].
    pub fn from_patches(mut patches: Vec<Patch>) -> CoreResult<Self> {
        check_unique_versions(&patches)?;
        patches.sort_by_key(|p| p.version);
        Ok(Self { patches })
    }

    /// All patches, ascending by version.
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Patches with `version > level`, ascending.
    pub fn pending(&self, level: u64) -> impl Iterator<Item = &Patch> {
        self.patches.iter().filter(move |p| p.version > level)
    }

    /// Highest version in the catalog, or 0 when empty.
    pub fn latest_version(&self) -> u64 {
        self.patches.last().map(|p| p.version).unwrap_or(0)
    }

    /// Look up a patch by version.
    pub fn get(&self, version: u64) -> Option<&Patch> {
        self.patches
            .binary_search_by_key(&version, |p| p.version)
            .ok()
            .map(|idx| &self.patches[idx])
    }

    /// Number of patches.
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

impl<'a> IntoIterator for &'a PatchCatalog {
    type Item = &'a Patch;
    type IntoIter = std::slice::Iter<'a, Patch>;

    fn into_iter(self) -> Self::IntoIter {
        self.patches.iter()
    }
}

/// Scan `source` and return its patches in ascending version order.
pub fn discover(source: &dyn PatchSource) -> CoreResult<PatchCatalog> {
    let base_dir = source.base_dir();
    let mut names = source.entry_names()?;
    // Stable input order keeps duplicate reports deterministic
    names.sort();

    let mut patches = Vec::new();
    for name in names {
        // Extension first, so no unrelated file can fail discovery
        if !has_patch_extension(&name) {
            log::debug!("Skipping '{}': not a patch file type", name);
            continue;
        }
        let Some(parsed) = parse_patch_file_name(&name)? else {
            log::debug!("Skipping '{}': not a patch file name", name);
            continue;
        };

        let payload = match parsed.extension.to_ascii_lowercase().as_str() {
            "sql" => PatchPayload::SqlScript(source.read_entry(&name)?),
            "csv" => {
                if !is_valid_identifier(parsed.description) {
                    return Err(CoreError::PatchParseError {
                        name: name.clone(),
                        message: format!(
                            "'{}' cannot be used as a table name",
                            parsed.description
                        ),
                    });
                }
                let mut spec = DataLoadSpec::csv(name.clone(), parsed.description);
                if source.is_embedded() {
                    spec.inline = Some(source.read_entry(&name)?);
                }
                PatchPayload::DataLoad(spec)
            }
            // yml | yaml
            _ => parse_declaration(&name, &source.read_entry(&name)?)?,
        };

        patches.push(Patch {
            version: parsed.version,
            description: parsed.description.to_string(),
            name: PatchName::new(name.clone()),
            base_dir: base_dir.clone(),
            payload,
        });
    }

    log::debug!(
        "Discovered {} patch(es) in {}",
        patches.len(),
        source.location()
    );
    PatchCatalog::from_patches(patches)
}

fn check_unique_versions(patches: &[Patch]) -> CoreResult<()> {
    let mut seen: HashMap<u64, &PatchName> = HashMap::with_capacity(patches.len());
    for patch in patches {
        if let Some(first) = seen.insert(patch.version, &patch.name) {
            return Err(CoreError::DuplicatePatchVersion {
                version: patch.version,
                first: first.to_string(),
                second: patch.name.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
