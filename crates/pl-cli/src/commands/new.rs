//! New command implementation: scaffold the next patch file

use anyhow::{Context, Result};
use chrono::Utc;
use pl_core::config::is_valid_identifier;
use pl_core::{discover, DirectorySource};
use std::path::Path;

use crate::cli::{GlobalArgs, NewArgs, NewPatchKind};
use crate::commands::common::{fail, load_project, EXIT_VALIDATION};

/// Execute the new command
pub fn execute(args: &NewArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let slug = slugify(&args.description);
    if slug.is_empty() {
        return Err(fail(
            EXIT_VALIDATION,
            format!("'{}' has no usable characters for a file name", args.description),
        ));
    }

    let patch_dir = project.patch_dir();
    let version = next_version(&patch_dir)?;
    let created = Utc::now().format("%Y-%m-%d").to_string();
    let (file_name, body) = scaffold(version, &slug, args.kind, &created);

    std::fs::create_dir_all(&patch_dir)
        .with_context(|| format!("Failed to create {}", patch_dir.display()))?;
    let path = patch_dir.join(&file_name);
    if path.exists() {
        return Err(fail(
            EXIT_VALIDATION,
            format!("{} already exists", path.display()),
        ));
    }
    std::fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Created {}", path.display());
    Ok(())
}

/// One past the highest existing version; 1 for a missing directory.
fn next_version(patch_dir: &Path) -> Result<u64> {
    if !patch_dir.exists() {
        return Ok(1);
    }
    let catalog = discover(&DirectorySource::new(patch_dir))
        .map_err(|e| fail(EXIT_VALIDATION, e))?;
    catalog
        .latest_version()
        .checked_add(1)
        .ok_or_else(|| fail(EXIT_VALIDATION, "no patch versions left"))
}

/// Lowercase the description and collapse everything else into `_`.
fn slugify(description: &str) -> String {
    let mut slug = String::with_capacity(description.len());
    for c in description.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

/// `slug` as a table or task name. Slugs may start with a digit; identifiers may not.
fn identifier_for(slug: &str) -> String {
    if is_valid_identifier(slug) {
        slug.to_string()
    } else {
        format!("t_{slug}")
    }
}

/// File name and starter body for a new patch.
fn scaffold(version: u64, slug: &str, kind: NewPatchKind, date: &str) -> (String, String) {
    let ident = identifier_for(slug);
    match kind {
        NewPatchKind::Sql => (
            format!("patch{}_{}.sql", version, slug),
            format!("-- {}\n-- Created {}\n\n", slug.replace('_', " "), date),
        ),
        NewPatchKind::DataLoad => (
            format!("patch{}_{}.yml", version, slug),
            format!(
                "# Created {date}\nkind: data_load\nsource: data/{slug}.csv\ntable: {ident}\nmode: insert\n"
            ),
        ),
        NewPatchKind::Task => (
            format!("patch{}_{}.yml", version, slug),
            format!("# Created {date}\nkind: task\ntask: {ident}\nparams: {{}}\n"),
        ),
    }
}

#[cfg(test)]
#[path = "new_test.rs"]
mod tests;
