//! Validate command implementation
//!
//! Runs discovery and static checks without opening the database.

use anyhow::Result;
use pl_core::{
    discover, has_patch_extension, parse_patch_file_name, DirectorySource, PatchPayload,
    PatchSource,
};
use pl_db::BackendProvider;
use std::path::Path;

use crate::cli::{GlobalArgs, ValidateArgs};
use crate::commands::common::{load_project, resolve_database, ExitCode, EXIT_VALIDATION};

/// Validation result severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single validation issue
struct ValidationIssue {
    severity: Severity,
    code: &'static str,
    message: String,
    file: Option<String>,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(
                f,
                "[{}] {}: {} ({})",
                self.severity, self.code, self.message, file
            ),
            None => write!(f, "[{}] {}: {}", self.severity, self.code, self.message),
        }
    }
}

/// Collect validation issues
#[derive(Default)]
struct ValidationContext {
    issues: Vec<ValidationIssue>,
    patch_count: usize,
}

impl ValidationContext {
    fn error(&mut self, code: &'static str, message: impl Into<String>, file: Option<String>) {
        self.issues.push(ValidationIssue {
            severity: Severity::Error,
            code,
            message: message.into(),
            file,
        });
    }

    fn warning(&mut self, code: &'static str, message: impl Into<String>, file: Option<String>) {
        self.issues.push(ValidationIssue {
            severity: Severity::Warning,
            code,
            message: message.into(),
            file,
        });
    }

    fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    #[cfg(test)]
    fn has_code(&self, code: &str) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

/// Execute the validate command
pub fn execute(args: &ValidateArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let database = resolve_database(&project, global)?;

    println!("Validating project: {}\n", project.config.name);

    let mut ctx = ValidationContext::default();
    validate_database_kind(&database.kind, &mut ctx);
    validate_patches(&project.patch_source(), &mut ctx);

    print_issues_and_summary(&ctx, args.strict)
}

/// The configured kind must have a backend.
fn validate_database_kind(kind: &str, ctx: &mut ValidationContext) {
    let provider = BackendProvider::new();
    let supported = provider.supported_kinds();
    if !supported.contains(&kind) {
        ctx.error(
            "V001",
            format!(
                "Unsupported database kind '{}' (supported: {})",
                kind,
                supported.join(", ")
            ),
            None,
        );
    }
}

/// Discover patches and check what discovery cannot.
fn validate_patches(source: &DirectorySource, ctx: &mut ValidationContext) {
    if !source.root().is_dir() {
        ctx.error(
            "V002",
            "Patch directory not found",
            Some(source.location()),
        );
        return;
    }

    check_entry_names(source, ctx);

    let catalog = match discover(source) {
        Ok(catalog) => catalog,
        Err(e) => {
            ctx.error("V003", e.to_string(), None);
            return;
        }
    };
    ctx.patch_count = catalog.len();

    for patch in &catalog {
        match &patch.payload {
            PatchPayload::SqlScript(sql) if sql.trim().is_empty() => {
                ctx.warning("W001", "SQL patch is empty", Some(patch.name.to_string()));
            }
            PatchPayload::DataLoad(spec) if spec.inline.is_none() => {
                let resource = patch.resolve_resource(&spec.source);
                if !resource.is_file() {
                    ctx.error(
                        "V004",
                        format!("Data file '{}' not found", resource.display()),
                        Some(patch.name.to_string()),
                    );
                }
            }
            PatchPayload::Task(task) => {
                ctx.warning(
                    "W002",
                    format!(
                        "Task '{}' must be registered by the application that runs this patch",
                        task.task
                    ),
                    Some(patch.name.to_string()),
                );
            }
            PatchPayload::SqlScript(_) | PatchPayload::DataLoad(_) => {}
        }
    }
}

/// Warn about files discovery will silently skip.
fn check_entry_names(source: &DirectorySource, ctx: &mut ValidationContext) {
    let Ok(names) = source.entry_names() else {
        return;
    };
    for name in names {
        let supported = has_patch_extension(&name);
        match parse_patch_file_name(&name) {
            Ok(Some(_)) | Err(_) if !supported => {
                let ext = Path::new(&name)
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default();
                ctx.warning(
                    "W003",
                    format!("Unsupported patch extension '.{}'; file is ignored", ext),
                    Some(name.clone()),
                );
            }
            Ok(None) if name.starts_with("patch") => {
                ctx.warning(
                    "W004",
                    "Name does not match patch<N>_<description>.<ext>; file is ignored",
                    Some(name.clone()),
                );
            }
            // Bad versions on patch files are reported by discovery
            _ => {}
        }
    }
}

fn print_issues_and_summary(ctx: &ValidationContext, strict: bool) -> Result<()> {
    for issue in &ctx.issues {
        println!("{}", issue);
    }

    let error_count = ctx.error_count();
    let warning_count = ctx.warning_count();

    if !ctx.issues.is_empty() {
        println!();
    }
    if error_count == 0 && (warning_count == 0 || !strict) {
        println!(
            "Validation passed: {} patches, {} errors, {} warnings",
            ctx.patch_count, error_count, warning_count
        );
        Ok(())
    } else {
        println!(
            "Validation failed{}: {} errors, {} warnings",
            if strict && error_count == 0 { " (strict mode)" } else { "" },
            error_count,
            warning_count
        );
        Err(ExitCode(EXIT_VALIDATION).into())
    }
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
