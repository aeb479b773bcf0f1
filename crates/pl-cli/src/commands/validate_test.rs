use super::*;
use std::fs;

fn source_with(files: &[(&str, &str)]) -> (tempfile::TempDir, DirectorySource) {
    let dir = tempfile::tempdir().unwrap();
    for (name, body) in files {
        fs::write(dir.path().join(name), body).unwrap();
    }
    let source = DirectorySource::new(dir.path());
    (dir, source)
}

#[test]
fn test_clean_directory_has_no_issues() {
    let (_dir, source) = source_with(&[
        ("patch1_create.sql", "CREATE TABLE t (id INT);"),
        ("patch2_rows.csv", "id\n1\n"),
    ]);
    let mut ctx = ValidationContext::default();
    validate_patches(&source, &mut ctx);
    assert!(ctx.issues.is_empty());
    assert_eq!(ctx.patch_count, 2);
}

#[test]
fn test_duplicate_versions_are_errors() {
    let (_dir, source) = source_with(&[
        ("patch1_a.sql", "SELECT 1;"),
        ("patch001_b.sql", "SELECT 1;"),
    ]);
    let mut ctx = ValidationContext::default();
    validate_patches(&source, &mut ctx);
    assert_eq!(ctx.error_count(), 1);
    assert!(ctx.has_code("V003"));
    assert!(ctx.issues[0].message.contains("patch001_b.sql"));
}

#[test]
fn test_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = ValidationContext::default();
    validate_patches(&DirectorySource::new(dir.path().join("nope")), &mut ctx);
    assert!(ctx.has_code("V002"));
}

#[test]
fn test_missing_data_file() {
    let (_dir, source) = source_with(&[(
        "patch1_load.yml",
        "kind: data_load\nsource: data/absent.csv\ntable: things\n",
    )]);
    let mut ctx = ValidationContext::default();
    validate_patches(&source, &mut ctx);
    assert!(ctx.has_code("V004"));
}

#[test]
fn test_warnings_for_tasks_and_ignored_files() {
    let (_dir, source) = source_with(&[
        ("patch1_task.yml", "kind: task\ntask: rehash\n"),
        ("patch2_notes.md", "ignored"),
        ("patch_three.sql", "SELECT 1;"),
        ("patch4_empty.sql", "  \n"),
        ("README.md", "not a patch"),
    ]);
    let mut ctx = ValidationContext::default();
    validate_patches(&source, &mut ctx);
    assert_eq!(ctx.error_count(), 0);
    assert!(ctx.has_code("W001"));
    assert!(ctx.has_code("W002"));
    assert!(ctx.has_code("W003"));
    assert!(ctx.has_code("W004"));
    assert_eq!(ctx.warning_count(), 4);
}

#[test]
fn test_unusable_version_on_foreign_file_is_only_a_warning() {
    let (_dir, source) = source_with(&[
        ("patch1_init.sql", "SELECT 1;"),
        ("patch0_notes.txt", "draft"),
    ]);
    let mut ctx = ValidationContext::default();
    validate_patches(&source, &mut ctx);
    assert_eq!(ctx.error_count(), 0);
    assert!(ctx.has_code("W003"));
}

#[test]
fn test_unsupported_database_kind() {
    let mut ctx = ValidationContext::default();
    validate_database_kind("duckdb", &mut ctx);
    assert!(ctx.issues.is_empty());
    validate_database_kind("postgres", &mut ctx);
    assert!(ctx.has_code("V001"));
}

#[test]
fn test_strict_mode_fails_on_warnings() {
    let mut ctx = ValidationContext::default();
    ctx.warning("W002", "task", None);
    assert!(print_issues_and_summary(&ctx, false).is_ok());
    let err = print_issues_and_summary(&ctx, true).unwrap_err();
    assert_eq!(err.downcast_ref::<ExitCode>().map(|c| c.0), Some(EXIT_VALIDATION));
}
