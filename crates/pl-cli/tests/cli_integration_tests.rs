//! Integration tests for the `pl` binary

use std::fs;
use std::path::Path;
use std::process::Command;

const SAMPLE_PROJECT: &str = "tests/fixtures/sample_project";

/// Path to the compiled pl binary
fn pl_bin() -> String {
    env!("CARGO_BIN_EXE_pl").to_string()
}

/// Run `pl` and return (stdout, stderr, exit code).
fn run_pl(args: &[&str]) -> (String, String, Option<i32>) {
    let output = Command::new(pl_bin())
        .args(args)
        .env_remove("PL_TARGET")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute pl with args {:?}: {}", args, e));
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code(),
    )
}

/// Project on disk with a file-backed SQLite database.
fn sqlite_project(patches: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("patchlevel.yml"),
        "name: shop\ndatabase:\n  kind: sqlite\n  path: shop.sqlite\n",
    )
    .unwrap();
    fs::create_dir(dir.path().join("patches")).unwrap();
    for (name, body) in patches {
        fs::write(dir.path().join("patches").join(name), body).unwrap();
    }
    dir
}

fn project_arg(dir: &Path) -> String {
    dir.display().to_string()
}

#[test]
fn test_validate_sample_project() {
    let (stdout, _, code) = run_pl(&["validate", "-p", SAMPLE_PROJECT]);
    assert_eq!(code, Some(0), "stdout: {}", stdout);
    assert!(stdout.contains("Validation passed: 4 patches"));
}

#[test]
fn test_migrate_sample_project_in_memory() {
    let (stdout, stderr, code) = run_pl(&["migrate", "-p", SAMPLE_PROJECT]);
    assert_eq!(code, Some(0), "stderr: {}", stderr);

    let lines: Vec<&str> = stdout.lines().filter(|l| l.contains('✓')).collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains("patch1_create_catalog.sql"));
    assert!(lines[1].contains("patch2_countries.csv"));
    assert!(lines[2].contains("patch3_load_products.yml"));
    assert!(lines[3].contains("patch10_add_origin.sql"));
    assert!(stdout.contains("level 0 → 10"));
}

#[test]
fn test_migrate_sample_project_on_sqlite_target() {
    let (stdout, stderr, code) = run_pl(&["migrate", "-p", SAMPLE_PROJECT, "-t", "scratch"]);
    assert_eq!(code, Some(0), "stderr: {}", stderr);
    assert!(stdout.contains("sqlite::memory:"));
}

#[test]
fn test_unknown_target_is_config_error() {
    let (_, stderr, code) = run_pl(&["status", "-p", SAMPLE_PROJECT, "-t", "nowhere"]);
    assert_eq!(code, Some(3));
    assert!(stderr.contains("nowhere"));
}

#[test]
fn test_status_json_lists_pending() {
    let (stdout, stderr, code) = run_pl(&["status", "-p", SAMPLE_PROJECT, "--output", "json"]);
    assert_eq!(code, Some(0), "stderr: {}", stderr);

    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["project"], "sample_project");
    assert_eq!(report["current_level"], 0);
    assert_eq!(report["latest_version"], 10);
    let pending = report["pending"].as_array().unwrap();
    assert_eq!(pending.len(), 4);
    assert_eq!(pending[1]["kind"], "data_load");
}

#[test]
fn test_migrate_then_rerun_is_up_to_date() {
    let dir = sqlite_project(&[
        ("patch1_create.sql", "CREATE TABLE orders (id INTEGER);"),
        ("patch2_seed.sql", "INSERT INTO orders VALUES (1), (2);"),
    ]);
    let project = project_arg(dir.path());

    let (_, stderr, code) = run_pl(&["migrate", "-p", &project]);
    assert_eq!(code, Some(0), "stderr: {}", stderr);
    assert!(dir.path().join("shop.sqlite").exists());

    let (stdout, _, code) = run_pl(&["migrate", "-p", &project]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("Already at level 2"));

    let (stdout, _, _) = run_pl(&["status", "-p", &project]);
    assert!(stdout.contains("Current level: 2"));
    assert!(stdout.contains("Up to date."));
}

#[test]
fn test_failed_patch_exits_with_database_code() {
    let dir = sqlite_project(&[
        ("patch1_create.sql", "CREATE TABLE orders (id INTEGER);"),
        ("patch2_broken.sql", "INSERT INTO nope VALUES (1);"),
        ("patch3_never.sql", "CREATE TABLE never (id INTEGER);"),
    ]);
    let project = project_arg(dir.path());

    let (stdout, _, code) = run_pl(&["migrate", "-p", &project]);
    assert_eq!(code, Some(4));
    assert!(stdout.contains("✓ patch1_create.sql"));
    assert!(stdout.contains("✗ patch2_broken.sql"));
    assert!(!stdout.contains("patch3_never.sql"));
    assert!(stdout.contains("level is 1"));
}

#[test]
fn test_dry_run_and_target_version() {
    let dir = sqlite_project(&[
        ("patch1_a.sql", "CREATE TABLE a (id INTEGER);"),
        ("patch2_b.sql", "CREATE TABLE b (id INTEGER);"),
        ("patch3_c.sql", "CREATE TABLE c (id INTEGER);"),
    ]);
    let project = project_arg(dir.path());

    let (stdout, _, code) = run_pl(&["migrate", "-p", &project, "--dry-run", "--to", "2"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("Would apply 2 patches"));
    let (stdout, _, _) = run_pl(&["status", "-p", &project]);
    assert!(stdout.contains("Current level: 0"));

    let (stdout, _, code) = run_pl(&["migrate", "-p", &project, "--to", "2"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("level 0 → 2"));
}

#[test]
fn test_duplicate_versions_exit_validation() {
    let dir = sqlite_project(&[
        ("patch1_a.sql", "SELECT 1;"),
        ("patch01_b.sql", "SELECT 1;"),
    ]);
    let project = project_arg(dir.path());

    let (_, stderr, code) = run_pl(&["migrate", "-p", &project]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("[P001]"));

    let (stdout, _, code) = run_pl(&["validate", "-p", &project]);
    assert_eq!(code, Some(1));
    assert!(stdout.contains("V003"));
}

#[test]
fn test_missing_config_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_pl(&["status", "-p", &project_arg(dir.path())]);
    assert_eq!(code, Some(3));
    assert!(stderr.contains("[C001]"));
}

#[test]
fn test_new_creates_next_patch() {
    let dir = sqlite_project(&[("patch7_existing.sql", "SELECT 1;")]);
    let project = project_arg(dir.path());

    let (stdout, _, code) = run_pl(&["new", "-p", &project, "Add Customers"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("patch8_add_customers.sql"));
    assert!(dir
        .path()
        .join("patches/patch8_add_customers.sql")
        .exists());

    let (_, _, code) = run_pl(&["new", "-p", &project, "rates", "--kind", "data-load"]);
    assert_eq!(code, Some(0));
    assert!(dir.path().join("patches/patch9_rates.yml").exists());
}
