use super::*;
use tempfile::TempDir;

#[test]
fn test_parse_minimal_config() {
    let config = Config::parse("name: inventory\n").unwrap();
    assert_eq!(config.name, "inventory");
    assert_eq!(config.patch_path, "patches");
    assert_eq!(config.launcher, Launcher::Apply);
    assert_eq!(config.database.kind, "duckdb");
    assert!(config.database.is_in_memory());
    assert_eq!(config.ledger.table, DEFAULT_LEDGER_TABLE);

    let root = PathBuf::from("/tmp/project");
    assert_eq!(config.patch_path_absolute(&root), root.join("patches"));
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
name: inventory
patch_path: db/patches
launcher: plan
database:
  kind: sqlite
  path: ./inventory.sqlite
ledger:
  table: meta.patch_level
targets:
  prod:
    database:
      kind: duckdb
      path: ./prod.duckdb
  staging: {}
"#;
    let config = Config::parse(yaml).unwrap();
    assert_eq!(config.patch_path, "db/patches");
    assert_eq!(config.launcher, Launcher::Plan);
    assert_eq!(config.database.kind, "sqlite");
    assert_eq!(config.ledger.table, "meta.patch_level");
    assert_eq!(config.available_targets(), vec!["prod", "staging"]);
}

#[test]
fn test_database_config_target_override() {
    let yaml = r#"
name: inventory
database:
  kind: duckdb
  path: ./dev.duckdb
targets:
  prod:
    database:
      kind: sqlite
      path: ./prod.sqlite
  staging: {}
"#;
    let config = Config::parse(yaml).unwrap();

    let base = config.database_config(None).unwrap();
    assert_eq!(base.path, "./dev.duckdb");

    let prod = config.database_config(Some("prod")).unwrap();
    assert_eq!(prod.kind, "sqlite");
    assert_eq!(prod.path, "./prod.sqlite");

    // A target without a database block falls back to the base config
    let staging = config.database_config(Some("staging")).unwrap();
    assert_eq!(staging.path, "./dev.duckdb");
}

#[test]
fn test_unknown_target_lists_available() {
    let config = Config::parse("name: inventory\ntargets:\n  prod: {}\n").unwrap();
    let err = config.database_config(Some("qa")).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("[C003]"));
    assert!(msg.contains("'qa'"));
    assert!(msg.contains("prod"));
}

#[test]
fn test_unknown_database_kind_is_accepted_at_parse_time() {
    // Rejection happens at connection time, not while parsing
    let config = Config::parse("name: inventory\ndatabase:\n  kind: oracle\n").unwrap();
    assert_eq!(config.database.kind, "oracle");
}

#[test]
fn test_empty_name_rejected() {
    let err = Config::parse("name: \"\"\n").unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_invalid_ledger_table_rejected() {
    let err = Config::parse("name: inventory\nledger:\n  table: \"level; DROP TABLE x\"\n")
        .unwrap_err();
    assert!(err.to_string().contains("not a valid SQL identifier"));
}

#[test]
fn test_unknown_field_rejected() {
    let err = Config::parse("name: inventory\nmodel_paths: [models]\n").unwrap_err();
    assert!(matches!(err, CoreError::ConfigParseError { .. }));
}

#[test]
fn test_password_redacted_in_debug() {
    let yaml = r#"
name: inventory
database:
  kind: duckdb
  user: admin
  password: hunter2
"#;
    let config = Config::parse(yaml).unwrap();
    let debug = format!("{:?}", config.database);
    assert!(!debug.contains("hunter2"));
    assert!(debug.contains("***"));
}

#[test]
fn test_display_location() {
    let file = DatabaseConfig::file("sqlite", "./app.sqlite");
    assert_eq!(file.display_location(), "sqlite:./app.sqlite");

    let remote = DatabaseConfig {
        kind: "postgres".to_string(),
        host: Some("db.internal".to_string()),
        port: Some(5432),
        ..DatabaseConfig::default()
    };
    assert_eq!(remote.display_location(), "postgres://db.internal:5432");
}

#[test]
fn test_is_valid_identifier() {
    assert!(is_valid_identifier("patch_level"));
    assert!(is_valid_identifier("meta.patch_level"));
    assert!(!is_valid_identifier("1table"));
    assert!(!is_valid_identifier("a.b.c"));
    assert!(!is_valid_identifier("level;"));
}

#[test]
fn test_load_from_dir() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("patchlevel.yaml"), "name: from_yaml\n").unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.name, "from_yaml");
}

#[test]
fn test_load_from_dir_missing() {
    let dir = TempDir::new().unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}
