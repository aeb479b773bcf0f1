use super::*;

#[test]
fn test_in_memory() {
    let db = SqliteBackend::in_memory().unwrap();
    assert_eq!(db.db_type(), "sqlite");
}

#[test]
fn test_execute_batch_runs_every_statement() {
    let db = SqliteBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE a (id INTEGER);
         CREATE TABLE b (id INTEGER);
         INSERT INTO a VALUES (1), (2);",
    )
    .unwrap();
    assert!(db.relation_exists("a").unwrap());
    assert!(db.relation_exists("b").unwrap());
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM a").unwrap(), Some(2));
}

#[test]
fn test_execute_batch_drains_select_statements() {
    let db = SqliteBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE a (id INTEGER);
         SELECT 1;
         INSERT INTO a VALUES (5);",
    )
    .unwrap();
    assert_eq!(db.query_i64("SELECT id FROM a").unwrap(), Some(5));
}

#[test]
fn test_execute_batch_reports_failing_statement_index() {
    let db = SqliteBackend::in_memory().unwrap();
    let err = db
        .execute_batch(
            "CREATE TABLE a (id INTEGER);
             INSERT INTO missing VALUES (1);
             CREATE TABLE never (id INTEGER);",
        )
        .unwrap_err();
    match err {
        DbError::BatchStatementFailed { index, message } => {
            assert_eq!(index, 2);
            assert!(message.contains("missing"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Statements before the failure ran; those after did not
    assert!(db.relation_exists("a").unwrap());
    assert!(!db.relation_exists("never").unwrap());
}

#[test]
fn test_failed_batch_inside_transaction_is_rolled_back() {
    let db = SqliteBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE a (id INTEGER)").unwrap();
    let err = db.execute_batch(
        "BEGIN;
         INSERT INTO a VALUES (1);
         INSERT INTO missing VALUES (1);
         COMMIT;",
    );
    assert!(err.is_err());
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM a").unwrap(), Some(0));
    // Connection is usable for a new transaction
    db.execute_batch("BEGIN; INSERT INTO a VALUES (2); COMMIT;")
        .unwrap();
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM a").unwrap(), Some(1));
}

#[test]
fn test_execute_with_params_and_query_rows() {
    let db = SqliteBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE users (id INTEGER, name TEXT, score REAL, active INTEGER)")
        .unwrap();
    db.execute_with_params(
        "INSERT INTO users VALUES (?, ?, ?, ?)",
        &[
            SqlValue::Integer(1),
            SqlValue::from("Alice"),
            SqlValue::Real(9.5),
            SqlValue::Boolean(true),
        ],
    )
    .unwrap();
    db.execute_with_params(
        "INSERT INTO users VALUES (?, ?, ?, ?)",
        &[
            SqlValue::Integer(2),
            SqlValue::Null,
            SqlValue::Null,
            SqlValue::Boolean(false),
        ],
    )
    .unwrap();

    let rows = db
        .query_rows("SELECT id, name, score, active FROM users ORDER BY id")
        .unwrap();
    assert_eq!(
        rows,
        vec![
            vec![
                SqlValue::Integer(1),
                SqlValue::Text("Alice".to_string()),
                SqlValue::Real(9.5),
                SqlValue::Integer(1),
            ],
            vec![
                SqlValue::Integer(2),
                SqlValue::Null,
                SqlValue::Null,
                SqlValue::Integer(0),
            ],
        ]
    );
}

#[test]
fn test_text_param_uses_integer_affinity() {
    let db = SqliteBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE nums (n INTEGER)").unwrap();
    db.execute_with_params("INSERT INTO nums VALUES (?)", &[SqlValue::from("42")])
        .unwrap();
    assert_eq!(
        db.query_rows("SELECT n FROM nums").unwrap(),
        vec![vec![SqlValue::Integer(42)]]
    );
}

#[test]
fn test_missing_table_maps_to_table_not_found() {
    let db = SqliteBackend::in_memory().unwrap();
    let err = db.query_rows("SELECT * FROM nope").unwrap_err();
    assert!(matches!(err, DbError::TableNotFound(_)));
}

#[test]
fn test_relation_exists_unknown_schema() {
    let db = SqliteBackend::in_memory().unwrap();
    assert!(!db.relation_exists("elsewhere.t").unwrap());
    assert!(!db.relation_exists("elsewhere.patch_level").unwrap());
}

#[test]
fn test_relation_exists_in_attached_schema() {
    let db = SqliteBackend::in_memory().unwrap();
    db.execute_batch("ATTACH DATABASE ':memory:' AS aux; CREATE TABLE aux.orders (id INTEGER);")
        .unwrap();
    assert!(db.relation_exists("aux.orders").unwrap());
    assert!(!db.relation_exists("aux.missing").unwrap());
    assert!(!db.relation_exists("orders").unwrap());
}

#[test]
fn test_relation_exists_for_views() {
    let db = SqliteBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE t (id INTEGER); CREATE VIEW v AS SELECT id FROM t;")
        .unwrap();
    assert!(db.relation_exists("v").unwrap());
    assert!(db.relation_exists("main.t").unwrap());
}

#[test]
fn test_file_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.sqlite");
    {
        let db = SqliteBackend::from_path(&path).unwrap();
        db.execute_batch("CREATE TABLE kept (id INTEGER); INSERT INTO kept VALUES (7);")
            .unwrap();
    }
    let db = SqliteBackend::new(path.to_str().unwrap()).unwrap();
    assert_eq!(db.query_i64("SELECT id FROM kept").unwrap(), Some(7));
}
