//! SQL identifier quoting utilities
//!
//! Data-load patches build INSERT/DELETE statements from table and column
//! names found in files, so every identifier is quoted before it reaches SQL.

/// Quote a SQL identifier, doubling any embedded double quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a potentially schema-qualified name (e.g. `schema.table`).
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a potentially schema-qualified name into (schema, table), using
/// `default_schema` when no `.` is present.
pub fn split_qualified_name<'a>(name: &'a str, default_schema: &'a str) -> (&'a str, &'a str) {
    match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => (default_schema, name),
    }
}

/// Escape a value for use inside a single-quoted SQL string literal.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// `INSERT INTO <table> (<cols>) VALUES (?, ?, ...)`
pub fn insert_statement(table: &str, columns: &[&str]) -> String {
    let cols: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    let params = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_qualified(table),
        cols.join(", "),
        params
    )
}

/// `DELETE FROM <table> WHERE k1 = ? AND k2 = ?`
pub fn delete_by_key_statement(table: &str, key_columns: &[&str]) -> String {
    let predicate: Vec<String> = key_columns
        .iter()
        .map(|c| format!("{} = ?", quote_ident(c)))
        .collect();
    format!(
        "DELETE FROM {} WHERE {}",
        quote_qualified(table),
        predicate.join(" AND ")
    )
}
