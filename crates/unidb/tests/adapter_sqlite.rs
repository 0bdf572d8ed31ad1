//! Adapter-level tests over the SQLite backend.

use std::sync::Arc;
use unidb::sqlite::SqliteDriver;
use unidb::{
    Adapter, AnsiPlatform, Connection, ConnectionParameters, Driver, Error, RecordingProfiler,
    StateErrorKind,
};

fn memory_adapter() -> Adapter<SqliteDriver> {
    Adapter::new(
        SqliteDriver::new(),
        &ConnectionParameters::default(),
        Box::new(AnsiPlatform),
    )
    .unwrap()
}

fn seeded_adapter() -> Adapter<SqliteDriver> {
    let mut adapter = memory_adapter();
    adapter
        .execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
        .unwrap();
    adapter
        .execute("INSERT INTO users (name) VALUES ('ada'), ('grace')")
        .unwrap();
    adapter
}

#[test]
fn descriptor_map_resolves_aliases_by_priority() {
    let descriptor = serde_json::json!({
        "db": "fallback.db",
        "dbname": "preferred.db",
        "user": "app",
        "username": "admin",
    });
    let params = ConnectionParameters::from_map(descriptor.as_object().unwrap()).unwrap();
    assert_eq!(params.database.as_deref(), Some("preferred.db"));
    assert_eq!(params.user.as_deref(), Some("admin"));

    let conn = SqliteDriver::new().open(&params).unwrap();
    assert_eq!(conn.path(), "preferred.db");
}

#[test]
fn query_returns_a_detached_buffered_result() {
    let mut adapter = seeded_adapter();
    let mut result = adapter.query("SELECT name FROM users ORDER BY id").unwrap();
    assert!(result.is_query_result());
    assert!(result.is_buffered());
    assert_eq!(result.len(), Some(2));

    // Detached: the connection is free for further statements while
    // the result is still held.
    adapter.execute("INSERT INTO users (name) VALUES ('edsger')").unwrap();

    result.rewind().unwrap();
    let names: Vec<String> = result
        .map(|row| row.unwrap().get_named::<String>("name").unwrap())
        .collect();
    assert_eq!(names, ["ada", "grace"]);
}

#[test]
fn execute_reports_affected_rows() {
    let mut adapter = seeded_adapter();
    let affected = adapter.execute("UPDATE users SET name = upper(name)").unwrap();
    assert_eq!(affected, 2);
}

#[test]
fn generated_value_surfaces_as_string() {
    let mut adapter = seeded_adapter();
    adapter
        .execute("INSERT INTO users (name) VALUES ('barbara')")
        .unwrap();
    let generated = adapter
        .connection_mut()
        .last_generated_value(None)
        .unwrap();
    assert_eq!(generated.as_deref(), Some("3"));
}

#[test]
fn invalid_sql_is_an_invalid_query_error_with_text() {
    let mut adapter = memory_adapter();
    let err = adapter.query("SELEKT 1").unwrap_err();
    match err {
        Error::InvalidQuery(query) => assert!(!query.message.is_empty()),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn transaction_round_trip_through_the_connection() {
    let mut adapter = seeded_adapter();
    let conn = adapter.connection_mut();
    conn.begin().unwrap();
    conn.execute("DELETE FROM users").unwrap();
    conn.rollback().unwrap();

    let remaining = adapter
        .query("SELECT COUNT(*) AS n FROM users")
        .unwrap()
        .get(0)
        .unwrap()
        .get_named::<i64>("n")
        .unwrap();
    assert_eq!(remaining, 2);
}

#[test]
fn rollback_rules_are_asymmetric_to_commit() {
    let mut adapter = memory_adapter();
    let conn = adapter.connection_mut();

    // Forgiving commit: no transaction, still fine.
    conn.commit().unwrap();

    // Strict rollback: connected (commit auto-connected) but no
    // transaction.
    match conn.rollback().unwrap_err() {
        Error::IllegalState(state) => {
            assert_eq!(state.kind, StateErrorKind::NoActiveTransaction);
        }
        other => panic!("unexpected error: {other}"),
    }

    conn.disconnect();
    match conn.rollback().unwrap_err() {
        Error::IllegalState(state) => assert_eq!(state.kind, StateErrorKind::NotConnected),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn platform_quotes_identifiers_for_the_dialect() {
    let adapter = memory_adapter();
    assert_eq!(adapter.platform().quote_identifier("user"), "\"user\"");
    assert_eq!(
        adapter.platform().quote_identifier_chain(&["main", "users"]),
        "\"main\".\"users\""
    );
}

#[test]
fn profiler_set_through_the_adapter_records_queries() {
    let mut adapter = memory_adapter();
    let profiler = Arc::new(RecordingProfiler::new());
    adapter.set_profiler(Some(profiler.clone()));

    adapter.query("SELECT 1").unwrap();
    adapter.query("no such syntax").unwrap_err();

    let entries = profiler.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].sql, "SELECT 1");
}

#[test]
fn capabilities_reflect_the_backend() {
    let adapter = memory_adapter();
    let caps = adapter.capabilities();
    assert!(caps.prepared_statements);
    assert!(caps.last_insert_id);
    assert!(!caps.sequences);
}
