//! Handshake and transaction sequencing tests against a scripted
//! client.

use std::collections::VecDeque;
use std::sync::Arc;
use unidb_core::error::{Error, StateErrorKind};
use unidb_core::{
    ColumnInfo, Connection, ConnectionParameters, RecordingProfiler, Row, RowStream, Statement,
    Value,
};
use unidb_mysql::{ConnectTarget, MysqlClient, MysqlConnection, MysqlOption, QueryOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    SetOption(String),
    SetTls,
    Connect,
    SetCharset(String),
    Query(String),
    ExecuteStatement(String),
    Autocommit(bool),
    Commit,
    Rollback,
    Close,
}

/// What the script makes the next query produce.
enum Scripted {
    Rows(Vec<String>, Vec<Vec<Value>>),
    Done(u64),
    Fail(String),
}

#[derive(Default)]
struct MockClient {
    calls: Vec<Call>,
    fail_connect: Option<String>,
    pending: Option<(i32, String)>,
    insert_id: u64,
    script: VecDeque<Scripted>,
}

impl MockClient {
    fn scripted(mut self, outcome: Scripted) -> Self {
        self.script.push_back(outcome);
        self
    }

    fn pop_outcome(&mut self, sql: &str) -> unidb_core::error::Result<QueryOutcome> {
        match self.script.pop_front() {
            None | Some(Scripted::Done(0)) => Ok(QueryOutcome::Done { affected: 0 }),
            Some(Scripted::Done(n)) => Ok(QueryOutcome::Done { affected: n }),
            Some(Scripted::Rows(names, rows)) => {
                let columns = Arc::new(ColumnInfo::new(names));
                Ok(QueryOutcome::Rows(Box::new(FixedRows {
                    columns,
                    rows: rows.into(),
                })))
            }
            Some(Scripted::Fail(message)) => Err(Error::InvalidQuery(unidb_core::QueryError {
                message,
                sql: Some(sql.to_string()),
                code: Some(1064),
            })),
        }
    }
}

struct FixedRows {
    columns: Arc<ColumnInfo>,
    rows: VecDeque<Vec<Value>>,
}

impl RowStream for FixedRows {
    fn next_row(&mut self) -> Option<unidb_core::error::Result<Row>> {
        let values = self.rows.pop_front()?;
        Some(Ok(Row::with_columns(Arc::clone(&self.columns), values)))
    }

    fn columns(&self) -> Arc<ColumnInfo> {
        Arc::clone(&self.columns)
    }
}

impl MysqlClient for MockClient {
    fn set_option(&mut self, option: &MysqlOption) -> unidb_core::error::Result<()> {
        self.calls.push(Call::SetOption(format!("{option:?}")));
        Ok(())
    }

    fn set_tls(&mut self, _tls: &unidb_core::TlsOptions) -> unidb_core::error::Result<()> {
        self.calls.push(Call::SetTls);
        Ok(())
    }

    fn connect(&mut self, _target: &ConnectTarget) -> unidb_core::error::Result<()> {
        self.calls.push(Call::Connect);
        match self.fail_connect.take() {
            Some(message) => Err(Error::connection(message)),
            None => Ok(()),
        }
    }

    fn pending_error(&self) -> Option<(i32, String)> {
        self.pending.clone()
    }

    fn set_charset(&mut self, charset: &str) -> unidb_core::error::Result<()> {
        self.calls.push(Call::SetCharset(charset.to_string()));
        Ok(())
    }

    fn query(&mut self, sql: &str) -> unidb_core::error::Result<QueryOutcome> {
        self.calls.push(Call::Query(sql.to_string()));
        self.pop_outcome(sql)
    }

    fn execute_statement(
        &mut self,
        sql: &str,
        _params: &[Value],
    ) -> unidb_core::error::Result<QueryOutcome> {
        self.calls.push(Call::ExecuteStatement(sql.to_string()));
        self.pop_outcome(sql)
    }

    fn autocommit(&mut self, enabled: bool) -> unidb_core::error::Result<()> {
        self.calls.push(Call::Autocommit(enabled));
        Ok(())
    }

    fn commit(&mut self) -> unidb_core::error::Result<()> {
        self.calls.push(Call::Commit);
        Ok(())
    }

    fn rollback(&mut self) -> unidb_core::error::Result<()> {
        self.calls.push(Call::Rollback);
        Ok(())
    }

    fn insert_id(&mut self) -> u64 {
        self.insert_id
    }

    fn close(&mut self) {
        self.calls.push(Call::Close);
    }
}

fn connection(client: MockClient, params: &ConnectionParameters) -> MysqlConnection<MockClient> {
    MysqlConnection::new(client, params).unwrap()
}

fn position(calls: &[Call], wanted: &Call) -> Option<usize> {
    calls.iter().position(|c| c == wanted)
}

#[test]
fn tls_setup_precedes_handshake_when_requested() {
    let params = ConnectionParameters::default().use_ssl(true);
    let mut conn = connection(MockClient::default(), &params);
    conn.connect().unwrap();

    let calls = &conn.client().calls;
    let tls = position(calls, &Call::SetTls).expect("TLS setup missing");
    let handshake = position(calls, &Call::Connect).unwrap();
    assert!(tls < handshake);
}

#[test]
fn socket_path_overrides_tls() {
    let params = ConnectionParameters::default()
        .use_ssl(true)
        .socket("/var/run/mysqld/mysqld.sock");
    let mut conn = connection(MockClient::default(), &params);
    conn.connect().unwrap();
    assert!(position(&conn.client().calls, &Call::SetTls).is_none());
}

#[test]
fn no_tls_setup_without_use_ssl() {
    let mut conn = connection(MockClient::default(), &ConnectionParameters::default());
    conn.connect().unwrap();
    assert!(position(&conn.client().calls, &Call::SetTls).is_none());
}

#[test]
fn handshake_sequence_is_options_tls_connect_charset() {
    let params = ConnectionParameters::default()
        .use_ssl(true)
        .charset("utf8mb4")
        .driver_option("connect_timeout", 5);
    let mut conn = connection(MockClient::default(), &params);
    conn.connect().unwrap();

    let calls = &conn.client().calls;
    let option = position(calls, &Call::SetOption("ConnectTimeoutSecs(5)".into())).unwrap();
    let tls = position(calls, &Call::SetTls).unwrap();
    let handshake = position(calls, &Call::Connect).unwrap();
    let charset = position(calls, &Call::SetCharset("utf8mb4".into())).unwrap();
    assert!(option < tls && tls < handshake && handshake < charset);
}

#[test]
fn connect_is_idempotent() {
    let mut conn = connection(MockClient::default(), &ConnectionParameters::default());
    conn.connect().unwrap();
    conn.connect().unwrap();
    let connects = conn
        .client()
        .calls
        .iter()
        .filter(|c| **c == Call::Connect)
        .count();
    assert_eq!(connects, 1);
}

#[test]
fn handshake_failure_leaves_no_connection() {
    let client = MockClient {
        fail_connect: Some("Access denied for user".to_string()),
        ..MockClient::default()
    };
    let mut conn = connection(client, &ConnectionParameters::default());
    let err = conn.connect().unwrap_err();
    assert!(err.is_connection_error());
    assert!(!conn.is_connected());
    assert!(position(&conn.client().calls, &Call::Close).is_some());
}

#[test]
fn post_handshake_error_state_fails_connect() {
    let client = MockClient {
        pending: Some((2013, "Lost connection during handshake".to_string())),
        ..MockClient::default()
    };
    let mut conn = connection(client, &ConnectionParameters::default());
    let err = conn.connect().unwrap_err();
    assert!(err.is_connection_error());
    assert_eq!(err.native_code(), Some(2013));
    assert!(!conn.is_connected());
}

#[test]
fn malformed_driver_option_fails_construction() {
    let params = ConnectionParameters::default().driver_option("connect_timeout", "soon");
    assert!(matches!(
        MysqlConnection::new(MockClient::default(), &params),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn unknown_driver_option_is_ignored() {
    let params = ConnectionParameters::default().driver_option("compress", 1);
    let mut conn = connection(MockClient::default(), &params);
    conn.connect().unwrap();
    assert!(
        !conn
            .client()
            .calls
            .iter()
            .any(|c| matches!(c, Call::SetOption(_)))
    );
}

#[test]
fn query_rows_become_a_streamed_result() {
    let client = MockClient::default().scripted(Scripted::Rows(
        vec!["id".to_string()],
        vec![vec![Value::Text("1".into())], vec![Value::Text("2".into())]],
    ));
    let mut conn = connection(client, &ConnectionParameters::default());
    let result = conn.execute("SELECT id FROM t").unwrap();
    assert!(result.is_query_result());
    assert!(!result.is_buffered());
    let ids: Vec<String> = result
        .map(|row| row.unwrap().get_named::<String>("id").unwrap())
        .collect();
    assert_eq!(ids, ["1", "2"]);
}

#[test]
fn rowless_query_reports_affected_and_generated() {
    let client = MockClient {
        insert_id: 41,
        ..MockClient::default()
    }
    .scripted(Scripted::Done(3));
    let mut conn = connection(client, &ConnectionParameters::default());
    let result = conn.execute("UPDATE t SET v = 1").unwrap();
    assert!(!result.is_query_result());
    assert_eq!(result.affected_rows(), 3);
    assert_eq!(result.generated_value(), Some("41"));
}

#[test]
fn native_failure_surfaces_as_invalid_query() {
    let client =
        MockClient::default().scripted(Scripted::Fail("You have an error in your SQL".into()));
    let mut conn = connection(client, &ConnectionParameters::default());
    let err = conn.execute("SELEKT 1").unwrap_err();
    match err {
        Error::InvalidQuery(query) => {
            assert!(!query.message.is_empty());
            assert_eq!(query.sql.as_deref(), Some("SELEKT 1"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn begin_disables_autocommit() {
    let mut conn = connection(MockClient::default(), &ConnectionParameters::default());
    conn.begin().unwrap();
    assert!(conn.in_transaction());
    assert!(position(&conn.client().calls, &Call::Autocommit(false)).is_some());
}

#[test]
fn commit_restores_autocommit() {
    let mut conn = connection(MockClient::default(), &ConnectionParameters::default());
    conn.begin().unwrap();
    conn.commit().unwrap();
    assert!(!conn.in_transaction());

    let calls = &conn.client().calls;
    let commit = position(calls, &Call::Commit).unwrap();
    let restore = position(calls, &Call::Autocommit(true)).unwrap();
    assert!(commit < restore);
}

#[test]
fn commit_without_transaction_is_silent() {
    let mut conn = connection(MockClient::default(), &ConnectionParameters::default());
    conn.commit().unwrap();
    assert!(position(&conn.client().calls, &Call::Commit).is_none());
}

#[test]
fn rollback_checks_connection_before_transaction_state() {
    let mut conn = connection(MockClient::default(), &ConnectionParameters::default());
    match conn.rollback().unwrap_err() {
        Error::IllegalState(state) => assert_eq!(state.kind, StateErrorKind::NotConnected),
        other => panic!("unexpected error: {other}"),
    }

    conn.connect().unwrap();
    match conn.rollback().unwrap_err() {
        Error::IllegalState(state) => {
            assert_eq!(state.kind, StateErrorKind::NoActiveTransaction);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn rollback_restores_autocommit() {
    let mut conn = connection(MockClient::default(), &ConnectionParameters::default());
    conn.begin().unwrap();
    conn.rollback().unwrap();
    assert!(!conn.in_transaction());

    let calls = &conn.client().calls;
    let rollback = position(calls, &Call::Rollback).unwrap();
    let restore = position(calls, &Call::Autocommit(true)).unwrap();
    assert!(rollback < restore);
}

#[test]
fn prepared_statement_counts_and_checks_placeholders() {
    let mut conn = connection(MockClient::default(), &ConnectionParameters::default());
    let mut stmt = conn
        .prepare("SELECT * FROM t WHERE a = ? AND b = '?'")
        .unwrap();
    assert_eq!(stmt.parameter_count(), 1);
    assert!(matches!(
        stmt.execute(&[]).unwrap_err(),
        Error::InvalidQuery(_)
    ));
    stmt.execute(&[Value::Int(7)]).unwrap();
}

#[test]
fn profiler_observes_execution() {
    let mut conn = connection(MockClient::default(), &ConnectionParameters::default());
    let profiler = Arc::new(RecordingProfiler::new());
    conn.set_profiler(Some(profiler.clone()));
    conn.execute("SELECT 1").unwrap();
    assert_eq!(profiler.entries()[0].sql, "SELECT 1");
}

#[test]
fn disconnect_is_idempotent_and_closes_once() {
    let mut conn = connection(MockClient::default(), &ConnectionParameters::default());
    conn.connect().unwrap();
    conn.disconnect();
    conn.disconnect();
    let closes = conn
        .client()
        .calls
        .iter()
        .filter(|c| **c == Call::Close)
        .count();
    assert_eq!(closes, 1);
}
