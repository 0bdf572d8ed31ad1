//! The native-client seam.
//!
//! [`MysqlClient`] mirrors the small slice of the C client API the
//! connection logic needs. The connection is generic over it so the
//! handshake sequencing (options, then TLS, then connect, then
//! charset) can be exercised without a server; the `native` feature
//! provides the real libmysqlclient-backed implementation.

use crate::options::MysqlOption;
use unidb_core::error::Result;
use unidb_core::{RowStream, TlsOptions, Value};

/// Where and as whom to connect.
///
/// Field defaults mirror the C client: a missing host means
/// `localhost`, a missing port means 3306, and a socket path routes
/// the connection over the local socket instead of TCP.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectTarget {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub port: Option<u16>,
    pub socket: Option<String>,
}

/// What a query produced at the native layer.
pub enum QueryOutcome {
    /// The statement produced a result set.
    Rows(Box<dyn RowStream>),
    /// The statement produced no result set (DML, DDL).
    Done { affected: u64 },
}

impl std::fmt::Debug for QueryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rows(_) => f.debug_tuple("Rows").finish_non_exhaustive(),
            Self::Done { affected } => {
                f.debug_struct("Done").field("affected", affected).finish()
            }
        }
    }
}

/// Operations the connection needs from a MySQL client library.
///
/// Call-order contract: `set_option` and `set_tls` are only valid
/// before `connect`, `set_charset` and everything below it only after.
/// Implementations may rely on the connection honoring that order.
pub trait MysqlClient {
    /// Apply one pre-connect option (`mysql_options`).
    fn set_option(&mut self, option: &MysqlOption) -> Result<()>;

    /// Configure TLS material for the upcoming handshake
    /// (`mysql_ssl_set`).
    fn set_tls(&mut self, tls: &TlsOptions) -> Result<()>;

    /// Perform the handshake (`mysql_real_connect`).
    fn connect(&mut self, target: &ConnectTarget) -> Result<()>;

    /// The client's current error state, if any. Checked once right
    /// after `connect`: some client builds report handshake problems
    /// here rather than through the connect call itself.
    fn pending_error(&self) -> Option<(i32, String)>;

    /// Switch the connection character set (`mysql_set_character_set`).
    fn set_charset(&mut self, charset: &str) -> Result<()>;

    /// Run one statement (`mysql_real_query` + result fetch).
    fn query(&mut self, sql: &str) -> Result<QueryOutcome>;

    /// Run one parameterized statement with positionally bound values.
    fn execute_statement(&mut self, sql: &str, params: &[Value]) -> Result<QueryOutcome>;

    /// Toggle autocommit (`mysql_autocommit`).
    fn autocommit(&mut self, enabled: bool) -> Result<()>;

    /// Commit the open transaction (`mysql_commit`).
    fn commit(&mut self) -> Result<()>;

    /// Roll back the open transaction (`mysql_rollback`).
    fn rollback(&mut self) -> Result<()>;

    /// Last auto-generated id on this connection, zero when none
    /// (`mysql_insert_id`).
    fn insert_id(&mut self) -> u64;

    /// Release the native handle (`mysql_close`). Must be safe to call
    /// more than once.
    fn close(&mut self);
}
