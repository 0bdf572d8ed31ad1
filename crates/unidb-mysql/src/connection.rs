//! MySQL connection implementation.
//!
//! Generic over [`MysqlClient`] so the handshake sequencing and
//! transaction bookkeeping are testable without a server. The native
//! libmysqlclient implementation plugs in behind the same trait.

use crate::client::{ConnectTarget, MysqlClient, QueryOutcome};
use crate::options::MysqlOption;
use std::fmt;
use tracing::debug;
use unidb_core::error::{ConnectionError, Error, QueryError, Result, StateErrorKind};
use unidb_core::{
    Connection, ConnectionParameters, ResultSet, SharedProfiler, Statement, TlsOptions, Value,
};

/// A connection to a MySQL server through a [`MysqlClient`].
pub struct MysqlConnection<C: MysqlClient> {
    client: C,
    target: ConnectTarget,
    options: Vec<MysqlOption>,
    /// TLS material to install before the handshake. `None` when TLS
    /// was not requested or a socket path overrides it.
    tls: Option<TlsOptions>,
    charset: Option<String>,
    connected: bool,
    in_transaction: bool,
    profiler: Option<SharedProfiler>,
}

impl<C: MysqlClient> MysqlConnection<C> {
    /// Build an unconnected connection from resolved parameters.
    ///
    /// Fails `InvalidArgument` when a recognized driver option carries
    /// a malformed value.
    pub fn new(client: C, params: &ConnectionParameters) -> Result<Self> {
        let options = MysqlOption::resolve_all(&params.driver_options)?;
        Ok(Self {
            client,
            target: ConnectTarget {
                host: params.host.clone(),
                user: params.user.clone(),
                password: params.password.clone(),
                database: params.database.clone(),
                port: params.port,
                socket: params.socket.clone(),
            },
            options,
            tls: params.tls_enabled().then(|| params.tls.clone()),
            charset: params.charset.clone(),
            connected: false,
            in_transaction: false,
            profiler: None,
        })
    }

    /// The underlying client, for inspection.
    pub fn client(&self) -> &C {
        &self.client
    }

    fn execute_inner(&mut self, sql: &str) -> Result<ResultSet<'_>> {
        match self.client.query(sql)? {
            QueryOutcome::Rows(stream) => Ok(ResultSet::streamed(stream)),
            QueryOutcome::Done { affected } => {
                let id = self.client.insert_id();
                let generated = (id != 0).then(|| id.to_string());
                Ok(ResultSet::affected(affected, generated))
            }
        }
    }
}

impl<C: MysqlClient> Connection for MysqlConnection<C> {
    type Stmt<'conn>
        = MysqlStatement<'conn, C>
    where
        Self: 'conn;

    /// Handshake sequence, in order: pre-connect options, TLS setup
    /// (only when requested and not overridden by a socket path), the
    /// handshake itself, a post-handshake error check, then the
    /// charset switch. A failure at any step leaves the connection
    /// disconnected.
    fn connect(&mut self) -> Result<()> {
        if self.connected {
            return Ok(());
        }

        for option in &self.options {
            self.client.set_option(option)?;
        }
        if let Some(tls) = &self.tls {
            self.client.set_tls(tls)?;
        }
        if let Err(e) = self.client.connect(&self.target) {
            self.client.close();
            return Err(e);
        }
        // Some client builds leave the handshake failure in the error
        // state instead of failing the connect call.
        if let Some((code, message)) = self.client.pending_error() {
            self.client.close();
            return Err(Error::Connection(ConnectionError {
                code: Some(code),
                message,
                source: None,
            }));
        }
        if let Some(charset) = self.charset.clone() {
            if let Err(e) = self.client.set_charset(&charset) {
                self.client.close();
                return Err(e);
            }
        }

        self.connected = true;
        debug!(
            host = self.target.host.as_deref().unwrap_or("localhost"),
            "mysql connection established"
        );
        Ok(())
    }

    fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.client.close();
        self.connected = false;
        self.in_transaction = false;
        debug!("mysql connection closed");
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn begin(&mut self) -> Result<()> {
        self.connect()?;
        self.client.autocommit(false)?;
        self.in_transaction = true;
        debug!("transaction begun");
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.connect()?;
        if self.in_transaction {
            self.client.commit()?;
            self.client.autocommit(true)?;
        }
        self.in_transaction = false;
        debug!("transaction committed");
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if !self.connected {
            return Err(Error::illegal_state(
                StateErrorKind::NotConnected,
                "must be connected before you can rollback",
            ));
        }
        if !self.in_transaction {
            return Err(Error::illegal_state(
                StateErrorKind::NoActiveTransaction,
                "must call begin() before you can rollback",
            ));
        }
        self.client.rollback()?;
        self.client.autocommit(true)?;
        self.in_transaction = false;
        debug!("transaction rolled back");
        Ok(())
    }

    fn execute(&mut self, sql: &str) -> Result<ResultSet<'_>> {
        self.connect()?;
        // Clone the handle: the returned result keeps borrowing self,
        // so the field cannot be read after the native call.
        let profiler = self.profiler.clone();
        if let Some(profiler) = &profiler {
            profiler.query_start(sql);
        }
        let outcome = self.execute_inner(sql);
        if let Some(profiler) = &profiler {
            profiler.query_finish();
        }
        outcome
    }

    fn prepare(&mut self, sql: &str) -> Result<Self::Stmt<'_>> {
        self.connect()?;
        Ok(MysqlStatement {
            client: &mut self.client,
            sql: sql.to_string(),
            param_count: count_placeholders(sql),
        })
    }

    fn last_generated_value(&mut self, _name: Option<&str>) -> Result<Option<String>> {
        self.connect()?;
        let id = self.client.insert_id();
        Ok((id != 0).then(|| id.to_string()))
    }

    fn set_profiler(&mut self, profiler: Option<SharedProfiler>) {
        self.profiler = profiler;
    }
}

impl<C: MysqlClient> Drop for MysqlConnection<C> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl<C: MysqlClient> fmt::Debug for MysqlConnection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlConnection")
            .field("target", &self.target)
            .field("connected", &self.connected)
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}

/// A parameterized statement bound to a MySQL connection.
///
/// Parameters are `?` placeholders, counted outside quoted regions.
pub struct MysqlStatement<'conn, C: MysqlClient> {
    client: &'conn mut C,
    sql: String,
    param_count: usize,
}

impl<C: MysqlClient> Statement for MysqlStatement<'_, C> {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn parameter_count(&self) -> usize {
        self.param_count
    }

    fn execute(&mut self, params: &[Value]) -> Result<ResultSet<'_>> {
        if params.len() != self.param_count {
            return Err(Error::InvalidQuery(QueryError {
                message: format!(
                    "statement expects {} parameters, got {}",
                    self.param_count,
                    params.len()
                ),
                sql: Some(self.sql.clone()),
                code: None,
            }));
        }
        match self.client.execute_statement(&self.sql, params)? {
            QueryOutcome::Rows(stream) => Ok(ResultSet::streamed(stream)),
            QueryOutcome::Done { affected } => {
                let id = self.client.insert_id();
                let generated = (id != 0).then(|| id.to_string());
                Ok(ResultSet::affected(affected, generated))
            }
        }
    }
}

impl<C: MysqlClient> fmt::Debug for MysqlStatement<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlStatement")
            .field("sql", &self.sql)
            .field("param_count", &self.param_count)
            .finish_non_exhaustive()
    }
}

/// Count `?` placeholders, skipping string literals, quoted
/// identifiers and backslash escapes.
fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    let mut quote: Option<char> = None;
    let mut chars = sql.chars();
    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if c == '\\' && q != '`' {
                    chars.next();
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '?' => count += 1,
                _ => {}
            },
        }
    }
    count
}
