//! The driver contract.
//!
//! A [`Driver`] is a factory bound to one native client library; the
//! [`Connection`], [`Statement`] and `ResultSet` it produces all wrap
//! handles from that same library. Connections are synchronous and
//! exclusively owned: every operation blocks the calling thread and
//! takes `&mut self`, so a connection cannot be shared without
//! external synchronization: it holds one native handle and one
//! cursor at a time.

use crate::error::Result;
use crate::params::ConnectionParameters;
use crate::profiler::SharedProfiler;
use crate::result::ResultSet;
use crate::value::Value;

/// Capability flags a driver exposes to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The native library supports prepared statements.
    pub prepared_statements: bool,
    /// Generated keys come from named sequences rather than an
    /// auto-increment counter.
    pub sequences: bool,
    /// The native library reports a last-inserted id per connection.
    pub last_insert_id: bool,
}

/// Factory producing connections bound to one native client library.
pub trait Driver {
    /// The connection type this driver produces.
    type Conn: Connection;

    /// Short identifier, e.g. `"sqlite"`.
    fn name(&self) -> &'static str;

    /// What the underlying library can do.
    fn capabilities(&self) -> Capabilities;

    /// Construct an unconnected connection from resolved parameters.
    ///
    /// Validates parameters but performs no I/O; the connection
    /// establishes its native handle lazily (auto-connect-on-use).
    fn open(&self, params: &ConnectionParameters) -> Result<Self::Conn>;
}

/// A connection owning at most one native client handle.
///
/// State machine: Disconnected -> Connected -> InTransaction. Every
/// operation that needs a handle auto-connects first, so callers may
/// treat a connection as always ready. `rollback` is the deliberate
/// exception: it is strict about state (see method docs) while
/// `commit` is forgiving; that asymmetry is part of the contract.
pub trait Connection {
    /// Prepared statement type borrowing this connection.
    type Stmt<'conn>: Statement
    where
        Self: 'conn;

    /// Establish the native handle. Idempotent: returns immediately
    /// when already connected. On failure no handle is retained.
    fn connect(&mut self) -> Result<()>;

    /// Release the native handle. No-op when already disconnected.
    fn disconnect(&mut self);

    /// Whether a live native handle is held.
    fn is_connected(&self) -> bool;

    /// Whether a transaction begun on this connection is open.
    fn in_transaction(&self) -> bool;

    /// Begin a transaction: auto-connects, disables autocommit.
    fn begin(&mut self) -> Result<()>;

    /// Commit: auto-connects, commits, restores autocommit and clears
    /// the transaction flag regardless of prior transaction state.
    /// Committing without an open transaction succeeds silently.
    fn commit(&mut self) -> Result<()>;

    /// Roll back the open transaction and restore autocommit.
    ///
    /// Fails `IllegalState(NotConnected)` when no handle is held
    /// (checked first) and `IllegalState(NoActiveTransaction)` when no
    /// transaction was begun.
    fn rollback(&mut self) -> Result<()>;

    /// Execute raw SQL, auto-connecting if needed.
    ///
    /// The profiler, when set, is notified around the native call
    /// regardless of outcome. A native failure surfaces as
    /// `InvalidQuery` carrying the native error text; success yields a
    /// `ResultSet`; rowless statements produce an affected-count-only
    /// result.
    fn execute(&mut self, sql: &str) -> Result<ResultSet<'_>>;

    /// Prepare a parameterized statement.
    fn prepare(&mut self, sql: &str) -> Result<Self::Stmt<'_>>;

    /// The last auto-generated identifier from the native handle, as
    /// a string. `name` selects a sequence on sequence-based drivers
    /// and is ignored by the others; it exists for interface symmetry.
    fn last_generated_value(&mut self, name: Option<&str>) -> Result<Option<String>>;

    /// Install or remove the profiler hook.
    fn set_profiler(&mut self, profiler: Option<SharedProfiler>);
}

/// A prepared, parameterized statement owned by a connection.
///
/// Stateless between executions apart from bound values.
pub trait Statement {
    /// The SQL text this statement was prepared from.
    fn sql(&self) -> &str;

    /// Number of parameter placeholders.
    fn parameter_count(&self) -> usize;

    /// Bind `params` positionally and execute.
    ///
    /// Fails `InvalidQuery` when the parameter count does not match or
    /// the native library rejects the execution.
    fn execute(&mut self, params: &[Value]) -> Result<ResultSet<'_>>;
}
