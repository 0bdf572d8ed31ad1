//! The adapter façade.
//!
//! An [`Adapter`] composes a driver-produced connection with a
//! [`Platform`] and is the single entry point external collaborators
//! use: run a query, or borrow the connection for statement-level
//! work. Drivers and platforms are constructed once and shared
//! read-only; all mutable state lives in the connection.

use crate::driver::{Capabilities, Connection, Driver};
use crate::error::Result;
use crate::params::ConnectionParameters;
use crate::platform::Platform;
use crate::profiler::SharedProfiler;
use crate::result::ResultSet;
use std::fmt;
use tracing::debug;

/// Façade over one driver, one connection and one platform.
pub struct Adapter<D: Driver> {
    driver: D,
    conn: D::Conn,
    platform: Box<dyn Platform>,
}

impl<D: Driver> Adapter<D> {
    /// Compose an adapter from a driver, connection parameters, and
    /// the platform matching the driver's dialect.
    ///
    /// The connection is created unconnected; the first operation
    /// establishes the native handle.
    pub fn new(
        driver: D,
        params: &ConnectionParameters,
        platform: Box<dyn Platform>,
    ) -> Result<Self> {
        let conn = driver.open(params)?;
        debug!(
            driver = driver.name(),
            platform = platform.name(),
            "adapter created"
        );
        Ok(Self {
            driver,
            conn,
            platform,
        })
    }

    /// Execute SQL and buffer the full result client-side.
    ///
    /// The returned result is detached from the connection: seekable,
    /// restartable, and safe to hold across later statements.
    pub fn query(&mut self, sql: &str) -> Result<ResultSet<'static>> {
        self.conn.execute(sql)?.buffer()
    }

    /// Execute SQL and return only the affected-row count.
    pub fn execute(&mut self, sql: &str) -> Result<u64> {
        let result = self.conn.execute(sql)?.buffer()?;
        Ok(result.affected_rows())
    }

    /// The composed driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The composed platform.
    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    /// Capability flags of the underlying driver.
    pub fn capabilities(&self) -> Capabilities {
        self.driver.capabilities()
    }

    /// Borrow the connection.
    pub fn connection(&self) -> &D::Conn {
        &self.conn
    }

    /// Borrow the connection mutably, e.g. for transactions, prepared
    /// statements, or unbuffered execution.
    pub fn connection_mut(&mut self) -> &mut D::Conn {
        &mut self.conn
    }

    /// Install or remove the profiler on the composed connection.
    pub fn set_profiler(&mut self, profiler: Option<SharedProfiler>) {
        self.conn.set_profiler(profiler);
    }
}

impl<D: Driver + fmt::Debug> fmt::Debug for Adapter<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("driver", &self.driver)
            .field("platform", &self.platform.name())
            .field("connected", &self.conn.is_connected())
            .finish_non_exhaustive()
    }
}
