//! The SQLite driver.

use crate::connection::SqliteConnection;
use crate::options::SqliteOption;
use unidb_core::error::Result;
use unidb_core::{Capabilities, ConnectionParameters, Driver};

/// Driver for SQLite databases via the bundled native library.
///
/// The `database` parameter is the filesystem path; when absent the
/// connection targets an in-memory database. Host, port, user and TLS
/// parameters do not apply and are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl SqliteDriver {
    pub fn new() -> Self {
        Self
    }
}

impl Driver for SqliteDriver {
    type Conn = SqliteConnection;

    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            prepared_statements: true,
            sequences: false,
            last_insert_id: true,
        }
    }

    fn open(&self, params: &ConnectionParameters) -> Result<Self::Conn> {
        let path = params
            .database
            .clone()
            .unwrap_or_else(|| ":memory:".to_string());
        let options = SqliteOption::resolve_all(&params.driver_options)?;
        Ok(SqliteConnection::new(path, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unidb_core::Connection;

    #[test]
    fn open_defaults_to_in_memory() {
        let conn = SqliteDriver::new()
            .open(&ConnectionParameters::default())
            .unwrap();
        assert_eq!(conn.path(), ":memory:");
        assert!(!conn.is_connected());
    }

    #[test]
    fn open_rejects_malformed_driver_options() {
        let params = ConnectionParameters::default()
            .driver_option("busy_timeout_ms", serde_json::json!({"nested": true}));
        assert!(SqliteDriver::new().open(&params).is_err());
    }
}
