//! The MySQL driver, backed by the native client.

use crate::connection::MysqlConnection;
use crate::native::NativeClient;
use unidb_core::error::Result;
use unidb_core::{Capabilities, ConnectionParameters, Driver};

/// Driver for MySQL servers via libmysqlclient.
///
/// Understands `host`, `port`, `user`, `password`, `database`,
/// `socket`, `charset` and `use_ssl` parameters plus the static
/// driver-option table. A socket path overrides TLS.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDriver;

impl MysqlDriver {
    pub fn new() -> Self {
        Self
    }
}

impl Driver for MysqlDriver {
    type Conn = MysqlConnection<NativeClient>;

    fn name(&self) -> &'static str {
        "mysql"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            prepared_statements: true,
            sequences: false,
            last_insert_id: true,
        }
    }

    fn open(&self, params: &ConnectionParameters) -> Result<Self::Conn> {
        MysqlConnection::new(NativeClient::new()?, params)
    }
}
