//! Static driver-option table for the MySQL client.
//!
//! Recognized names map onto `mysql_options` constants; unknown names
//! are dropped with a debug trace, malformed values are rejected
//! before any connection work happens.

use serde_json::Value as Json;
use tracing::debug;
use unidb_core::error::{Error, Result};

/// A recognized MySQL driver option with its resolved value.
///
/// All of these are pre-connect options: they must reach the client
/// before the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MysqlOption {
    /// Handshake timeout in seconds (`MYSQL_OPT_CONNECT_TIMEOUT`).
    ConnectTimeoutSecs(u32),
    /// Per-read timeout in seconds (`MYSQL_OPT_READ_TIMEOUT`).
    ReadTimeoutSecs(u32),
    /// Per-write timeout in seconds (`MYSQL_OPT_WRITE_TIMEOUT`).
    WriteTimeoutSecs(u32),
    /// Statement to run on every (re)connect (`MYSQL_INIT_COMMAND`).
    InitCommand(String),
    /// Allow `LOAD DATA LOCAL INFILE` (`MYSQL_OPT_LOCAL_INFILE`).
    LocalInfile(bool),
}

impl MysqlOption {
    /// Resolve one `driver_options` entry. `Ok(None)` for names not in
    /// the table.
    pub fn resolve(name: &str, value: &Json) -> Result<Option<Self>> {
        match name {
            "connect_timeout" => expect_secs(name, value).map(|v| Some(Self::ConnectTimeoutSecs(v))),
            "read_timeout" => expect_secs(name, value).map(|v| Some(Self::ReadTimeoutSecs(v))),
            "write_timeout" => expect_secs(name, value).map(|v| Some(Self::WriteTimeoutSecs(v))),
            "init_command" => value
                .as_str()
                .map(|s| Some(Self::InitCommand(s.to_owned())))
                .ok_or_else(|| {
                    Error::invalid_argument(format!("driver option '{}' must be a string", name))
                }),
            "local_infile" => match value {
                Json::Bool(b) => Ok(Some(Self::LocalInfile(*b))),
                Json::Number(n) => Ok(Some(Self::LocalInfile(
                    n.as_i64().is_some_and(|v| v != 0),
                ))),
                _ => Err(Error::invalid_argument(format!(
                    "driver option '{}' must be a boolean",
                    name
                ))),
            },
            _ => {
                debug!(option = name, "ignoring unrecognized mysql driver option");
                Ok(None)
            }
        }
    }

    /// Resolve a whole `driver_options` map, dropping unknown names.
    pub fn resolve_all<'a>(
        options: impl IntoIterator<Item = (&'a String, &'a Json)>,
    ) -> Result<Vec<Self>> {
        let mut resolved = Vec::new();
        for (name, value) in options {
            if let Some(option) = Self::resolve(name, value)? {
                resolved.push(option);
            }
        }
        Ok(resolved)
    }
}

fn expect_secs(name: &str, value: &Json) -> Result<u32> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| {
            Error::invalid_argument(format!(
                "driver option '{}' must be a non-negative integer",
                name
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn timeouts_accept_integers_and_numeric_strings() {
        assert_eq!(
            MysqlOption::resolve("connect_timeout", &json!(10)).unwrap(),
            Some(MysqlOption::ConnectTimeoutSecs(10))
        );
        assert_eq!(
            MysqlOption::resolve("read_timeout", &json!("30")).unwrap(),
            Some(MysqlOption::ReadTimeoutSecs(30))
        );
    }

    #[test]
    fn negative_timeout_is_rejected() {
        assert!(matches!(
            MysqlOption::resolve("write_timeout", &json!(-1)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        assert_eq!(MysqlOption::resolve("compress", &json!(1)).unwrap(), None);
    }

    #[test]
    fn local_infile_accepts_bool_and_number() {
        assert_eq!(
            MysqlOption::resolve("local_infile", &json!(true)).unwrap(),
            Some(MysqlOption::LocalInfile(true))
        );
        assert_eq!(
            MysqlOption::resolve("local_infile", &json!(0)).unwrap(),
            Some(MysqlOption::LocalInfile(false))
        );
    }
}
