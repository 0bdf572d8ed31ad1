//! Static driver-option table.
//!
//! `driver_options` entries are matched against an enumerated table
//! instead of being forwarded as raw strings. Unknown names are
//! silently ignored (traced at debug level); recognized names with
//! malformed values are rejected up front.

use serde_json::Value as Json;
use tracing::debug;
use unidb_core::error::{Error, Result};

/// A recognized SQLite driver option with its resolved value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqliteOption {
    /// Busy handler timeout in milliseconds (`sqlite3_busy_timeout`).
    BusyTimeoutMs(i32),
    /// Enable or disable foreign key enforcement.
    ForeignKeys(bool),
    /// Journal mode pragma value (`WAL`, `DELETE`, ...).
    JournalMode(String),
    /// Page cache budget in kibibytes.
    CacheSizeKb(i64),
}

impl SqliteOption {
    /// Resolve one `driver_options` entry against the option table.
    ///
    /// Returns `Ok(None)` for unknown names.
    pub fn resolve(name: &str, value: &Json) -> Result<Option<Self>> {
        match name {
            "busy_timeout_ms" => expect_i64(name, value).map(|v| {
                Some(Self::BusyTimeoutMs(
                    i32::try_from(v).unwrap_or(i32::MAX),
                ))
            }),
            "foreign_keys" => expect_bool(name, value).map(|v| Some(Self::ForeignKeys(v))),
            "journal_mode" => expect_str(name, value).map(|v| Some(Self::JournalMode(v))),
            "cache_size_kb" => expect_i64(name, value).map(|v| Some(Self::CacheSizeKb(v))),
            _ => {
                debug!(option = name, "ignoring unrecognized sqlite driver option");
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

fn expect_i64(name: &str, value: &Json) -> Result<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| {
            Error::invalid_argument(format!("driver option '{}' must be an integer", name))
        })
}

fn expect_bool(name: &str, value: &Json) -> Result<bool> {
    match value {
        Json::Bool(b) => Ok(*b),
        Json::Number(n) => Ok(n.as_i64().is_some_and(|v| v != 0)),
        _ => Err(Error::invalid_argument(format!(
            "driver option '{}' must be a boolean",
            name
        ))),
    }
}

fn expect_str(name: &str, value: &Json) -> Result<String> {
    value.as_str().map(ToOwned::to_owned).ok_or_else(|| {
        Error::invalid_argument(format!("driver option '{}' must be a string", name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_options_resolve() {
        assert_eq!(
            SqliteOption::resolve("busy_timeout_ms", &json!(2500)).unwrap(),
            Some(SqliteOption::BusyTimeoutMs(2500))
        );
        assert_eq!(
            SqliteOption::resolve("foreign_keys", &json!(true)).unwrap(),
            Some(SqliteOption::ForeignKeys(true))
        );
        assert_eq!(
            SqliteOption::resolve("journal_mode", &json!("WAL")).unwrap(),
            Some(SqliteOption::JournalMode("WAL".to_string()))
        );
    }

    #[test]
    fn unknown_option_is_ignored() {
        assert_eq!(
            SqliteOption::resolve("made_up_option", &json!("x")).unwrap(),
            None
        );
    }

    #[test]
    fn malformed_value_is_invalid_argument() {
        assert!(matches!(
            SqliteOption::resolve("busy_timeout_ms", &json!("soon")),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            SqliteOption::resolve("journal_mode", &json!(3)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn resolve_all_drops_unknown_keeps_known() {
        let opts = std::collections::BTreeMap::from([
            ("busy_timeout_ms".to_string(), json!(100)),
            ("mystery".to_string(), json!(1)),
        ]);
        let resolved = SqliteOption::resolve_all(&opts).unwrap();
        assert_eq!(resolved, vec![SqliteOption::BusyTimeoutMs(100)]);
    }
}
