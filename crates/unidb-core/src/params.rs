//! Connection parameter resolution.
//!
//! Connection descriptors arrive as loosely-keyed maps whose spellings
//! vary between applications (`host` vs `hostname`, `user` vs
//! `username`, ...). [`ConnectionParameters`] normalizes them: each
//! canonical field scans its alias list in declared priority order and
//! takes the first present value. The declared order is part of the
//! contract: `hostname` wins over `host` when both are set.

use crate::error::{Error, Result};
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;

/// Alias spellings accepted for each canonical field, highest priority
/// first.
pub const HOST_ALIASES: &[&str] = &["hostname", "host"];
pub const USER_ALIASES: &[&str] = &["username", "user"];
pub const PASSWORD_ALIASES: &[&str] = &["password", "passwd", "pw"];
pub const DATABASE_ALIASES: &[&str] = &["database", "dbname", "db", "schema"];
pub const PORT_ALIASES: &[&str] = &["port"];
pub const SOCKET_ALIASES: &[&str] = &["socket"];
pub const CHARSET_ALIASES: &[&str] = &["charset"];
pub const USE_SSL_ALIASES: &[&str] = &["use_ssl"];

/// TLS material passed through to the native client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsOptions {
    pub client_key: Option<String>,
    pub client_cert: Option<String>,
    pub ca_cert: Option<String>,
    pub ca_path: Option<String>,
    pub cipher: Option<String>,
}

impl TlsOptions {
    /// True when no TLS material was supplied at all.
    pub fn is_empty(&self) -> bool {
        self.client_key.is_none()
            && self.client_cert.is_none()
            && self.ca_cert.is_none()
            && self.ca_path.is_none()
            && self.cipher.is_none()
    }
}

/// Canonical connection settings, immutable once resolved.
///
/// Build one with [`ConnectionParameters::from_map`] for descriptor
/// maps, or with the field builders for programmatic construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionParameters {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub port: Option<u16>,
    pub socket: Option<String>,
    pub charset: Option<String>,
    pub use_ssl: bool,
    pub tls: TlsOptions,
    /// Native option name -> value, applied by drivers before connect.
    /// Unknown names are silently ignored by each driver.
    pub driver_options: BTreeMap<String, Json>,
}

/// First-present alias lookup over a raw descriptor map.
///
/// Pure and order-sensitive: scans `aliases` in declared order and
/// returns the first key present in `map`.
pub fn resolve_alias<'a>(map: &'a Map<String, Json>, aliases: &[&str]) -> Option<&'a Json> {
    aliases.iter().find_map(|key| map.get(*key))
}

/// Interpret a descriptor value as truthy for flags like `use_ssl`.
///
/// JSON `true`, any nonzero number, and the strings `1`, `true`,
/// `yes`, `on` (case-insensitive) count as true.
pub fn is_truthy(value: &Json) -> bool {
    match value {
        Json::Bool(b) => *b,
        Json::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Json::String(s) => {
            matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
        }
        _ => false,
    }
}

fn as_string(value: &Json, key: &str) -> Result<String> {
    match value {
        Json::String(s) => Ok(s.clone()),
        Json::Number(n) => Ok(n.to_string()),
        _ => Err(Error::invalid_argument(format!(
            "parameter '{}' must be a string, got {}",
            key, value
        ))),
    }
}

fn resolve_string(map: &Map<String, Json>, aliases: &[&str]) -> Result<Option<String>> {
    match resolve_alias(map, aliases) {
        Some(v) => as_string(v, aliases[0]).map(Some),
        None => Ok(None),
    }
}

fn resolve_port(map: &Map<String, Json>) -> Result<Option<u16>> {
    let Some(raw) = resolve_alias(map, PORT_ALIASES) else {
        return Ok(None);
    };
    let port = match raw {
        Json::Number(n) => n
            .as_u64()
            .and_then(|v| u16::try_from(v).ok())
            .ok_or_else(|| Error::invalid_argument(format!("port out of range: {}", n)))?,
        Json::String(s) => s
            .parse::<u16>()
            .map_err(|_| Error::invalid_argument(format!("port is not an integer: '{}'", s)))?,
        other => {
            return Err(Error::invalid_argument(format!(
                "port must be an integer, got {}",
                other
            )));
        }
    };
    Ok(Some(port))
}

impl ConnectionParameters {
    /// Resolve a raw descriptor map into canonical parameters.
    ///
    /// Unrecognized keys are ignored; recognized keys with malformed
    /// values are `InvalidArgument`.
    pub fn from_map(map: &Map<String, Json>) -> Result<Self> {
        let tls = TlsOptions {
            client_key: resolve_string(map, &["client_key"])?,
            client_cert: resolve_string(map, &["client_cert"])?,
            ca_cert: resolve_string(map, &["ca_cert"])?,
            ca_path: resolve_string(map, &["ca_path"])?,
            cipher: resolve_string(map, &["cipher"])?,
        };

        let driver_options = match map.get("driver_options") {
            None => BTreeMap::new(),
            Some(Json::Object(opts)) => opts.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Some(other) => {
                return Err(Error::invalid_argument(format!(
                    "driver_options must be a map, got {}",
                    other
                )));
            }
        };

        Ok(Self {
            host: resolve_string(map, HOST_ALIASES)?,
            user: resolve_string(map, USER_ALIASES)?,
            password: resolve_string(map, PASSWORD_ALIASES)?,
            database: resolve_string(map, DATABASE_ALIASES)?,
            port: resolve_port(map)?,
            socket: resolve_string(map, SOCKET_ALIASES)?,
            charset: resolve_string(map, CHARSET_ALIASES)?,
            use_ssl: resolve_alias(map, USE_SSL_ALIASES).is_some_and(is_truthy),
            tls,
            driver_options,
        })
    }

    /// Parse a JSON descriptor string (must be an object).
    pub fn from_json(descriptor: &str) -> Result<Self> {
        let parsed: Json = serde_json::from_str(descriptor)
            .map_err(|e| Error::invalid_argument(format!("invalid descriptor: {}", e)))?;
        match parsed {
            Json::Object(map) => Self::from_map(&map),
            other => Err(Error::invalid_argument(format!(
                "descriptor must be an object, got {}",
                other
            ))),
        }
    }

    /// Set the server host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the auth principal.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the auth credential.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the default schema.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the TCP port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the unix socket path.
    pub fn socket(mut self, socket: impl Into<String>) -> Self {
        self.socket = Some(socket.into());
        self
    }

    /// Set the post-connect character set.
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Enable TLS negotiation.
    pub fn use_ssl(mut self, enabled: bool) -> Self {
        self.use_ssl = enabled;
        self
    }

    /// Set TLS material.
    pub fn tls(mut self, tls: TlsOptions) -> Self {
        self.tls = tls;
        self
    }

    /// Set a native driver option.
    pub fn driver_option(mut self, name: impl Into<String>, value: impl Into<Json>) -> Self {
        self.driver_options.insert(name.into(), value.into());
        self
    }

    /// Whether TLS should be configured before connecting.
    ///
    /// A socket path overrides TLS: local socket transport does not
    /// negotiate TLS unless the native client is forced externally.
    pub fn tls_enabled(&self) -> bool {
        self.use_ssl && self.socket.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Json) -> Map<String, Json> {
        match value {
            Json::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn alias_priority_order_wins() {
        let m = map(json!({
            "host": "second",
            "hostname": "first",
            "user": "u2",
            "username": "u1",
            "pw": "p3",
            "passwd": "p2",
            "password": "p1",
            "schema": "s4",
            "db": "s3",
            "dbname": "s2",
            "database": "s1",
        }));
        let params = ConnectionParameters::from_map(&m).unwrap();
        assert_eq!(params.host.as_deref(), Some("first"));
        assert_eq!(params.user.as_deref(), Some("u1"));
        assert_eq!(params.password.as_deref(), Some("p1"));
        assert_eq!(params.database.as_deref(), Some("s1"));
    }

    #[test]
    fn lower_priority_alias_used_when_alone() {
        let m = map(json!({"host": "only", "pw": "secret", "schema": "app"}));
        let params = ConnectionParameters::from_map(&m).unwrap();
        assert_eq!(params.host.as_deref(), Some("only"));
        assert_eq!(params.password.as_deref(), Some("secret"));
        assert_eq!(params.database.as_deref(), Some("app"));
    }

    #[test]
    fn missing_fields_resolve_to_none() {
        let params = ConnectionParameters::from_map(&Map::new()).unwrap();
        assert_eq!(params.host, None);
        assert_eq!(params.port, None);
        assert!(!params.use_ssl);
        assert!(params.tls.is_empty());
        assert!(params.driver_options.is_empty());
    }

    #[test]
    fn port_accepts_number_or_numeric_string() {
        let m = map(json!({"port": 3307}));
        assert_eq!(
            ConnectionParameters::from_map(&m).unwrap().port,
            Some(3307)
        );

        let m = map(json!({"port": "5432"}));
        assert_eq!(
            ConnectionParameters::from_map(&m).unwrap().port,
            Some(5432)
        );
    }

    #[test]
    fn malformed_port_is_invalid_argument() {
        let m = map(json!({"port": "many"}));
        assert!(matches!(
            ConnectionParameters::from_map(&m),
            Err(Error::InvalidArgument(_))
        ));

        let m = map(json!({"port": 70000}));
        assert!(matches!(
            ConnectionParameters::from_map(&m),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn driver_options_must_be_a_map() {
        let m = map(json!({"driver_options": "nope"}));
        assert!(matches!(
            ConnectionParameters::from_map(&m),
            Err(Error::InvalidArgument(_))
        ));

        let m = map(json!({"driver_options": {"connect_timeout": 5}}));
        let params = ConnectionParameters::from_map(&m).unwrap();
        assert_eq!(params.driver_options.get("connect_timeout"), Some(&json!(5)));
    }

    #[test]
    fn use_ssl_truthiness() {
        for raw in [json!(true), json!(1), json!("yes"), json!("ON"), json!("1")] {
            assert!(is_truthy(&raw), "{raw} should be truthy");
        }
        for raw in [json!(false), json!(0), json!("no"), json!(""), json!(null)] {
            assert!(!is_truthy(&raw), "{raw} should be falsy");
        }
    }

    #[test]
    fn socket_overrides_tls() {
        let with_socket = ConnectionParameters::default()
            .use_ssl(true)
            .socket("/var/run/db.sock");
        assert!(!with_socket.tls_enabled());

        let without_socket = ConnectionParameters::default().use_ssl(true);
        assert!(without_socket.tls_enabled());

        let no_ssl = ConnectionParameters::default();
        assert!(!no_ssl.tls_enabled());

        let no_ssl_with_socket = ConnectionParameters::default().socket("/tmp/x.sock");
        assert!(!no_ssl_with_socket.tls_enabled());
    }

    #[test]
    fn tls_material_resolved() {
        let m = map(json!({
            "use_ssl": "1",
            "client_key": "/k.pem",
            "client_cert": "/c.pem",
            "ca_cert": "/ca.pem",
            "cipher": "AES256-SHA",
        }));
        let params = ConnectionParameters::from_map(&m).unwrap();
        assert!(params.tls_enabled());
        assert_eq!(params.tls.client_key.as_deref(), Some("/k.pem"));
        assert_eq!(params.tls.ca_path, None);
        assert!(!params.tls.is_empty());
    }

    #[test]
    fn from_json_round_trip() {
        let params =
            ConnectionParameters::from_json(r#"{"hostname":"db","port":1234,"user":"app"}"#)
                .unwrap();
        assert_eq!(params.host.as_deref(), Some("db"));
        assert_eq!(params.port, Some(1234));

        assert!(matches!(
            ConnectionParameters::from_json("[1,2]"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            ConnectionParameters::from_json("not json"),
            Err(Error::InvalidArgument(_))
        ));
    }
}
