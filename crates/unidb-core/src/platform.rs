//! SQL dialect quoting rules.
//!
//! A platform encodes the identifier- and value-quoting conventions of
//! one target database. Query-building callers consult it; connections
//! never do.

use crate::value::Value;

/// Dialect-specific quoting and escaping rules.
pub trait Platform {
    /// Short dialect identifier, e.g. `"mysql"`.
    fn name(&self) -> &'static str;

    /// Quote a single identifier (table, column, alias).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a dotted identifier chain (`schema.table.column`).
    fn quote_identifier_chain(&self, chain: &[&str]) -> String {
        chain
            .iter()
            .map(|part| self.quote_identifier(part))
            .collect::<Vec<_>>()
            .join(self.identifier_separator())
    }

    /// Quote a string literal.
    fn quote_string(&self, s: &str) -> String;

    /// Render a value as a quoted SQL literal.
    ///
    /// Prefer bound parameters; this exists for the DDL and logging
    /// paths where binding is not available.
    fn quote_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Value::TinyInt(v) => v.to_string(),
            Value::SmallInt(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::BigInt(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::Decimal(s) => s.clone(),
            Value::Text(s) => self.quote_string(s),
            Value::Bytes(b) => {
                let mut hex = String::with_capacity(b.len() * 2 + 3);
                hex.push_str("X'");
                for byte in b {
                    hex.push_str(&format!("{byte:02X}"));
                }
                hex.push('\'');
                hex
            }
            Value::Json(v) => self.quote_string(&v.to_string()),
        }
    }

    /// Separator between identifier chain segments.
    fn identifier_separator(&self) -> &'static str {
        "."
    }
}

/// ANSI SQL quoting: double-quoted identifiers, `''` escaping in
/// string literals. Serves SQLite and PostgreSQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiPlatform;

impl Platform for AnsiPlatform {
    fn name(&self) -> &'static str {
        "ansi"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }
}

/// MySQL quoting: backtick identifiers, backslash-aware literal
/// escaping.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlPlatform;

impl Platform for MysqlPlatform {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn quote_string(&self, s: &str) -> String {
        let escaped = s.replace('\\', "\\\\").replace('\'', "\\'");
        format!("'{escaped}'")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ansi_identifier_quoting() {
        let p = AnsiPlatform;
        assert_eq!(p.quote_identifier("users"), "\"users\"");
        assert_eq!(p.quote_identifier("user\"name"), "\"user\"\"name\"");
        // SQL keywords become safe once quoted
        assert_eq!(p.quote_identifier("select"), "\"select\"");
    }

    #[test]
    fn mysql_identifier_quoting() {
        let p = MysqlPlatform;
        assert_eq!(p.quote_identifier("users"), "`users`");
        assert_eq!(p.quote_identifier("user`name"), "`user``name`");
    }

    #[test]
    fn identifier_chains() {
        let p = AnsiPlatform;
        assert_eq!(
            p.quote_identifier_chain(&["main", "users", "id"]),
            "\"main\".\"users\".\"id\""
        );
        let m = MysqlPlatform;
        assert_eq!(m.quote_identifier_chain(&["db", "t"]), "`db`.`t`");
    }

    #[test]
    fn string_literal_escaping() {
        let p = AnsiPlatform;
        assert_eq!(p.quote_string("O'Brien"), "'O''Brien'");

        let m = MysqlPlatform;
        assert_eq!(m.quote_string("O'Brien"), "'O\\'Brien'");
        assert_eq!(m.quote_string("a\\b"), "'a\\\\b'");
    }

    #[test]
    fn value_literals() {
        let p = AnsiPlatform;
        assert_eq!(p.quote_value(&Value::Null), "NULL");
        assert_eq!(p.quote_value(&Value::Bool(true)), "TRUE");
        assert_eq!(p.quote_value(&Value::Int(-7)), "-7");
        assert_eq!(p.quote_value(&Value::Decimal("1.50".into())), "1.50");
        assert_eq!(p.quote_value(&Value::Text("x".into())), "'x'");
        assert_eq!(p.quote_value(&Value::Bytes(vec![0xAB, 0x01])), "X'AB01'");
    }
}
