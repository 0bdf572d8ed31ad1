//! [`MysqlClient`] backed by libmysqlclient.
//!
//! Results go through `mysql_store_result`, so a result set is fully
//! materialized on the client before iteration begins and stays valid
//! after the next statement runs. Parameter binding is emulated: bound
//! values are rendered into SQL literals with
//! `mysql_real_escape_string` before the statement is sent.

use crate::client::{ConnectTarget, MysqlClient, QueryOutcome};
use crate::ffi;
use crate::options::MysqlOption;
use std::ffi::{CStr, CString, c_char, c_uint, c_void};
use std::fmt;
use std::ptr;
use std::sync::Arc;
use unidb_core::error::{ConnectionError, Error, QueryError, Result};
use unidb_core::{ColumnInfo, Row, RowStream, TlsOptions, Value};

/// The real native client.
pub struct NativeClient {
    handle: *mut ffi::MYSQL,
    /// TLS strings handed to the C library stay alive for the handle's
    /// lifetime.
    tls_strings: Vec<CString>,
}

impl NativeClient {
    /// Allocate a fresh native handle.
    pub fn new() -> Result<Self> {
        // SAFETY: a null argument asks the library to allocate.
        let handle = unsafe { ffi::mysql_init(ptr::null_mut()) };
        if handle.is_null() {
            return Err(Error::Connection(ConnectionError {
                code: None,
                message: "mysql_init failed (out of memory)".to_string(),
                source: None,
            }));
        }
        Ok(Self {
            handle,
            tls_strings: Vec::new(),
        })
    }

    fn native_error(&self) -> (i32, String) {
        // SAFETY: handle is a valid MYSQL pointer.
        let code = unsafe { ffi::mysql_errno(self.handle) } as i32;
        // SAFETY: mysql_error always returns a valid C string.
        let message = unsafe { CStr::from_ptr(ffi::mysql_error(self.handle)) }
            .to_string_lossy()
            .into_owned();
        (code, message)
    }

    fn connection_error(&self) -> Error {
        let (code, message) = self.native_error();
        Error::Connection(ConnectionError {
            code: Some(code),
            message,
            source: None,
        })
    }

    fn query_failure(&self, sql: &str) -> Error {
        let (code, message) = self.native_error();
        Error::InvalidQuery(QueryError {
            message,
            sql: Some(sql.to_string()),
            code: Some(code),
        })
    }

    fn set_uint_option(&mut self, option: std::ffi::c_int, value: c_uint) -> Result<()> {
        // SAFETY: handle is valid; the library copies the pointed-to
        // value during the call.
        let rc = unsafe {
            ffi::mysql_options(self.handle, option, (&raw const value).cast::<c_void>())
        };
        if rc != 0 {
            return Err(self.connection_error());
        }
        Ok(())
    }

    /// Quote and escape one value as a SQL literal.
    fn literal(&mut self, value: &Value) -> Result<String> {
        Ok(match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Value::TinyInt(v) => v.to_string(),
            Value::SmallInt(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::BigInt(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::Bytes(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 2 + 3);
                out.push_str("X'");
                for b in bytes {
                    out.push_str(&format!("{b:02X}"));
                }
                out.push('\'');
                out
            }
            Value::Decimal(s) | Value::Text(s) => self.escaped(s),
            Value::Json(json) => self.escaped(&json.to_string()),
        })
    }

    fn escaped(&mut self, text: &str) -> String {
        let from = text.as_bytes();
        // Worst case per the C API contract: every byte escaped, plus
        // the terminator.
        let mut buf = vec![0_u8; from.len() * 2 + 1];
        // SAFETY: buf is large enough for the worst-case expansion and
        // from/len describe a valid byte range.
        let written = unsafe {
            ffi::mysql_real_escape_string(
                self.handle,
                buf.as_mut_ptr().cast::<c_char>(),
                from.as_ptr().cast::<c_char>(),
                from.len() as std::ffi::c_ulong,
            )
        } as usize;
        buf.truncate(written);
        format!("'{}'", String::from_utf8_lossy(&buf))
    }

    /// Render bound values into the placeholder positions, skipping
    /// quoted regions the same way placeholders are counted.
    fn render(&mut self, sql: &str, params: &[Value]) -> Result<String> {
        let mut out = String::with_capacity(sql.len() + params.len() * 8);
        let mut next = params.iter();
        let mut quote: Option<char> = None;
        let mut chars = sql.chars();
        while let Some(c) = chars.next() {
            match quote {
                Some(q) => {
                    out.push(c);
                    if c == '\\' && q != '`' {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    } else if c == q {
                        quote = None;
                    }
                }
                None => match c {
                    '\'' | '"' | '`' => {
                        quote = Some(c);
                        out.push(c);
                    }
                    '?' => {
                        let value = next.next().ok_or_else(|| {
                            Error::invalid_argument("not enough parameters for placeholders")
                        })?;
                        out.push_str(&self.literal(value)?);
                    }
                    _ => out.push(c),
                },
            }
        }
        Ok(out)
    }
}

impl MysqlClient for NativeClient {
    fn set_option(&mut self, option: &MysqlOption) -> Result<()> {
        match option {
            MysqlOption::ConnectTimeoutSecs(secs) => {
                self.set_uint_option(ffi::MYSQL_OPT_CONNECT_TIMEOUT, *secs)
            }
            MysqlOption::ReadTimeoutSecs(secs) => {
                self.set_uint_option(ffi::MYSQL_OPT_READ_TIMEOUT, *secs)
            }
            MysqlOption::WriteTimeoutSecs(secs) => {
                self.set_uint_option(ffi::MYSQL_OPT_WRITE_TIMEOUT, *secs)
            }
            MysqlOption::InitCommand(command) => {
                let c_command = CString::new(command.as_str()).map_err(|_| {
                    Error::invalid_argument("init_command contains a null byte")
                })?;
                // SAFETY: handle is valid; the library copies the
                // command string during the call.
                let rc = unsafe {
                    ffi::mysql_options(
                        self.handle,
                        ffi::MYSQL_INIT_COMMAND,
                        c_command.as_ptr().cast::<c_void>(),
                    )
                };
                if rc != 0 {
                    return Err(self.connection_error());
                }
                Ok(())
            }
            MysqlOption::LocalInfile(enabled) => {
                self.set_uint_option(ffi::MYSQL_OPT_LOCAL_INFILE, u32::from(*enabled))
            }
        }
    }

    fn set_tls(&mut self, tls: &TlsOptions) -> Result<()> {
        let mut keep = |field: &Option<String>| -> Result<*const c_char> {
            match field {
                None => Ok(ptr::null()),
                Some(s) => {
                    let c = CString::new(s.as_str())
                        .map_err(|_| Error::invalid_argument("TLS path contains a null byte"))?;
                    let ptr = c.as_ptr();
                    self.tls_strings.push(c);
                    Ok(ptr)
                }
            }
        };
        let key = keep(&tls.client_key)?;
        let cert = keep(&tls.client_cert)?;
        let ca = keep(&tls.ca_cert)?;
        let capath = keep(&tls.ca_path)?;
        let cipher = keep(&tls.cipher)?;
        // SAFETY: all pointers are null or valid C strings kept alive
        // in tls_strings until the handle closes.
        unsafe { ffi::mysql_ssl_set(self.handle, key, cert, ca, capath, cipher) };
        Ok(())
    }

    fn connect(&mut self, target: &ConnectTarget) -> Result<()> {
        let to_c = |field: &Option<String>, what: &str| -> Result<Option<CString>> {
            field
                .as_deref()
                .map(|s| {
                    CString::new(s).map_err(|_| {
                        Error::invalid_argument(format!("{what} contains a null byte"))
                    })
                })
                .transpose()
        };
        let host = to_c(&target.host, "host")?;
        let user = to_c(&target.user, "user")?;
        let password = to_c(&target.password, "password")?;
        let database = to_c(&target.database, "database")?;
        let socket = to_c(&target.socket, "socket")?;
        let as_ptr =
            |c: &Option<CString>| c.as_ref().map_or(ptr::null(), |c| c.as_ptr());

        // SAFETY: handle is valid, every string pointer is null or a
        // valid C string outliving the call. Port zero selects the
        // library default.
        let connected = unsafe {
            ffi::mysql_real_connect(
                self.handle,
                as_ptr(&host),
                as_ptr(&user),
                as_ptr(&password),
                as_ptr(&database),
                c_uint::from(target.port.unwrap_or(0)),
                as_ptr(&socket),
                0,
            )
        };
        if connected.is_null() {
            return Err(self.connection_error());
        }
        Ok(())
    }

    fn pending_error(&self) -> Option<(i32, String)> {
        // SAFETY: handle is valid.
        let code = unsafe { ffi::mysql_errno(self.handle) };
        if code == 0 {
            return None;
        }
        Some(self.native_error())
    }

    fn set_charset(&mut self, charset: &str) -> Result<()> {
        let c_charset = CString::new(charset)
            .map_err(|_| Error::invalid_argument("charset contains a null byte"))?;
        // SAFETY: handle is valid, c_charset is a valid C string.
        let rc = unsafe { ffi::mysql_set_character_set(self.handle, c_charset.as_ptr()) };
        if rc != 0 {
            return Err(self.connection_error());
        }
        Ok(())
    }

    fn query(&mut self, sql: &str) -> Result<QueryOutcome> {
        let c_sql = CString::new(sql).map_err(|_| {
            Error::InvalidQuery(QueryError {
                message: "SQL contains an interior null byte".to_string(),
                sql: Some(sql.to_string()),
                code: None,
            })
        })?;
        // SAFETY: handle is valid; the explicit length covers the
        // whole statement.
        let rc = unsafe {
            ffi::mysql_real_query(
                self.handle,
                c_sql.as_ptr(),
                c_sql.as_bytes().len() as std::ffi::c_ulong,
            )
        };
        if rc != 0 {
            return Err(self.query_failure(sql));
        }

        // SAFETY: handle is valid and a query just succeeded.
        let res = unsafe { ffi::mysql_store_result(self.handle) };
        if res.is_null() {
            // Null result plus zero field count is the documented
            // success-without-result-set convention.
            // SAFETY: handle is valid.
            if unsafe { ffi::mysql_field_count(self.handle) } == 0 {
                // SAFETY: handle is valid.
                let affected = unsafe { ffi::mysql_affected_rows(self.handle) };
                return Ok(QueryOutcome::Done { affected });
            }
            return Err(self.query_failure(sql));
        }
        Ok(QueryOutcome::Rows(Box::new(StoredRows::new(res))))
    }

    fn execute_statement(&mut self, sql: &str, params: &[Value]) -> Result<QueryOutcome> {
        let rendered = self.render(sql, params)?;
        self.query(&rendered)
    }

    fn autocommit(&mut self, enabled: bool) -> Result<()> {
        // SAFETY: handle is valid.
        let rc = unsafe { ffi::mysql_autocommit(self.handle, c_char::from(enabled)) };
        if rc != 0 {
            return Err(self.connection_error());
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        // SAFETY: handle is valid.
        let rc = unsafe { ffi::mysql_commit(self.handle) };
        if rc != 0 {
            return Err(self.connection_error());
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        // SAFETY: handle is valid.
        let rc = unsafe { ffi::mysql_rollback(self.handle) };
        if rc != 0 {
            return Err(self.connection_error());
        }
        Ok(())
    }

    fn insert_id(&mut self) -> u64 {
        // SAFETY: handle is valid.
        unsafe { ffi::mysql_insert_id(self.handle) }
    }

    fn close(&mut self) {
        if self.handle.is_null() {
            return;
        }
        // SAFETY: handle is the one mysql_init gave us.
        unsafe { ffi::mysql_close(self.handle) };
        self.handle = ptr::null_mut();
        self.tls_strings.clear();
    }
}

impl Drop for NativeClient {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for NativeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeClient")
            .field("open", &!self.handle.is_null())
            .finish_non_exhaustive()
    }
}

/// A client-side materialized result set. Row data arrives as text on
/// the classic protocol, so every non-null cell surfaces as
/// `Value::Text`.
struct StoredRows {
    res: *mut ffi::MYSQL_RES,
    columns: Arc<ColumnInfo>,
}

impl StoredRows {
    fn new(res: *mut ffi::MYSQL_RES) -> Self {
        // SAFETY: res is a valid stored result.
        let count = unsafe { ffi::mysql_num_fields(res) };
        let mut names = Vec::with_capacity(count as usize);
        for i in 0..count {
            // SAFETY: i is within the field count; the name member
            // leads the C struct.
            let name = unsafe {
                let field = ffi::mysql_fetch_field_direct(res, i);
                if field.is_null() || (*field).name.is_null() {
                    format!("col{i}")
                } else {
                    CStr::from_ptr((*field).name).to_string_lossy().into_owned()
                }
            };
            names.push(name);
        }
        Self {
            res,
            columns: Arc::new(ColumnInfo::new(names)),
        }
    }
}

impl RowStream for StoredRows {
    fn next_row(&mut self) -> Option<unidb_core::error::Result<Row>> {
        // SAFETY: res stays valid until drop; a null row on a stored
        // result means end of data.
        let row = unsafe { ffi::mysql_fetch_row(self.res) };
        if row.is_null() {
            return None;
        }
        // SAFETY: lengths parallels the fetched row.
        let lengths = unsafe { ffi::mysql_fetch_lengths(self.res) };
        let count = self.columns.len();
        let mut values = Vec::with_capacity(count);
        for i in 0..count {
            // SAFETY: i is within the field count; each cell is null
            // or a byte buffer of the reported length.
            let value = unsafe {
                let cell = *row.add(i);
                if cell.is_null() {
                    Value::Null
                } else {
                    let len = *lengths.add(i) as usize;
                    let bytes = std::slice::from_raw_parts(cell.cast::<u8>(), len);
                    Value::Text(String::from_utf8_lossy(bytes).into_owned())
                }
            };
            values.push(value);
        }
        Some(Ok(Row::with_columns(Arc::clone(&self.columns), values)))
    }

    fn columns(&self) -> Arc<ColumnInfo> {
        Arc::clone(&self.columns)
    }
}

impl Drop for StoredRows {
    fn drop(&mut self) {
        // SAFETY: res was produced by mysql_store_result and not yet
        // freed.
        unsafe { ffi::mysql_free_result(self.res) };
    }
}
