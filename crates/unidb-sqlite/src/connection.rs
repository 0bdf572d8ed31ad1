//! SQLite connection implementation.
//!
//! The connection owns at most one `sqlite3` handle. A null handle
//! means Disconnected; every statement-issuing operation auto-connects
//! first, so callers can treat the connection as always ready.

use crate::options::SqliteOption;
use crate::statement::{
    self, CursorDisposal, RowCursor, SqliteStatement, last_error_message, query_error,
};
use libsqlite3_sys as ffi;
use std::ffi::{CStr, CString};
use std::fmt;
use std::ptr;
use tracing::debug;
use unidb_core::error::{ConnectionError, Error, QueryError, Result, StateErrorKind};
use unidb_core::{Connection, ResultSet, SharedProfiler};

/// A connection to a SQLite database.
///
/// Not shareable between callers: every operation takes `&mut self`
/// and the native handle holds a single cursor at a time.
pub struct SqliteConnection {
    db: *mut ffi::sqlite3,
    path: String,
    options: Vec<SqliteOption>,
    in_transaction: bool,
    profiler: Option<SharedProfiler>,
}

impl SqliteConnection {
    pub(crate) fn new(path: String, options: Vec<SqliteOption>) -> Self {
        Self {
            db: ptr::null_mut(),
            path,
            options,
            in_transaction: false,
            profiler: None,
        }
    }

    /// Wrap a pre-built native handle.
    ///
    /// The connection takes ownership: the handle is closed on
    /// disconnect or drop.
    ///
    /// # Safety
    /// `db` must be a valid, open `sqlite3` handle not owned by
    /// anything else.
    pub unsafe fn from_raw_handle(db: *mut ffi::sqlite3) -> Self {
        Self {
            db,
            path: String::new(),
            options: Vec::new(),
            in_transaction: false,
            profiler: None,
        }
    }

    /// The database path this connection was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Run SQL discarding any rows. Used for pragmas and transaction
    /// control; bypasses the profiler.
    fn exec_raw(&mut self, sql: &str) -> Result<()> {
        let c_sql = CString::new(sql)
            .map_err(|_| Error::invalid_argument("SQL contains an interior null byte"))?;
        let mut errmsg: *mut std::ffi::c_char = ptr::null_mut();
        // SAFETY: db is valid (callers connect first), c_sql is a
        // valid C string, errmsg receives an optional error buffer.
        let rc = unsafe {
            ffi::sqlite3_exec(
                self.db,
                c_sql.as_ptr(),
                None,
                ptr::null_mut(),
                &raw mut errmsg,
            )
        };
        if rc != ffi::SQLITE_OK {
            let message = if errmsg.is_null() {
                last_error_message(self.db)
            } else {
                // SAFETY: errmsg is a SQLite-allocated C string; free
                // it after copying.
                let msg = unsafe { CStr::from_ptr(errmsg) }.to_string_lossy().into_owned();
                unsafe { ffi::sqlite3_free(errmsg.cast()) };
                msg
            };
            return Err(Error::InvalidQuery(QueryError {
                message,
                sql: Some(sql.to_string()),
                code: Some(rc),
            }));
        }
        Ok(())
    }

    fn apply_options(&mut self) -> Result<()> {
        let options = self.options.clone();
        for option in &options {
            match option {
                SqliteOption::BusyTimeoutMs(ms) => {
                    // SAFETY: db is valid.
                    unsafe { ffi::sqlite3_busy_timeout(self.db, *ms) };
                }
                SqliteOption::ForeignKeys(on) => {
                    let flag = if *on { "ON" } else { "OFF" };
                    self.exec_raw(&format!("PRAGMA foreign_keys = {flag}"))?;
                }
                SqliteOption::JournalMode(mode) => {
                    // Restrict to alphanumerics: pragma arguments
                    // cannot be bound.
                    let mode: String = mode
                        .chars()
                        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
                        .collect();
                    self.exec_raw(&format!("PRAGMA journal_mode = {mode}"))?;
                }
                SqliteOption::CacheSizeKb(kb) => {
                    self.exec_raw(&format!("PRAGMA cache_size = -{kb}"))?;
                }
            }
        }
        Ok(())
    }

    fn execute_inner(&mut self, sql: &str) -> Result<ResultSet<'_>> {
        let handle = statement::prepare(self.db, sql)?;
        // SAFETY: handle is a valid compiled statement.
        let has_rows = unsafe { ffi::sqlite3_column_count(handle.raw()) } > 0;
        if has_rows {
            let cursor = RowCursor::new(handle.into_raw(), self.db, sql, CursorDisposal::Finalize);
            return Ok(ResultSet::streamed(Box::new(cursor)));
        }

        // SAFETY: handle is valid; rowless statements complete in one
        // step and the handle is finalized when it drops.
        let rc = unsafe { ffi::sqlite3_step(handle.raw()) };
        match rc {
            ffi::SQLITE_DONE | ffi::SQLITE_ROW => {
                // SAFETY: db is valid.
                let affected = unsafe { ffi::sqlite3_changes(self.db) } as u64;
                // SAFETY: db is valid.
                let rowid = unsafe { ffi::sqlite3_last_insert_rowid(self.db) };
                let generated = (rowid != 0).then(|| rowid.to_string());
                Ok(ResultSet::affected(affected, generated))
            }
            _ => Err(query_error(self.db, sql)),
        }
    }
}

impl Connection for SqliteConnection {
    type Stmt<'conn>
        = SqliteStatement<'conn>
    where
        Self: 'conn;

    fn connect(&mut self) -> Result<()> {
        if !self.db.is_null() {
            return Ok(());
        }

        let c_path = CString::new(self.path.as_str())
            .map_err(|_| Error::invalid_argument("database path contains a null byte"))?;
        let flags =
            ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE | ffi::SQLITE_OPEN_URI;
        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        // SAFETY: all pointers are valid; the return code is checked.
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &raw mut db, flags, ptr::null()) };

        if rc != ffi::SQLITE_OK {
            // SQLite may allocate a handle even on failure; close it
            // so a failed connect leaves nothing dangling.
            let message = if db.is_null() {
                // SAFETY: errstr handles any code.
                unsafe { CStr::from_ptr(ffi::sqlite3_errstr(rc)) }
                    .to_string_lossy()
                    .into_owned()
            } else {
                let msg = last_error_message(db);
                // SAFETY: db was allocated by sqlite3_open_v2 and has
                // no statements yet.
                unsafe { ffi::sqlite3_close(db) };
                msg
            };
            return Err(Error::Connection(ConnectionError {
                code: Some(rc),
                message: format!("failed to open '{}': {}", self.path, message),
                source: None,
            }));
        }

        // Post-open error flag: treat a poisoned handle as a failed
        // connect even though open reported success.
        // SAFETY: db is valid.
        let state = unsafe { ffi::sqlite3_errcode(db) };
        if state != ffi::SQLITE_OK {
            let message = last_error_message(db);
            // SAFETY: db is valid, not yet stored, and has no
            // statements.
            unsafe { ffi::sqlite3_close(db) };
            return Err(Error::Connection(ConnectionError {
                code: Some(state),
                message,
                source: None,
            }));
        }

        self.db = db;
        if let Err(e) = self.apply_options() {
            self.disconnect();
            return Err(e);
        }
        debug!(path = %self.path, "sqlite connection established");
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.db.is_null() {
            return;
        }
        // SAFETY: db is the handle we own; exclusive ownership means
        // every statement on it has been finalized by now.
        unsafe { ffi::sqlite3_close(self.db) };
        self.db = ptr::null_mut();
        self.in_transaction = false;
        debug!(path = %self.path, "sqlite connection closed");
    }

    fn is_connected(&self) -> bool {
        !self.db.is_null()
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn begin(&mut self) -> Result<()> {
        self.connect()?;
        self.exec_raw("BEGIN")?;
        self.in_transaction = true;
        debug!("transaction begun");
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.connect()?;
        if self.in_transaction {
            self.exec_raw("COMMIT")?;
        }
        self.in_transaction = false;
        debug!("transaction committed");
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if !self.is_connected() {
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
        self.exec_raw("ROLLBACK")?;
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
        let handle = statement::prepare(self.db, sql)?;
        Ok(SqliteStatement::new(handle, self.db, sql))
    }

    fn last_generated_value(&mut self, _name: Option<&str>) -> Result<Option<String>> {
        self.connect()?;
        // SAFETY: db is valid after connect.
        let rowid = unsafe { ffi::sqlite3_last_insert_rowid(self.db) };
        Ok((rowid != 0).then(|| rowid.to_string()))
    }

    fn set_profiler(&mut self, profiler: Option<SharedProfiler>) {
        self.profiler = profiler;
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.path)
            .field("connected", &self.is_connected())
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}
