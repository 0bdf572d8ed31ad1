//! Prepared statements and row cursors.

use crate::types;
use libsqlite3_sys as ffi;
use std::ffi::{CStr, CString, c_int};
use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ptr;
use std::sync::Arc;
use unidb_core::error::{Error, QueryError, Result};
use unidb_core::{ColumnInfo, ResultSet, Row, RowStream, Statement, Value};

/// Read the native error message for a database handle.
pub(crate) fn last_error_message(db: *mut ffi::sqlite3) -> String {
    if db.is_null() {
        return "no database handle".to_string();
    }
    // SAFETY: db is a valid handle; errmsg returns a valid C string
    // owned by SQLite.
    unsafe { CStr::from_ptr(ffi::sqlite3_errmsg(db)) }
        .to_string_lossy()
        .into_owned()
}

/// Build an `InvalidQuery` error from the handle's current error state.
pub(crate) fn query_error(db: *mut ffi::sqlite3, sql: &str) -> Error {
    // SAFETY: db is a valid handle.
    let code = if db.is_null() {
        None
    } else {
        Some(unsafe { ffi::sqlite3_extended_errcode(db) })
    };
    Error::InvalidQuery(QueryError {
        message: last_error_message(db),
        sql: Some(sql.to_string()),
        code,
    })
}

/// Owned native prepared-statement handle, finalized on drop.
pub(crate) struct StatementHandle {
    raw: *mut ffi::sqlite3_stmt,
}

impl StatementHandle {
    pub(crate) fn raw(&self) -> *mut ffi::sqlite3_stmt {
        self.raw
    }

    /// Give up ownership without finalizing.
    pub(crate) fn into_raw(self) -> *mut ffi::sqlite3_stmt {
        ManuallyDrop::new(self).raw
    }
}

impl Drop for StatementHandle {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            // SAFETY: raw is a valid statement handle we own.
            unsafe { ffi::sqlite3_finalize(self.raw) };
        }
    }
}

/// Compile `sql` against `db`.
pub(crate) fn prepare(db: *mut ffi::sqlite3, sql: &str) -> Result<StatementHandle> {
    let c_sql = CString::new(sql).map_err(|_| {
        Error::InvalidQuery(QueryError {
            message: "SQL contains an interior null byte".to_string(),
            sql: Some(sql.to_string()),
            code: None,
        })
    })?;
    let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();
    // SAFETY: db is valid, c_sql is a valid C string, stmt receives
    // the compiled handle.
    let rc = unsafe {
        ffi::sqlite3_prepare_v2(db, c_sql.as_ptr(), -1, &raw mut stmt, ptr::null_mut())
    };
    if rc != ffi::SQLITE_OK {
        // A failed prepare leaves stmt null; nothing to release.
        return Err(query_error(db, sql));
    }
    Ok(StatementHandle { raw: stmt })
}

/// Column metadata for a compiled statement.
pub(crate) fn column_info(stmt: *mut ffi::sqlite3_stmt) -> Arc<ColumnInfo> {
    // SAFETY: stmt is a valid statement handle.
    let count = unsafe { ffi::sqlite3_column_count(stmt) };
    let names = (0..count)
        .map(|i| // SAFETY: i is a valid column index.
            unsafe { types::column_name(stmt, i) })
        .collect();
    Arc::new(ColumnInfo::new(names))
}

/// What to do with the native statement when the cursor is dropped.
pub(crate) enum CursorDisposal {
    /// The cursor owns the statement: finalize it.
    Finalize,
    /// The statement outlives the cursor: reset for reuse.
    Reset,
}

/// Forward-only cursor stepping a live native statement.
///
/// The lifetime ties the cursor to the mutable borrow of whatever
/// owns the statement, so no other statement can run on the same
/// connection while the cursor is open.
pub(crate) struct RowCursor<'a> {
    stmt: *mut ffi::sqlite3_stmt,
    db: *mut ffi::sqlite3,
    columns: Arc<ColumnInfo>,
    sql: String,
    finished: bool,
    disposal: CursorDisposal,
    _owner: PhantomData<&'a mut ()>,
}

impl<'a> RowCursor<'a> {
    pub(crate) fn new(
        stmt: *mut ffi::sqlite3_stmt,
        db: *mut ffi::sqlite3,
        sql: &str,
        disposal: CursorDisposal,
    ) -> Self {
        Self {
            stmt,
            db,
            columns: column_info(stmt),
            sql: sql.to_string(),
            finished: false,
            disposal,
            _owner: PhantomData,
        }
    }
}

impl RowStream for RowCursor<'_> {
    fn next_row(&mut self) -> Option<Result<Row>> {
        if self.finished {
            return None;
        }
        // SAFETY: stmt is valid for the cursor's lifetime.
        let rc = unsafe { ffi::sqlite3_step(self.stmt) };
        match rc {
            ffi::SQLITE_ROW => {
                let count = self.columns.len() as c_int;
                let mut values = Vec::with_capacity(self.columns.len());
                for i in 0..count {
                    // SAFETY: the last step returned SQLITE_ROW.
                    values.push(unsafe { types::read_column(self.stmt, i) });
                }
                Some(Ok(Row::with_columns(Arc::clone(&self.columns), values)))
            }
            ffi::SQLITE_DONE => {
                self.finished = true;
                None
            }
            _ => {
                self.finished = true;
                Some(Err(query_error(self.db, &self.sql)))
            }
        }
    }

    fn columns(&self) -> Arc<ColumnInfo> {
        Arc::clone(&self.columns)
    }
}

impl Drop for RowCursor<'_> {
    fn drop(&mut self) {
        // SAFETY: stmt is valid; finalize/reset are the designated
        // release calls for each ownership mode.
        unsafe {
            match self.disposal {
                CursorDisposal::Finalize => {
                    ffi::sqlite3_finalize(self.stmt);
                }
                CursorDisposal::Reset => {
                    ffi::sqlite3_reset(self.stmt);
                    ffi::sqlite3_clear_bindings(self.stmt);
                }
            }
        }
    }
}

/// A prepared SQLite statement, reusable across executions.
pub struct SqliteStatement<'conn> {
    handle: StatementHandle,
    db: *mut ffi::sqlite3,
    sql: String,
    param_count: usize,
    _conn: PhantomData<&'conn mut ()>,
}

impl<'conn> SqliteStatement<'conn> {
    pub(crate) fn new(handle: StatementHandle, db: *mut ffi::sqlite3, sql: &str) -> Self {
        // SAFETY: handle is a valid compiled statement.
        let param_count = unsafe { ffi::sqlite3_bind_parameter_count(handle.raw()) } as usize;
        Self {
            handle,
            db,
            sql: sql.to_string(),
            param_count,
            _conn: PhantomData,
        }
    }
}

impl Statement for SqliteStatement<'_> {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn parameter_count(&self) -> usize {
        self.param_count
    }

    fn execute(&mut self, params: &[Value]) -> Result<ResultSet<'_>> {
        if params.len() != self.param_count {
            return Err(Error::InvalidQuery(QueryError {
                message: format!(
                    "statement expects {} parameters, got {}",
                    self.param_count,
                    params.len()
                ),
                sql: Some(self.sql.clone()),
                code: None,
            }));
        }

        let stmt = self.handle.raw();
        // SAFETY: stmt stays valid for the whole method; reset clears
        // any previous cursor state before rebinding.
        unsafe {
            ffi::sqlite3_reset(stmt);
            ffi::sqlite3_clear_bindings(stmt);
        }
        for (i, param) in params.iter().enumerate() {
            // SAFETY: index is 1-based and within the bound-parameter
            // count checked above.
            let rc = unsafe { types::bind_value(stmt, (i + 1) as c_int, param) };
            if rc != ffi::SQLITE_OK {
                return Err(query_error(self.db, &self.sql));
            }
        }

        // SAFETY: stmt is valid.
        let has_rows = unsafe { ffi::sqlite3_column_count(stmt) } > 0;
        if has_rows {
            let cursor = RowCursor::new(stmt, self.db, &self.sql, CursorDisposal::Reset);
            return Ok(ResultSet::streamed(Box::new(cursor)));
        }

        // SAFETY: stmt is valid; a rowless statement completes in one
        // step.
        let rc = unsafe { ffi::sqlite3_step(stmt) };
        // SAFETY: reset so the statement is reusable either way.
        unsafe { ffi::sqlite3_reset(stmt) };
        match rc {
            ffi::SQLITE_DONE | ffi::SQLITE_ROW => {
                // SAFETY: db is valid.
                let affected = unsafe { ffi::sqlite3_changes(self.db) } as u64;
                // SAFETY: db is valid.
                let rowid = unsafe { ffi::sqlite3_last_insert_rowid(self.db) };
                let generated = (rowid != 0).then(|| rowid.to_string());
                Ok(ResultSet::affected(affected, generated))
            }
            _ => Err(query_error(self.db, &self.sql)),
        }
    }
}

impl fmt::Debug for SqliteStatement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStatement")
            .field("sql", &self.sql)
            .field("param_count", &self.param_count)
            .finish_non_exhaustive()
    }
}
