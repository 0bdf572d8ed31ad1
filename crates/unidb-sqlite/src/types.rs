//! Type bridging between `Value` and SQLite storage classes.
//!
//! SQLite stores five classes: INTEGER, REAL, TEXT, BLOB and NULL.
//! Richer `Value` variants are narrowed on bind (decimals and JSON as
//! TEXT) and widened on read (INTEGER always comes back as `BigInt`).

use libsqlite3_sys as ffi;
use std::ffi::{CStr, c_int};
use unidb_core::Value;

/// Bind a `Value` to a prepared statement parameter.
///
/// # Safety
/// `stmt` must be a valid prepared statement handle and `index` a
/// valid 1-based parameter index.
pub(crate) unsafe fn bind_value(stmt: *mut ffi::sqlite3_stmt, index: c_int, value: &Value) -> c_int {
    match value {
        Value::Null => unsafe { ffi::sqlite3_bind_null(stmt, index) },
        Value::Bool(b) => unsafe { ffi::sqlite3_bind_int(stmt, index, c_int::from(*b)) },
        Value::TinyInt(v) => unsafe { ffi::sqlite3_bind_int(stmt, index, c_int::from(*v)) },
        Value::SmallInt(v) => unsafe { ffi::sqlite3_bind_int(stmt, index, c_int::from(*v)) },
        Value::Int(v) => unsafe { ffi::sqlite3_bind_int(stmt, index, *v) },
        Value::BigInt(v) => unsafe { ffi::sqlite3_bind_int64(stmt, index, *v) },
        Value::Float(v) => unsafe { ffi::sqlite3_bind_double(stmt, index, f64::from(*v)) },
        Value::Double(v) => unsafe { ffi::sqlite3_bind_double(stmt, index, *v) },
        Value::Decimal(s) | Value::Text(s) => unsafe { bind_text(stmt, index, s) },
        Value::Bytes(b) => unsafe {
            ffi::sqlite3_bind_blob(
                stmt,
                index,
                b.as_ptr().cast(),
                b.len() as c_int,
                ffi::SQLITE_TRANSIENT(),
            )
        },
        Value::Json(v) => {
            let rendered = v.to_string();
            unsafe { bind_text(stmt, index, &rendered) }
        }
    }
}

unsafe fn bind_text(stmt: *mut ffi::sqlite3_stmt, index: c_int, s: &str) -> c_int {
    let bytes = s.as_bytes();
    unsafe {
        ffi::sqlite3_bind_text(
            stmt,
            index,
            bytes.as_ptr().cast(),
            bytes.len() as c_int,
            ffi::SQLITE_TRANSIENT(),
        )
    }
}

/// Read the column at `index` from the current row.
///
/// # Safety
/// `stmt` must be a valid statement handle positioned on a row
/// (the last `sqlite3_step` returned `SQLITE_ROW`).
pub(crate) unsafe fn read_column(stmt: *mut ffi::sqlite3_stmt, index: c_int) -> Value {
    let col_type = unsafe { ffi::sqlite3_column_type(stmt, index) };
    match col_type {
        ffi::SQLITE_INTEGER => Value::BigInt(unsafe { ffi::sqlite3_column_int64(stmt, index) }),
        ffi::SQLITE_FLOAT => Value::Double(unsafe { ffi::sqlite3_column_double(stmt, index) }),
        ffi::SQLITE_TEXT => {
            let ptr = unsafe { ffi::sqlite3_column_text(stmt, index) };
            let len = unsafe { ffi::sqlite3_column_bytes(stmt, index) } as usize;
            if ptr.is_null() {
                Value::Null
            } else {
                let bytes = unsafe { std::slice::from_raw_parts(ptr, len) };
                Value::Text(String::from_utf8_lossy(bytes).into_owned())
            }
        }
        ffi::SQLITE_BLOB => {
            let ptr = unsafe { ffi::sqlite3_column_blob(stmt, index) };
            let len = unsafe { ffi::sqlite3_column_bytes(stmt, index) } as usize;
            if ptr.is_null() {
                Value::Bytes(Vec::new())
            } else {
                let bytes = unsafe { std::slice::from_raw_parts(ptr.cast::<u8>(), len) };
                Value::Bytes(bytes.to_vec())
            }
        }
        _ => Value::Null,
    }
}

/// Column name at `index`, or a positional fallback.
///
/// # Safety
/// `stmt` must be a valid prepared statement handle.
pub(crate) unsafe fn column_name(stmt: *mut ffi::sqlite3_stmt, index: c_int) -> String {
    let ptr = unsafe { ffi::sqlite3_column_name(stmt, index) };
    if ptr.is_null() {
        format!("col{index}")
    } else {
        unsafe { CStr::from_ptr(ptr) }
            .to_string_lossy()
            .into_owned()
    }
}
