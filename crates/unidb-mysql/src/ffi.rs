//! Hand-written bindings for the slice of libmysqlclient we call.
//!
//! Kept to the classic-protocol API surface; the statement API is not
//! bound because parameter binding is emulated client-side.

#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_int, c_uint, c_ulong, c_void};

/// Opaque connection handle.
pub enum MYSQL {}

/// Opaque result-set handle.
pub enum MYSQL_RES {}

/// A fetched row: one nullable C string per column.
pub type MYSQL_ROW = *mut *mut c_char;

/// Column metadata. Only the leading `name` member is read through
/// this binding; the remainder of the C struct is never accessed.
#[repr(C)]
pub struct MYSQL_FIELD {
    pub name: *mut c_char,
    _rest: [u8; 0],
}

// mysql_option constants (enum mysql_option in mysql.h).
pub const MYSQL_OPT_CONNECT_TIMEOUT: c_int = 0;
pub const MYSQL_INIT_COMMAND: c_int = 3;
pub const MYSQL_OPT_LOCAL_INFILE: c_int = 8;
pub const MYSQL_OPT_READ_TIMEOUT: c_int = 11;
pub const MYSQL_OPT_WRITE_TIMEOUT: c_int = 12;

#[link(name = "mysqlclient")]
unsafe extern "C" {
    pub fn mysql_init(mysql: *mut MYSQL) -> *mut MYSQL;
    pub fn mysql_options(mysql: *mut MYSQL, option: c_int, arg: *const c_void) -> c_int;
    pub fn mysql_ssl_set(
        mysql: *mut MYSQL,
        key: *const c_char,
        cert: *const c_char,
        ca: *const c_char,
        capath: *const c_char,
        cipher: *const c_char,
    ) -> c_char;
    pub fn mysql_real_connect(
        mysql: *mut MYSQL,
        host: *const c_char,
        user: *const c_char,
        passwd: *const c_char,
        db: *const c_char,
        port: c_uint,
        unix_socket: *const c_char,
        client_flag: c_ulong,
    ) -> *mut MYSQL;
    pub fn mysql_errno(mysql: *mut MYSQL) -> c_uint;
    pub fn mysql_error(mysql: *mut MYSQL) -> *const c_char;
    pub fn mysql_set_character_set(mysql: *mut MYSQL, csname: *const c_char) -> c_int;
    pub fn mysql_real_query(mysql: *mut MYSQL, stmt: *const c_char, length: c_ulong) -> c_int;
    pub fn mysql_store_result(mysql: *mut MYSQL) -> *mut MYSQL_RES;
    pub fn mysql_field_count(mysql: *mut MYSQL) -> c_uint;
    pub fn mysql_num_fields(result: *mut MYSQL_RES) -> c_uint;
    pub fn mysql_fetch_row(result: *mut MYSQL_RES) -> MYSQL_ROW;
    pub fn mysql_fetch_lengths(result: *mut MYSQL_RES) -> *mut c_ulong;
    pub fn mysql_fetch_field_direct(result: *mut MYSQL_RES, fieldnr: c_uint) -> *mut MYSQL_FIELD;
    pub fn mysql_free_result(result: *mut MYSQL_RES);
    pub fn mysql_affected_rows(mysql: *mut MYSQL) -> u64;
    pub fn mysql_insert_id(mysql: *mut MYSQL) -> u64;
    pub fn mysql_autocommit(mysql: *mut MYSQL, mode: c_char) -> c_char;
    pub fn mysql_commit(mysql: *mut MYSQL) -> c_char;
    pub fn mysql_rollback(mysql: *mut MYSQL) -> c_char;
    pub fn mysql_close(mysql: *mut MYSQL);
    pub fn mysql_real_escape_string(
        mysql: *mut MYSQL,
        to: *mut c_char,
        from: *const c_char,
        length: c_ulong,
    ) -> c_ulong;
}
