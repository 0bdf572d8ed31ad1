//! Core types and traits for unidb.
//!
//! This crate defines the driver-independent contract every unidb
//! backend implements:
//!
//! - [`Driver`]/[`Connection`]/[`Statement`]: connection lifecycle,
//!   transaction control, statement execution
//! - [`ResultSet`]: normalized buffered/streamed result iteration
//! - [`ConnectionParameters`]: alias-tolerant parameter resolution
//! - [`Platform`]: SQL dialect quoting rules
//! - [`Adapter`]: the façade composing a driver and a platform
//! - [`Profiler`]: side-channel execution observer
//!
//! The model is synchronous and blocking: operations hold the calling
//! thread until the native client library returns, and a connection is
//! exclusively owned by one caller at a time.

pub mod adapter;
pub mod driver;
pub mod error;
pub mod params;
pub mod platform;
pub mod profiler;
pub mod result;
pub mod row;
pub mod value;

pub use adapter::Adapter;
pub use driver::{Capabilities, Connection, Driver, Statement};
pub use error::{
    ConnectionError, Error, InvalidArgumentError, QueryError, Result, StateError, StateErrorKind,
    TypeError,
};
pub use params::{ConnectionParameters, TlsOptions};
pub use platform::{AnsiPlatform, MysqlPlatform, Platform};
pub use profiler::{ProfileEntry, Profiler, RecordingProfiler, SharedProfiler};
pub use result::{ResultSet, RowStream};
pub use row::{ColumnInfo, FromValue, Row};
pub use value::Value;
