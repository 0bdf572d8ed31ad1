//! Uniform database access over native client libraries.
//!
//! unidb gives every backend the same shape: a [`Driver`] producing a
//! [`Connection`], an [`Adapter`] façade composing that connection
//! with a dialect-aware [`Platform`], and a normalized [`ResultSet`]
//! for rows. Connection descriptors are alias-tolerant maps resolved
//! into [`ConnectionParameters`].
//!
//! ```no_run
//! use unidb::{Adapter, AnsiPlatform, ConnectionParameters};
//! use unidb::sqlite::SqliteDriver;
//!
//! # fn main() -> unidb::Result<()> {
//! let params = ConnectionParameters::default().database("app.db");
//! let mut adapter = Adapter::new(SqliteDriver::new(), &params, Box::new(AnsiPlatform))?;
//! for row in adapter.query("SELECT id, name FROM users")? {
//!     let row = row?;
//!     println!("{:?}", row.get_by_name("name"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Backends are feature-gated: `sqlite` (default) and `mysql`.

pub use unidb_core::*;

#[cfg(feature = "mysql")]
pub use unidb_mysql as mysql;
#[cfg(feature = "sqlite")]
pub use unidb_sqlite as sqlite;
