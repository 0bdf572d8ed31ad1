//! SQLite backend for unidb.
//!
//! Wraps the bundled native SQLite library behind the unidb driver
//! contract. Connections are synchronous: every call blocks until the
//! native library returns. The `database` connection parameter is the
//! filesystem path (or a `file:` URI); omit it for an in-memory
//! database.
//!
//! Driver options are resolved once at [`SqliteDriver::open`] time from
//! a fixed set of names (unknown names are ignored):
//!
//! | name               | effect                              |
//! |--------------------|-------------------------------------|
//! | `busy_timeout_ms`  | `sqlite3_busy_timeout`              |
//! | `foreign_keys`     | `PRAGMA foreign_keys`               |
//! | `journal_mode`     | `PRAGMA journal_mode`               |
//! | `cache_size_kb`    | `PRAGMA cache_size` (negative form) |

mod connection;
mod driver;
mod options;
mod statement;
mod types;

pub use connection::SqliteConnection;
pub use driver::SqliteDriver;
pub use options::SqliteOption;
pub use statement::SqliteStatement;
