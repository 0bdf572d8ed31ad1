//! MySQL backend for unidb.
//!
//! The connection logic is generic over [`MysqlClient`], a thin trait
//! mirroring the slice of the C client API the driver needs. The
//! `native` feature links libmysqlclient and provides [`MysqlDriver`];
//! without it the crate still builds and the handshake and
//! transaction semantics remain fully testable against a scripted
//! client.
//!
//! Handshake order is fixed: pre-connect driver options, TLS setup
//! when `use_ssl` is set and no socket path overrides it, the
//! handshake, a post-handshake error check, then the charset switch.

mod client;
mod connection;
#[cfg(feature = "native")]
mod driver;
#[cfg(feature = "native")]
mod ffi;
#[cfg(feature = "native")]
mod native;
mod options;

pub use client::{ConnectTarget, MysqlClient, QueryOutcome};
pub use connection::{MysqlConnection, MysqlStatement};
#[cfg(feature = "native")]
pub use driver::MysqlDriver;
#[cfg(feature = "native")]
pub use native::NativeClient;
pub use options::MysqlOption;
