//! Error types for unidb operations.

use std::fmt;

/// The primary error type for all unidb operations.
#[derive(Debug)]
pub enum Error {
    /// Malformed constructor or configuration input
    InvalidArgument(InvalidArgumentError),
    /// Native connect failure or post-connect error flag
    Connection(ConnectionError),
    /// Native execution reported failure for a statement
    InvalidQuery(QueryError),
    /// Operation invoked in a state that forbids it
    IllegalState(StateError),
    /// Value-to-Rust-type conversion failure
    Type(TypeError),
    /// I/O errors from the native transport
    Io(std::io::Error),
}

/// Malformed input to a constructor or configuration surface.
#[derive(Debug)]
pub struct InvalidArgumentError {
    pub message: String,
}

/// A failure establishing or validating the native connection.
///
/// Carries the native error code and message when the client library
/// reports them, plus the underlying cause when one exists.
#[derive(Debug)]
pub struct ConnectionError {
    pub code: Option<i32>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// The native library rejected a statement.
#[derive(Debug)]
pub struct QueryError {
    /// Native error text, verbatim
    pub message: String,
    /// The offending SQL, when known
    pub sql: Option<String>,
    /// Native error code, when the library exposes one
    pub code: Option<i32>,
}

/// The state that made the operation illegal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateErrorKind {
    /// Operation requires an established connection
    NotConnected,
    /// Operation requires a transaction begun on this connection
    NoActiveTransaction,
    /// Operation requires a seekable (buffered) result set
    ForwardOnlyResult,
}

/// An operation was invoked in a state that forbids it.
#[derive(Debug)]
pub struct StateError {
    pub kind: StateErrorKind,
    pub message: String,
}

/// A `Value` could not be converted to the requested Rust type.
#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

impl Error {
    /// Shorthand for an `InvalidArgument` error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(InvalidArgumentError {
            message: message.into(),
        })
    }

    /// Shorthand for a `ConnectionError` without a native code.
    pub fn connection(message: impl Into<String>) -> Self {
        Error::Connection(ConnectionError {
            code: None,
            message: message.into(),
            source: None,
        })
    }

    /// Shorthand for an `IllegalState` error of the given kind.
    pub fn illegal_state(kind: StateErrorKind, message: impl Into<String>) -> Self {
        Error::IllegalState(StateError {
            kind,
            message: message.into(),
        })
    }

    /// The native error code carried by this error, if any.
    pub fn native_code(&self) -> Option<i32> {
        match self {
            Error::Connection(e) => e.code,
            Error::InvalidQuery(e) => e.code,
            _ => None,
        }
    }

    /// The SQL that caused this error, if known.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::InvalidQuery(e) => e.sql.as_deref(),
            _ => None,
        }
    }

    /// True when this error means the connection itself is unusable.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Io(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(e) => write!(f, "Invalid argument: {}", e.message),
            Error::Connection(e) => {
                if let Some(code) = e.code {
                    write!(f, "Connection error ({}): {}", code, e.message)
                } else {
                    write!(f, "Connection error: {}", e.message)
                }
            }
            Error::InvalidQuery(e) => write!(f, "Invalid query: {}", e.message),
            Error::IllegalState(e) => write!(f, "Illegal state: {}", e.message),
            Error::Type(e) => {
                if let Some(col) = &e.column {
                    write!(
                        f,
                        "Type error in column '{}': expected {}, found {}",
                        col, e.expected, e.actual
                    )
                } else {
                    write!(f, "Type error: expected {}, found {}", e.expected, e.actual)
                }
            }
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connection(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::InvalidQuery(err)
    }
}

impl From<StateError> for Error {
    fn from(err: StateError) -> Self {
        Error::IllegalState(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

/// Result type alias for unidb operations.
pub type Result<T> = std::result::Result<T, Error>;
