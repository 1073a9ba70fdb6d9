//! Error types for record encoding and output.
//!
//! Escaping never fails. Errors come from two places only:
//!
//! - **Delegate failures**: an `Any` payload's serializer or the time marshaler
//!   cannot represent a value (unsupported shape, custom serializer error,
//!   year out of range)
//! - **Sink failures**: the underlying writer rejected the record
//!
//! In both cases the record is not written. No partial line ever reaches the sink.
//!
//! ## Examples
//!
//! ```rust
//! use jsonslog::Error;
//!
//! let err = Error::time("year outside of range [0,9999]: 10000");
//! assert!(err.to_string().contains("10000"));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while encoding or writing a record.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// An `Any` payload could not be marshaled to JSON
    #[error("marshal error: {0}")]
    Marshal(String),

    /// The time marshaler rejected a timestamp
    #[error("time marshal error: {0}")]
    Time(String),

    /// IO error while writing to the sink
    #[error("IO error: {0}")]
    Io(String),
}

impl Error {
    /// Creates a marshal error for an `Any` payload that failed to serialize.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonslog::Error;
    ///
    /// let err = Error::marshal("json: empty string");
    /// assert!(err.to_string().contains("empty string"));
    /// ```
    pub fn marshal<T: fmt::Display>(msg: T) -> Self {
        Error::Marshal(msg.to_string())
    }

    /// Creates a time marshal error.
    pub fn time<T: fmt::Display>(msg: T) -> Self {
        Error::Time(msg.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Marshal(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
