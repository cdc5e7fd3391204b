//! Config Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use figment::Error as FigmentError;
use std::io::Error as IoError;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The merged configuration could not be extracted.
    #[display("invalid configuration: {_0}")]
    Invalid(FigmentError),
    /// The host/port pair does not form a bindable socket address.
    #[display("invalid bind address: {_0}")]
    InvalidBind(#[error(not(source))] String),
    /// A working directory could not be created.
    #[display("I/O error: {_0}")]
    Io(IoError),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
