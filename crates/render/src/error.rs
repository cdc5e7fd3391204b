//! Render Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
/// The HTTP layer is the only place these are mapped onto status codes; inside
/// this crate every fatal error bubbles to the conversion entry point as-is.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No usable Chrome/Chromium executable on the system.
    #[display("chrome/chromium not detected on your system")]
    ChromeNotFound,
    /// The browser process could not be started or the DevTools handshake failed.
    #[display("failed to launch browser: {_0}")]
    Launch(#[error(not(source))] String),
    /// Opening or closing a browser tab failed.
    #[display("failed to open a browser tab")]
    Tab,
    /// Navigation was rejected or the target could not be loaded.
    #[display("page navigation failed")]
    Navigation,
    /// Navigation did not settle within the fixed deadline.
    #[display("page navigation timed out")]
    NavigationTimeout,
    /// A viewport, header, or media emulation override was refused by the browser.
    #[display("browser emulation override failed")]
    Emulation,
    /// The native print-to-PDF call failed.
    #[display("print-to-pdf call failed")]
    Print,
    /// A margin or dimension string could not be parsed as a CSS length.
    #[display("invalid length: {_0}")]
    InvalidLength(#[error(not(source))] String),
    /// Underlying I/O error.
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
        matches!(self, Self::NavigationTimeout)
    }
}
