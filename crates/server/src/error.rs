//! HTTP error mapping.
//!
//! This is the only layer that assigns status codes. Validation problems are
//! 4xx with a message; anything that went wrong inside the browser pipeline
//! is a flat 5xx carrying the underlying message. Conversion errors arrive
//! unmodified from the orchestrator.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use derive_more::{Display, Error};
use platen_render::error::{Error as RenderError, ErrorKind as RenderErrorKind};
use serde_json::json;

/// Everything a conversion endpoint can fail with.
#[derive(Debug, Display, Error)]
pub enum ApiError {
    /// A required input (file, URL, or HTML body) was absent.
    #[display("{_0}")]
    MissingInput(#[error(not(source))] &'static str),
    /// The supplied URL did not parse.
    #[display("Invalid URL format")]
    InvalidUrl,
    /// The uploaded file is not HTML by name or declared type.
    #[display("Only HTML files are allowed")]
    UnsupportedUpload,
    /// An option field (margin, scale, ...) failed to parse.
    #[display("{_0}")]
    InvalidOption(#[error(not(source))] String),
    /// The multipart body could not be read.
    #[display("{_0}")]
    Multipart(MultipartError),
    /// The conversion pipeline failed; bubbled unmodified from the orchestrator.
    #[display("{_0}")]
    Conversion(#[error(not(source))] RenderError),
    /// Reading or removing request artifacts failed.
    #[display("I/O error: {_0}")]
    Io(std::io::Error),
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        Self::Conversion(err)
    }
}
impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::Multipart(err)
    }
}
impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MissingInput(_) | Self::InvalidUrl | Self::UnsupportedUpload | Self::InvalidOption(_) | Self::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            // Length parsing normally fails at option normalization, but the
            // orchestrator can also surface it; keep it a client error.
            Self::Conversion(err) => match &**err {
                RenderErrorKind::InvalidLength(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "conversion request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
