//! HTTP surface for the conversion service.
//!
//! A thin axum layer over [`platen_render::Converter`]: three conversion
//! endpoints plus a health check, permissive CORS, a request body limit, and
//! request tracing. The converter handle is injected through [`AppState`]
//! rather than living in a global.

mod error;
mod options;
mod routes;

pub use crate::error::ApiError;
pub use crate::options::RequestOptions;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use platen_config::Config;
use platen_render::Converter;
use std::path::PathBuf;
use std::sync::Arc;
use time::OffsetDateTime;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state behind every request handler.
pub struct AppState {
    pub converter: Converter,
    pub config: Config,
}
impl AppState {
    /// A unique output path for one conversion's PDF.
    fn output_path(&self) -> PathBuf {
        self.config.dirs.output.join(format!("output-{}.pdf", OffsetDateTime::now_utc().unix_timestamp_nanos()))
    }

    /// A unique staging path for one uploaded file. The original name is
    /// reduced to its final component so uploads cannot escape the directory.
    fn upload_path(&self, original: &str) -> PathBuf {
        let name = std::path::Path::new(original)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("upload.html"));
        self.config.dirs.uploads.join(format!("{}-{name}", OffsetDateTime::now_utc().unix_timestamp_nanos()))
    }
}

/// Build the service router around the shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.limits.max_body_bytes;
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/convert/file", post(routes::convert_file))
        .route("/api/convert/url", post(routes::convert_url))
        .route("/api/convert/html", post(routes::convert_html))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
