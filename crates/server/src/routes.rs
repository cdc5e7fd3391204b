//! Conversion endpoints.
//!
//! Each endpoint normalizes its transport (multipart, JSON-with-URL,
//! JSON-with-HTML) into the same options-plus-source pair, hands it to the
//! orchestrator, streams the PDF back with an attachment disposition, and
//! removes the persisted output file afterwards. Status codes are assigned
//! only here (via [`ApiError`]); the orchestrator's errors arrive unmodified.

use crate::error::ApiError;
use crate::options::RequestOptions;
use crate::AppState;
use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use platen_render::Conversion;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// A generated PDF, served as a download.
pub struct PdfResponse {
    bytes: Vec<u8>,
}
impl IntoResponse for PdfResponse {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, "application/pdf"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"converted.pdf\""),
            ],
            self.bytes,
        )
            .into_response()
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "HTML to PDF Converter API is running" }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlRequest {
    #[serde(default)]
    html_content: Option<String>,
    #[serde(flatten)]
    options: RequestOptions,
}

pub async fn convert_html(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HtmlRequest>,
) -> Result<PdfResponse, ApiError> {
    let html = match request.html_content {
        Some(html) if !html.is_empty() => html,
        _ => return Err(ApiError::MissingInput("HTML content is required")),
    };
    let options = request.options.into_options()?;
    let output = state.output_path();
    let conversion = state.converter.convert_html(&html, &output, &options).await?;
    respond_pdf(conversion).await
}

#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    #[serde(default)]
    url: Option<String>,
    #[serde(flatten)]
    options: RequestOptions,
}

pub async fn convert_url(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UrlRequest>,
) -> Result<PdfResponse, ApiError> {
    let url = match request.url {
        Some(url) if !url.is_empty() => url,
        _ => return Err(ApiError::MissingInput("URL is required")),
    };
    if Url::parse(&url).is_err() {
        return Err(ApiError::InvalidUrl);
    }
    let options = request.options.into_options()?;
    let output = state.output_path();
    let conversion = state.converter.convert_url(&url, &output, &options).await?;
    respond_pdf(conversion).await
}

pub async fn convert_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<PdfResponse, ApiError> {
    let mut request = RequestOptions::default();
    let mut upload: Option<PathBuf> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "htmlFile" {
            let file_name = field.file_name().unwrap_or("upload.html").to_string();
            let content_type = field.content_type().map(str::to_string);
            // Reject non-HTML uploads before any conversion work happens.
            if !is_html_upload(&file_name, content_type.as_deref()) {
                return Err(ApiError::UnsupportedUpload);
            }
            let data = field.bytes().await?;
            let path = state.upload_path(&file_name);
            tokio::fs::write(&path, &data).await?;
            upload = Some(path);
        } else {
            request.set_text_field(&name, field.text().await?);
        }
    }

    let Some(upload) = upload else {
        return Err(ApiError::MissingInput("No file uploaded"));
    };
    let options = request.into_options()?;
    let output = state.output_path();
    let result = state.converter.convert_file(&upload, &output, &options).await;
    // The staged upload is transient whether or not the conversion worked.
    remove_quietly(&upload).await;
    respond_pdf(result?).await
}

/// An upload qualifies as HTML by declared type or by file extension.
fn is_html_upload(file_name: &str, content_type: Option<&str>) -> bool {
    content_type == Some("text/html") || file_name.ends_with(".html")
}

/// Read the generated PDF back and remove it; the output directory holds
/// nothing across requests.
async fn respond_pdf(conversion: Conversion) -> Result<PdfResponse, ApiError> {
    let bytes = tokio::fs::read(&conversion.output).await?;
    remove_quietly(&conversion.output).await;
    Ok(PdfResponse { bytes })
}

async fn remove_quietly(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %err, "failed to remove transient file");
    }
}
