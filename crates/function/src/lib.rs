//! Standalone cloud-function handler.
//!
//! A deliberately self-contained, reduced version of the HTTP service: one
//! POST event in, one response out, a short-lived browser launched per
//! invocation instead of a long-lived shared session. Only raw HTML and URL
//! sources are supported here; there is no slide-aspect handling. The PDF
//! travels base64-encoded in the response body, flagged with
//! `isBase64Encoded` the way serverless gateways expect.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use futures::StreamExt;
use platen_render::error::{ErrorKind, Result};
use platen_render::{resolve_paper, Margins, chrome};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::timeout;

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Incoming gateway event. Only the method and body are consulted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEvent {
    pub http_method: String,
    #[serde(default)]
    pub body: Option<String>,
}

/// Outgoing gateway response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    pub status_code: u16,
    pub headers: BTreeMap<&'static str, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}
impl FunctionResponse {
    fn error(status_code: u16, message: impl Into<String>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type", String::from("application/json"));
        Self {
            status_code,
            headers,
            body: serde_json::json!({ "error": message.into() }).to_string(),
            is_base64_encoded: false,
        }
    }

    fn pdf(bytes: &[u8]) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type", String::from("application/pdf"));
        headers.insert("Content-Disposition", String::from("attachment; filename=converted.pdf"));
        Self { status_code: 200, headers, body: BASE64.encode(bytes), is_base64_encoded: true }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FunctionRequest {
    html_content: Option<String>,
    url: Option<String>,
    format: Option<String>,
    landscape: Option<bool>,
}

/// Handle one gateway event. Never fails: every outcome is a response.
pub async fn handle(event: FunctionEvent) -> FunctionResponse {
    if event.http_method != "POST" {
        return FunctionResponse::error(405, "Method not allowed");
    }
    let request: FunctionRequest = match event.body.as_deref().map(serde_json::from_str).transpose() {
        Ok(request) => request.unwrap_or_default(),
        Err(err) => return FunctionResponse::error(400, format!("Malformed request body: {err}")),
    };
    if request.html_content.is_none() && request.url.is_none() {
        return FunctionResponse::error(400, "HTML content or URL is required");
    }
    match print(&request).await {
        Ok(bytes) => FunctionResponse::pdf(&bytes),
        Err(err) => {
            tracing::error!(error = %err, "conversion failed");
            FunctionResponse::error(500, err.to_string())
        }
    }
}

/// The reduced conversion flow: short-lived browser, one tab, one print.
async fn print(request: &FunctionRequest) -> Result<Vec<u8>> {
    let executable = chrome::discover(None)?;
    let config = match BrowserConfig::builder().chrome_executable(executable).no_sandbox().build() {
        Ok(config) => config,
        Err(message) => exn::bail!(ErrorKind::Launch(message)),
    };
    let (mut browser, mut events) = match Browser::launch(config).await {
        Ok(launched) => launched,
        Err(err) => exn::bail!(ErrorKind::Launch(err.to_string())),
    };
    let handler = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            if event.is_err() {
                break;
            }
        }
    });

    let result = async {
        let page = browser.new_page("about:blank").await.or_raise(|| ErrorKind::Tab)?;
        if let Some(url) = &request.url {
            page.goto(url.as_str()).await.or_raise(|| ErrorKind::Navigation)?;
            match timeout(NAVIGATION_TIMEOUT, page.wait_for_navigation()).await {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => return Err(err).or_raise(|| ErrorKind::Navigation),
                Err(_) => exn::bail!(ErrorKind::NavigationTimeout),
            }
        } else if let Some(html) = &request.html_content {
            page.set_content(html.as_str()).await.or_raise(|| ErrorKind::Navigation)?;
        }
        page.pdf(print_params(request)).await.or_raise(|| ErrorKind::Print)
    }
    .await;

    if let Err(err) = browser.close().await {
        tracing::warn!(error = %err, "browser did not close cleanly");
    }
    if let Err(err) = browser.wait().await {
        tracing::warn!(error = %err, "failed waiting for browser process exit");
    }
    handler.abort();
    result
}

fn print_params(request: &FunctionRequest) -> PrintToPdfParams {
    let margins = Margins::default();
    let mut params = PrintToPdfParams::builder()
        .landscape(request.landscape.unwrap_or(false))
        .print_background(true)
        .margin_top(margins.top.to_inches())
        .margin_right(margins.right.to_inches())
        .margin_bottom(margins.bottom.to_inches())
        .margin_left(margins.left.to_inches());
    if let Some((width, height)) = resolve_paper(request.format.as_deref().unwrap_or("A4")) {
        params = params.paper_width(width).paper_height(height);
    }
    params.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(method: &str, body: Option<&str>) -> FunctionEvent {
        FunctionEvent { http_method: String::from(method), body: body.map(String::from) }
    }

    #[tokio::test]
    async fn rejects_non_post_methods() {
        let response = handle(event("GET", None)).await;
        assert_eq!(response.status_code, 405);
        assert!(response.body.contains("Method not allowed"));
        assert!(!response.is_base64_encoded);
    }

    #[tokio::test]
    async fn rejects_missing_source() {
        let response = handle(event("POST", Some(r#"{"format":"A4"}"#))).await;
        assert_eq!(response.status_code, 400);
        assert!(response.body.contains("HTML content or URL is required"));
    }

    #[tokio::test]
    async fn rejects_empty_body() {
        let response = handle(event("POST", None)).await;
        assert_eq!(response.status_code, 400);
    }

    #[tokio::test]
    async fn rejects_malformed_body() {
        let response = handle(event("POST", Some("not json"))).await;
        assert_eq!(response.status_code, 400);
        assert!(response.body.contains("Malformed request body"));
    }

    #[test]
    fn print_params_default_to_a4_with_service_margins() {
        let request = FunctionRequest::default();
        let params = print_params(&request);
        assert_eq!(params.paper_width, Some(8.27));
        assert_eq!(params.paper_height, Some(11.7));
        assert!((params.margin_top.unwrap() - 12.0 / 25.4).abs() < 1e-9);
        assert_eq!(params.landscape, Some(false));
    }

    #[test]
    fn responses_serialize_in_gateway_shape() {
        let response = FunctionResponse::pdf(b"%PDF-fake");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["isBase64Encoded"], true);
        assert_eq!(json["headers"]["Content-Type"], "application/pdf");
    }
}
