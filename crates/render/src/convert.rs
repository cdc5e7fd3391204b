//! The conversion orchestrator.
//!
//! Three entry points (raw HTML, local file, remote URL) converge on one
//! routine: preprocess, stage to a temp file, navigate a fresh tab, invoke
//! the browser's native print-to-PDF, persist the bytes. The staged document
//! is a [`tempfile::NamedTempFile`], so it is removed when the call returns
//! whether the conversion succeeded or failed partway.

use crate::browser::{BrowserSession, BrowserSettings};
use crate::error::{ErrorKind, Result};
use crate::geometry::{PageGeometry, resolve_paper, resolve_slide};
use crate::options::ConversionOptions;
use crate::prepare::{prepare, slide_override_css};
use chromiumoxide::cdp::browser_protocol::emulation::{SetDeviceMetricsOverrideParams, SetEmulatedMediaParams};
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::Page;
use exn::ResultExt;
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout};
use tracing::instrument;

/// Navigation deadline for staged local documents. Fatal on expiry.
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);
/// Navigation deadline for remote URLs. Fatal on expiry.
const URL_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
/// Best-effort wait for the slide page container to appear.
const SELECTOR_TIMEOUT: Duration = Duration::from_secs(10);
/// Best-effort wait for web fonts to finish loading.
const FONT_TIMEOUT: Duration = Duration::from_secs(10);
/// Settle delay after font readiness, letting late web-font rasterization land.
const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Viewport used for standard paper formats; slide formats use their exact
/// pixel dimensions instead.
const DEFAULT_VIEWPORT: (i64, i64) = (1200, 800);
/// Language preference sent with every page load so script-sensitive sites
/// serve Devanagari content.
const ACCEPT_LANGUAGE: &str = "hi,en-US;q=0.9,en;q=0.8";

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    /// Where the PDF was written.
    pub output: PathBuf,
    /// Size of the PDF in bytes.
    pub bytes: u64,
    /// Always `1`: the print call does not report a page count.
    pub pages: u32,
}

/// Browser-driven HTML-to-PDF converter.
///
/// Owns the shared [`BrowserSession`] and the staging directory for
/// preprocessed documents. Construct once and share; every conversion runs in
/// its own tab.
pub struct Converter {
    session: BrowserSession,
    temp_dir: PathBuf,
}
impl Converter {
    /// Create a converter staging its documents under `temp_dir` (created if
    /// absent). The browser itself is not launched until the first conversion.
    pub fn new(temp_dir: impl Into<PathBuf>, settings: BrowserSettings) -> Result<Self> {
        let temp_dir = temp_dir.into();
        // Non-async: happens once at service initialization.
        sync_create_dir(&temp_dir).map_err(ErrorKind::Io)?;
        Ok(Self { session: BrowserSession::new(settings), temp_dir })
    }

    /// Convert raw HTML to a PDF at `output`.
    #[instrument(skip_all, fields(format = %options.format, output = %output.display()))]
    pub async fn convert_html(&self, html: &str, output: &Path, options: &ConversionOptions) -> Result<Conversion> {
        let geometry = resolve_slide(&options.format);
        let document = prepare(html, options, geometry.as_ref());

        // Unique name per call; dropped (and therefore deleted) on every exit
        // path out of this function.
        let staged = tempfile::Builder::new()
            .prefix("stage-")
            .suffix(".html")
            .tempfile_in(&self.temp_dir)
            .map_err(ErrorKind::Io)?;
        tokio::fs::write(staged.path(), &document).await.map_err(ErrorKind::Io)?;
        tracing::debug!(staged = %staged.path().display(), bytes = document.len(), "staged preprocessed document");

        let page = self.session.acquire_tab().await?;
        let result = self.print_staged(&page, staged.path(), options, geometry.as_ref(), output).await;
        if let Err(err) = page.close().await {
            tracing::warn!(error = %err, "failed to close browser tab");
        }
        result
    }

    /// Convert an HTML file on disk (read as UTF-8) to a PDF at `output`.
    pub async fn convert_file(&self, input: &Path, output: &Path, options: &ConversionOptions) -> Result<Conversion> {
        let html = tokio::fs::read_to_string(input).await.map_err(ErrorKind::Io)?;
        self.convert_html(&html, output, options).await
    }

    /// Convert a remote URL to a PDF at `output`.
    ///
    /// The page is loaded once in a fresh tab and its fully rendered markup
    /// snapshotted; dynamic content is captured at that moment, not re-run at
    /// print time.
    #[instrument(skip_all, fields(url = %url, output = %output.display()))]
    pub async fn convert_url(&self, url: &str, output: &Path, options: &ConversionOptions) -> Result<Conversion> {
        let page = self.session.acquire_tab().await?;
        let snapshot = async {
            set_accept_language(&page).await?;
            page.goto(url).await.or_raise(|| ErrorKind::Navigation)?;
            wait_for_navigation(&page, URL_NAVIGATION_TIMEOUT).await?;
            page.content().await.or_raise(|| ErrorKind::Navigation)
        }
        .await;
        if let Err(err) = page.close().await {
            tracing::warn!(error = %err, "failed to close browser tab");
        }
        self.convert_html(&snapshot?, output, options).await
    }

    /// Navigate to the staged document and drive the print pipeline.
    async fn print_staged(
        &self,
        page: &Page,
        staged: &Path,
        options: &ConversionOptions,
        geometry: Option<&PageGeometry>,
        output: &Path,
    ) -> Result<Conversion> {
        let (width, height) = geometry
            .map(|g| (i64::from(g.width_px), i64::from(g.height_px)))
            .unwrap_or(DEFAULT_VIEWPORT);
        page.execute(SetDeviceMetricsOverrideParams::new(width, height, 1.0, false))
            .await
            .or_raise(|| ErrorKind::Emulation)?;
        set_accept_language(page).await?;

        page.goto(format!("file://{}", staged.display())).await.or_raise(|| ErrorKind::Navigation)?;
        wait_for_navigation(page, NAVIGATION_TIMEOUT).await?;

        if let Some(geometry) = geometry {
            self.apply_slide_overrides(page, geometry).await?;
        }
        wait_for_fonts(page).await;
        sleep(SETTLE_DELAY).await;

        let pdf = page.pdf(print_params(options, geometry)).await.or_raise(|| ErrorKind::Print)?;
        tokio::fs::write(output, &pdf).await.map_err(ErrorKind::Io)?;

        let bytes = pdf.len() as u64;
        tracing::info!(bytes, "pdf generated");
        Ok(Conversion { output: output.to_path_buf(), bytes, pages: 1 })
    }

    /// Slide-specific adjustments after navigation: re-assert the exact page
    /// dimensions on top of whatever the document loaded, wait (best-effort)
    /// for the page container, force all content to load, and switch the tab
    /// to print media.
    async fn apply_slide_overrides(&self, page: &Page, geometry: &PageGeometry) -> Result<()> {
        let css = slide_override_css(geometry);
        let inject = format!(
            "(() => {{ const s = document.createElement('style'); s.textContent = {}; document.head.appendChild(s); }})()",
            serde_json::to_string(&css).unwrap_or_default(),
        );
        page.evaluate(inject).await.or_raise(|| ErrorKind::Emulation)?;

        if !wait_for_selector(page, ".page", SELECTOR_TIMEOUT).await {
            tracing::warn!(selector = ".page", "page container not found; continuing anyway");
        }
        page.evaluate("window.scrollTo(0, document.body.scrollHeight)").await.or_raise(|| ErrorKind::Emulation)?;
        page.execute(SetEmulatedMediaParams::builder().media("print").build())
            .await
            .or_raise(|| ErrorKind::Emulation)?;
        Ok(())
    }

    /// Close the shared browser session. Conversions started afterwards will
    /// relaunch it.
    pub async fn shutdown(&self) {
        self.session.shutdown().await;
    }
}

async fn set_accept_language(page: &Page) -> Result<()> {
    let headers = Headers::new(serde_json::json!({ "Accept-Language": ACCEPT_LANGUAGE }));
    page.execute(SetExtraHttpHeadersParams::new(headers)).await.or_raise(|| ErrorKind::Emulation)?;
    Ok(())
}

/// Block until network activity settles, bounded by `deadline`. A timeout
/// here is fatal: the document never became ready to print.
async fn wait_for_navigation(page: &Page, deadline: Duration) -> Result<()> {
    match timeout(deadline, page.wait_for_navigation()).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(err)) => Err(err).or_raise(|| ErrorKind::Navigation),
        Err(_) => exn::bail!(ErrorKind::NavigationTimeout),
    }
}

/// Poll for a selector until it appears or the deadline passes. Best-effort:
/// returns whether the element was seen.
async fn wait_for_selector(page: &Page, selector: &str, deadline: Duration) -> bool {
    let until = Instant::now() + deadline;
    loop {
        if page.find_element(selector).await.is_ok() {
            return true;
        }
        if Instant::now() >= until {
            return false;
        }
        sleep(Duration::from_millis(250)).await;
    }
}

/// The font-readiness expression. `await_promise` makes the evaluation block
/// until `document.fonts.ready` resolves instead of handing back the pending
/// promise object.
fn font_ready_params() -> std::result::Result<EvaluateParams, String> {
    EvaluateParams::builder()
        .expression("document.fonts ? document.fonts.ready.then(() => true) : true")
        .await_promise(true)
        .build()
}

/// Block until the document reports its fonts ready, bounded by
/// [`FONT_TIMEOUT`]. Best-effort: a timeout or script failure is logged and
/// the conversion continues with whatever fonts have loaded.
async fn wait_for_fonts(page: &Page) {
    let params = match font_ready_params() {
        Ok(params) => params,
        Err(message) => {
            tracing::warn!(error = %message, "font readiness check could not be assembled; continuing anyway");
            return;
        }
    };
    match timeout(FONT_TIMEOUT, page.evaluate(params)).await {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => tracing::warn!(error = %err, "font readiness check failed; continuing anyway"),
        Err(_) => tracing::warn!("font loading timed out; continuing anyway"),
    }
}

/// Assemble the native print call's parameters from the resolved geometry.
///
/// Slide formats dictate explicit paper dimensions and zero margins; paper
/// formats take their dimensions from the fixed table (or leave the browser
/// default in place for unknown names) and the caller's margins.
fn print_params(options: &ConversionOptions, geometry: Option<&PageGeometry>) -> PrintToPdfParams {
    let margins = options.effective_margins();
    let mut params = PrintToPdfParams::builder()
        .landscape(options.landscape)
        .print_background(options.print_background)
        .prefer_css_page_size(options.prefer_css_page_size)
        .scale(options.scale)
        .margin_top(margins.top.to_inches())
        .margin_right(margins.right.to_inches())
        .margin_bottom(margins.bottom.to_inches())
        .margin_left(margins.left.to_inches());

    if let Some(geometry) = geometry {
        params = params.paper_width(geometry.width_in).paper_height(geometry.height_in);
    } else if let Some((width, height)) = resolve_paper(&options.format) {
        params = params.paper_width(width).paper_height(height);
    }
    params.build()
}
