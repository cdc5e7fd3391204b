//! Process-wide browser session management.
//!
//! One Chrome process serves every conversion in the process. It is launched
//! lazily on first use and torn down only by an explicit [`shutdown`] call;
//! individual conversions acquire a fresh tab each so rendered content never
//! crosses between calls. The session is an owned handle meant to be injected
//! wherever conversions happen, not global state.
//!
//! [`shutdown`]: BrowserSession::shutdown

use crate::chrome;
use crate::error::{ErrorKind, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use exn::ResultExt;
use futures::StreamExt;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Launch arguments tuned for unattended print rendering.
const CHROME_ARGS: [&str; 12] = [
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--no-first-run",
    "--disable-extensions",
    "--disable-background-networking",
    "--disable-default-apps",
    "--disable-sync",
    "--disable-translate",
    "--hide-scrollbars",
    "--mute-audio",
    "--no-default-browser-check",
    // Improves non-Latin text rendering.
    "--font-render-hinting=none",
];

/// How the browser process is found and launched.
#[derive(Debug, Clone, Default)]
pub struct BrowserSettings {
    /// Explicit Chrome/Chromium executable; `PATH` discovery otherwise.
    pub executable: Option<PathBuf>,
    /// Keep the Chrome sandbox enabled. Off by default since the service
    /// usually runs inside a container that already lacks the privileges.
    pub sandbox: bool,
}

struct SessionState {
    browser: Browser,
    handler: JoinHandle<()>,
}

/// Lazily launched, process-wide Chrome session.
///
/// The mutex is held only while acquiring a tab or shutting down, never for
/// the duration of a conversion, so conversions proceed concurrently in their
/// own tabs.
pub struct BrowserSession {
    settings: BrowserSettings,
    state: Mutex<Option<SessionState>>,
}
impl BrowserSession {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings, state: Mutex::new(None) }
    }

    /// Acquire a fresh tab, launching the browser first if this is the first
    /// use of the session.
    pub async fn acquire_tab(&self) -> Result<Page> {
        let mut guard = self.state.lock().await;
        let state = match guard.as_mut() {
            Some(state) => state,
            None => guard.insert(self.launch().await?),
        };
        state.browser.new_page("about:blank").await.or_raise(|| ErrorKind::Tab)
    }

    async fn launch(&self) -> Result<SessionState> {
        let executable = chrome::discover(self.settings.executable.as_deref())?;
        tracing::info!(executable = %executable.display(), "launching headless chrome");

        let mut builder = BrowserConfig::builder().chrome_executable(executable).args(CHROME_ARGS);
        if !self.settings.sandbox {
            builder = builder.no_sandbox();
        }
        let config = match builder.build() {
            Ok(config) => config,
            Err(message) => exn::bail!(ErrorKind::Launch(message)),
        };

        let (browser, mut events) = match Browser::launch(config).await {
            Ok(launched) => launched,
            Err(err) => exn::bail!(ErrorKind::Launch(err.to_string())),
        };
        // The CDP event stream must be polled for the connection to make
        // progress; park it on its own task for the life of the session.
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::debug!("browser session established");
        Ok(SessionState { browser, handler })
    }

    /// Close the browser process and stop the event task. Safe to call when
    /// the session was never used; later acquisitions relaunch.
    pub async fn shutdown(&self) {
        let Some(mut state) = self.state.lock().await.take() else { return };
        if let Err(err) = state.browser.close().await {
            tracing::warn!(error = %err, "browser did not close cleanly");
        }
        if let Err(err) = state.browser.wait().await {
            tracing::warn!(error = %err, "failed waiting for browser process exit");
        }
        state.handler.abort();
        tracing::info!("browser session closed");
    }
}
