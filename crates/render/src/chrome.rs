//! Chrome/Chromium executable discovery.

use crate::error::{ErrorKind, Result};
use std::path::{Path, PathBuf};

/// Locate a Chrome/Chromium executable.
///
/// An explicit `executable` override wins when it points at an existing file;
/// otherwise the usual executable names are searched on `PATH`.
///
/// # Errors
///
/// Returns [`ErrorKind::ChromeNotFound`] when neither the override nor the
/// `PATH` search produces a usable binary.
pub fn discover(executable: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = executable {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), "configured chrome executable does not exist; falling back to PATH search");
    }
    // TODO: What are the executable names on Windows? macOS?
    let executables = ["google-chrome", "chromium", "chromium-browser", "chrome"];
    for exe in executables {
        if let Ok(path) = which::which(exe) {
            tracing::debug!(executable = %path.display(), "discovered chrome executable");
            return Ok(path);
        }
    }
    tracing::info!("Chrome executable not found in PATH");
    exn::bail!(ErrorKind::ChromeNotFound);
}
