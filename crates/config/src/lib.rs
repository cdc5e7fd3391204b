//! Configuration loading for the conversion service.
//!
//! Configuration is assembled by [figment] from three layers, later layers
//! overriding earlier ones:
//!
//! 1. compiled-in defaults ([`Config::default`]),
//! 2. a TOML file — an explicit path, a `platen.toml` in the working
//!    directory, or the platform config directory,
//! 3. environment variables prefixed `PLATEN_`, with `__` separating nesting
//!    levels (e.g. `PLATEN_SERVER__PORT=8080`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::fs::create_dir_all;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Complete service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub dirs: DirConfig,
    pub chrome: ChromeConfig,
    pub limits: LimitConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}
impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: String::from("127.0.0.1"), port: 3000 }
    }
}

/// Working-directory layout: incoming uploads, staged documents, and
/// generated PDFs. Entries in `temp` and `output` are transient and removed
/// after each request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirConfig {
    pub uploads: PathBuf,
    pub temp: PathBuf,
    pub output: PathBuf,
}
impl Default for DirConfig {
    fn default() -> Self {
        Self { uploads: PathBuf::from("uploads"), temp: PathBuf::from("temp"), output: PathBuf::from("output") }
    }
}

/// Browser process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeConfig {
    /// Explicit Chrome/Chromium executable; discovered on `PATH` when unset.
    pub executable: Option<PathBuf>,
    /// Keep the Chrome sandbox enabled.
    pub sandbox: bool,
}
impl Default for ChromeConfig {
    fn default() -> Self {
        Self { executable: None, sandbox: false }
    }
}

/// Request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    /// Maximum accepted request body, in bytes.
    pub max_body_bytes: usize,
}
impl Default for LimitConfig {
    fn default() -> Self {
        Self { max_body_bytes: 50 * 1024 * 1024 }
    }
}

impl Config {
    /// Load configuration, merging defaults, the TOML file, and `PLATEN_`
    /// environment variables.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match file {
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                if let Some(dirs) = ProjectDirs::from("", "", "platen") {
                    figment = figment.merge(Toml::file(dirs.config_dir().join("platen.toml")));
                }
                figment = figment.merge(Toml::file("platen.toml"));
            }
        }
        let config: Config =
            figment.merge(Env::prefixed("PLATEN_").split("__")).extract().map_err(ErrorKind::Invalid)?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// The socket address the HTTP server binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse().map_err(|_| ErrorKind::InvalidBind(addr).into())
    }

    /// Create the working directories if absent. Called once at startup.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.dirs.uploads, &self.dirs.temp, &self.dirs.output] {
            create_dir_all(dir).map_err(ErrorKind::Io)?;
        }
        Ok(())
    }
}
