//! `platen` — HTML-to-PDF conversion driven by headless Chrome.
//!
//! `platen serve` runs the HTTP service; `platen convert` performs a one-shot
//! conversion from a local file or URL without starting a server.

use clap::{Parser, Subcommand};
use platen_config::Config;
use platen_render::{BrowserSettings, ConversionOptions, Converter, Margins};
use platen_server::{AppState, router};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "platen", version, about = "HTML to PDF converter driven by headless Chrome")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP conversion service.
    Serve {
        /// Override the configured listen port.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Convert a single document and exit.
    Convert {
        /// Local HTML file or http(s) URL to convert.
        input: String,
        /// Where to write the PDF.
        output: PathBuf,
        /// Paper format name or slide-aspect tag (PPT_4_3, PPT_16_9, PPT_16_10).
        #[arg(long)]
        format: Option<String>,
        /// Landscape orientation.
        #[arg(long)]
        landscape: bool,
        /// Print zoom factor.
        #[arg(long)]
        scale: Option<f64>,
        /// Margins as CSS lengths, e.g. 12mm or 0.5in.
        #[arg(long)]
        margin_top: Option<String>,
        #[arg(long)]
        margin_right: Option<String>,
        #[arg(long)]
        margin_bottom: Option<String>,
        #[arg(long)]
        margin_left: Option<String>,
    },
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), BoxError> {
    let config = Config::load(cli.config.as_deref())?;
    match cli.command {
        Command::Serve { port } => serve(config, port).await,
        Command::Convert {
            input,
            output,
            format,
            landscape,
            scale,
            margin_top,
            margin_right,
            margin_bottom,
            margin_left,
        } => {
            let mut options = ConversionOptions::default();
            if let Some(format) = format {
                options.format = format;
            }
            options.landscape = landscape;
            if let Some(scale) = scale {
                options.scale = scale;
            }
            let defaults = Margins::default();
            options.margins = Margins {
                top: parse_margin(margin_top, defaults.top)?,
                right: parse_margin(margin_right, defaults.right)?,
                bottom: parse_margin(margin_bottom, defaults.bottom)?,
                left: parse_margin(margin_left, defaults.left)?,
            };
            convert(config, &input, &output, options).await
        }
    }
}

fn parse_margin(value: Option<String>, default: platen_render::Length) -> Result<platen_render::Length, BoxError> {
    Ok(match value {
        Some(value) => value.parse()?,
        None => default,
    })
}

async fn serve(mut config: Config, port: Option<u16>) -> Result<(), BoxError> {
    if let Some(port) = port {
        config.server.port = port;
    }
    config.ensure_dirs()?;

    let settings =
        BrowserSettings { executable: config.chrome.executable.clone(), sandbox: config.chrome.sandbox };
    let converter = Converter::new(&config.dirs.temp, settings)?;
    let addr = config.bind_addr()?;
    let state = Arc::new(AppState { converter, config });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTML to PDF converter listening");
    axum::serve(listener, router(state.clone())).with_graceful_shutdown(shutdown_signal()).await?;

    // The browser outlives the listener only long enough to finish in-flight
    // prints; close it before exiting.
    state.converter.shutdown().await;
    tracing::info!("shut down cleanly");
    Ok(())
}

async fn convert(config: Config, input: &str, output: &PathBuf, options: ConversionOptions) -> Result<(), BoxError> {
    config.ensure_dirs()?;
    let settings =
        BrowserSettings { executable: config.chrome.executable.clone(), sandbox: config.chrome.sandbox };
    let converter = Converter::new(&config.dirs.temp, settings)?;

    let result = if input.starts_with("http://") || input.starts_with("https://") {
        converter.convert_url(input, output, &options).await
    } else {
        converter.convert_file(PathBuf::from(input).as_path(), output, &options).await
    };
    converter.shutdown().await;

    let conversion = result?;
    tracing::info!(output = %conversion.output.display(), bytes = conversion.bytes, "conversion complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install shutdown signal handler");
    }
    tracing::info!("shutdown signal received");
}
