//! Browser-driven HTML-to-PDF conversion.
//!
//! The crate drives a headless Chrome/Chromium process over the DevTools
//! protocol: documents are preprocessed (print CSS, charset, optional
//! Devanagari font stack), staged to disk, loaded in an isolated tab, and
//! printed with the browser's native PDF pipeline. Besides standard paper
//! formats it supports fixed-aspect slide page sizes (`PPT_4_3`, `PPT_16_9`,
//! `PPT_16_10`) rendered edge-to-edge at exact dimensions.

mod browser;
pub mod chrome;
mod convert;
pub mod error;
mod geometry;
mod options;
mod prepare;

pub use crate::browser::BrowserSettings;
pub use crate::convert::{Conversion, Converter};
pub use crate::geometry::{PageGeometry, resolve_paper, resolve_slide};
pub use crate::options::{ConversionOptions, Length, Margins};
pub use crate::prepare::prepare;
