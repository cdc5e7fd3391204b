//! Conversion options and physical length handling.
//!
//! Margins arrive from callers as CSS-style length strings (`"12mm"`,
//! `"0.5in"`). [`Length`] keeps the caller's unit for CSS output and converts
//! to inches for the DevTools print call, which only speaks inches.

use crate::error::{Error, ErrorKind, Result};
use crate::geometry::resolve_slide;
use derive_more::Display;
use std::str::FromStr;

/// A physical length with its original unit preserved.
///
/// Displayed in the unit it was written in, so CSS output keeps the caller's
/// `12mm` rather than a noisy inch conversion.
#[derive(Debug, Clone, Copy, PartialEq, Display)]
#[display("{value}{unit}")]
pub struct Length {
    value: f64,
    unit: Unit,
}

#[derive(Debug, Clone, Copy, PartialEq, Display)]
enum Unit {
    #[display("in")]
    Inches,
    #[display("mm")]
    Millimeters,
    #[display("cm")]
    Centimeters,
    #[display("px")]
    Pixels,
}

impl Length {
    pub const ZERO: Length = Length { value: 0.0, unit: Unit::Inches };

    pub const fn inches(value: f64) -> Self {
        Self { value, unit: Unit::Inches }
    }

    pub const fn millimeters(value: f64) -> Self {
        Self { value, unit: Unit::Millimeters }
    }

    /// Value converted to inches (the unit of the print-to-PDF call).
    pub fn to_inches(self) -> f64 {
        match self.unit {
            Unit::Inches => self.value,
            Unit::Millimeters => self.value / 25.4,
            Unit::Centimeters => self.value / 2.54,
            Unit::Pixels => self.value / 96.0,
        }
    }

    pub fn is_zero(self) -> bool {
        self.value == 0.0
    }
}

impl FromStr for Length {
    type Err = Error;

    /// Parses a CSS-style length. Bare numbers are treated as pixels, matching
    /// the print engine's own handling of unitless margin values.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (number, unit) = match s.find(|c: char| c.is_ascii_alphabetic()) {
            Some(split) => s.split_at(split),
            None => (s, "px"),
        };
        let value: f64 = number.trim().parse().map_err(|_| ErrorKind::InvalidLength(s.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            exn::bail!(ErrorKind::InvalidLength(s.to_string()));
        }
        let unit = match unit.trim().to_ascii_lowercase().as_str() {
            "in" => Unit::Inches,
            "mm" => Unit::Millimeters,
            "cm" => Unit::Centimeters,
            "px" => Unit::Pixels,
            _ => exn::bail!(ErrorKind::InvalidLength(s.to_string())),
        };
        Ok(Self { value, unit })
    }
}

/// Margins for the four page edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}
impl Margins {
    pub const ZERO: Margins =
        Margins { top: Length::ZERO, right: Length::ZERO, bottom: Length::ZERO, left: Length::ZERO };

    pub fn is_zero(&self) -> bool {
        self.top.is_zero() && self.right.is_zero() && self.bottom.is_zero() && self.left.is_zero()
    }
}
impl Default for Margins {
    fn default() -> Self {
        Self {
            top: Length::millimeters(12.0),
            right: Length::millimeters(10.0),
            bottom: Length::millimeters(14.0),
            left: Length::millimeters(10.0),
        }
    }
}

/// Options for a single conversion call.
///
/// Constructed per-request from [`Default`] merged with caller overrides; the
/// struct does not outlive the conversion it configures.
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Paper format name (`A4`, `Letter`, ...) or slide-aspect tag (`PPT_16_9`).
    pub format: String,
    /// Page margins. Ignored and forced to zero when `format` is a slide tag.
    pub margins: Margins,
    /// Landscape orientation.
    pub landscape: bool,
    /// Print zoom factor.
    pub scale: f64,
    /// Render background colors and images.
    pub print_background: bool,
    /// Let a document-supplied `@page` size win over the format.
    pub prefer_css_page_size: bool,
    /// Inject the Devanagari web-font stack and default the document to `lang="hi"`.
    pub hindi_fonts: bool,
}
impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            format: String::from("A4"),
            margins: Margins::default(),
            landscape: false,
            scale: 1.0,
            print_background: true,
            prefer_css_page_size: true,
            hindi_fonts: true,
        }
    }
}
impl ConversionOptions {
    /// Whether `format` names a slide-aspect page rather than a paper size.
    pub fn is_slide(&self) -> bool {
        resolve_slide(&self.format).is_some()
    }

    /// Margins as they will actually be printed: zero for slide formats, the
    /// caller's values otherwise.
    pub fn effective_margins(&self) -> Margins {
        if self.is_slide() { Margins::ZERO } else { self.margins }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("12mm", 12.0 / 25.4)]
    #[case("0.5in", 0.5)]
    #[case("1cm", 1.0 / 2.54)]
    #[case("96px", 1.0)]
    #[case("0", 0.0)]
    #[case(" 10 mm ", 10.0 / 25.4)]
    fn parses_lengths(#[case] input: &str, #[case] inches: f64) {
        let length: Length = input.parse().unwrap();
        assert!((length.to_inches() - inches).abs() < 1e-9);
    }

    #[rstest]
    #[case("abc")]
    #[case("12pt")]
    #[case("-3mm")]
    #[case("")]
    fn rejects_malformed_lengths(#[case] input: &str) {
        assert!(input.parse::<Length>().is_err());
    }

    #[test]
    fn display_keeps_original_unit() {
        let length: Length = "12mm".parse().unwrap();
        assert_eq!(length.to_string(), "12mm");
        assert_eq!(Length::ZERO.to_string(), "0in");
    }

    #[test]
    fn default_margins_match_documented_values() {
        let margins = Margins::default();
        assert_eq!(margins.top, Length::millimeters(12.0));
        assert_eq!(margins.right, Length::millimeters(10.0));
        assert_eq!(margins.bottom, Length::millimeters(14.0));
        assert_eq!(margins.left, Length::millimeters(10.0));
    }

    #[test]
    fn slide_formats_force_zero_margins() {
        let options = ConversionOptions {
            format: String::from("PPT_16_9"),
            margins: Margins { top: Length::inches(2.0), ..Margins::default() },
            ..ConversionOptions::default()
        };
        assert!(options.is_slide());
        assert!(options.effective_margins().is_zero());
    }

    #[test]
    fn paper_formats_keep_caller_margins() {
        let options = ConversionOptions::default();
        assert!(!options.is_slide());
        assert_eq!(options.effective_margins(), Margins::default());
    }
}
