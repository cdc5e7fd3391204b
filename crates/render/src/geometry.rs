//! Page geometry resolution.
//!
//! Two fixed tables live here: slide-aspect formats (presentation page sizes
//! rendered edge-to-edge with zero margins) and standard paper formats. Slide
//! formats carry both a CSS-pixel representation (96 DPI, used for the browser
//! viewport and screen CSS) and an inch representation (used for `@page` rules
//! and the print call). Unknown format names are not errors; they fall through
//! to the print engine's default paper handling.

/// Exact dimensions for a slide-aspect page.
///
/// The pixel values are always `inches * 96`; both representations are kept
/// because the viewport wants integers and the print call wants inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Viewport width in CSS pixels at 96 DPI.
    pub width_px: u32,
    /// Viewport height in CSS pixels at 96 DPI.
    pub height_px: u32,
    /// Paper width in inches.
    pub width_in: f64,
    /// Paper height in inches.
    pub height_in: f64,
}
impl PageGeometry {
    /// CSS length for the page width, e.g. `13.333in`.
    pub fn width_css(&self) -> String {
        format!("{}in", self.width_in)
    }

    /// CSS length for the page height, e.g. `7.5in`.
    pub fn height_css(&self) -> String {
        format!("{}in", self.height_in)
    }
}

/// Resolve a slide-aspect format tag to its exact page geometry.
///
/// Returns `None` for anything that is not a known slide tag, signalling
/// "treat as a standard paper format" rather than a failure.
pub fn resolve_slide(format: &str) -> Option<PageGeometry> {
    match format {
        "PPT_4_3" => Some(PageGeometry { width_px: 960, height_px: 720, width_in: 10.0, height_in: 7.5 }),
        "PPT_16_9" => Some(PageGeometry { width_px: 1280, height_px: 720, width_in: 13.333, height_in: 7.5 }),
        "PPT_16_10" => Some(PageGeometry { width_px: 960, height_px: 600, width_in: 10.0, height_in: 6.25 }),
        _ => None,
    }
}

/// Resolve a standard paper format name to `(width, height)` in inches.
///
/// Matching is case-insensitive. The table mirrors the print engine's own
/// format list; unknown names return `None` and the print call omits explicit
/// paper dimensions entirely, leaving the browser's default in charge.
pub fn resolve_paper(format: &str) -> Option<(f64, f64)> {
    let (width, height) = match format.to_ascii_lowercase().as_str() {
        "letter" => (8.5, 11.0),
        "legal" => (8.5, 14.0),
        "tabloid" => (11.0, 17.0),
        "ledger" => (17.0, 11.0),
        "a0" => (33.1, 46.8),
        "a1" => (23.4, 33.1),
        "a2" => (16.54, 23.4),
        "a3" => (11.7, 16.54),
        "a4" => (8.27, 11.7),
        "a5" => (5.83, 8.27),
        "a6" => (4.13, 5.83),
        _ => return None,
    };
    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("PPT_4_3", 960, 720, 10.0, 7.5)]
    #[case("PPT_16_9", 1280, 720, 13.333, 7.5)]
    #[case("PPT_16_10", 960, 600, 10.0, 6.25)]
    fn slide_table(
        #[case] tag: &str,
        #[case] width_px: u32,
        #[case] height_px: u32,
        #[case] width_in: f64,
        #[case] height_in: f64,
    ) {
        let geometry = resolve_slide(tag).unwrap();
        assert_eq!(geometry.width_px, width_px);
        assert_eq!(geometry.height_px, height_px);
        assert!((geometry.width_in - width_in).abs() < f64::EPSILON);
        assert!((geometry.height_in - height_in).abs() < f64::EPSILON);
    }

    #[rstest]
    #[case("PPT_4_3")]
    #[case("PPT_16_10")]
    fn slide_pixels_are_inches_at_96_dpi(#[case] tag: &str) {
        let geometry = resolve_slide(tag).unwrap();
        assert!((geometry.width_px as f64 - geometry.width_in * 96.0).abs() < f64::EPSILON);
        assert!((geometry.height_px as f64 - geometry.height_in * 96.0).abs() < f64::EPSILON);
    }

    #[test]
    fn widescreen_pixels_round_from_fractional_inches() {
        // 13.333in * 96 = 1279.968; the pixel table rounds to the canonical 1280.
        let geometry = resolve_slide("PPT_16_9").unwrap();
        assert_eq!(geometry.width_px, (geometry.width_in * 96.0).round() as u32);
    }

    #[rstest]
    #[case("A4")]
    #[case("a4")]
    #[case("Letter")]
    fn paper_lookup_is_case_insensitive(#[case] name: &str) {
        assert!(resolve_paper(name).is_some());
    }

    #[test]
    fn unknown_formats_resolve_to_none() {
        assert!(resolve_slide("A4").is_none());
        assert!(resolve_slide("PPT_21_9").is_none());
        assert!(resolve_paper("PPT_16_9").is_none());
        assert!(resolve_paper("B7").is_none());
    }

    #[test]
    fn css_lengths_render_in_inches() {
        let geometry = resolve_slide("PPT_16_9").unwrap();
        assert_eq!(geometry.width_css(), "13.333in");
        assert_eq!(geometry.height_css(), "7.5in");
    }
}
