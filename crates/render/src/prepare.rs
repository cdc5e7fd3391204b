//! HTML preprocessing ahead of printing.
//!
//! The preprocessor never parses the document; it performs a minimal
//! structural scan (case-insensitive, attribute-tolerant tag matching) to
//! place three augmentations without disturbing the caller's content:
//!
//! - a `lang` attribute on the root element when Devanagari font support is
//!   requested and none is present,
//! - a UTF-8 charset declaration when the head carries none,
//! - a single `<style>` block combining page-geometry rules, print-safety
//!   rules, and (conditionally) the Devanagari web-font stack.
//!
//! Documents without a head section are wrapped in a minimal full document.
//! The charset and lang insertions are idempotent: running the output through
//! [`prepare`] again does not duplicate them.

use crate::geometry::PageGeometry;
use crate::options::ConversionOptions;
use std::fmt::Write;

/// Print-safety rules: exact color reproduction and no awkward page breaks
/// inside images, tables, or headings.
const PRINT_CSS: &str = "\
@media print {
    * {
        -webkit-print-color-adjust: exact !important;
        print-color-adjust: exact !important;
    }
    img, table, h1, h2, h3, h4, h5, h6, ul, ol, p {
        page-break-inside: avoid;
    }
    h1, h2, h3, h4, h5, h6 {
        page-break-after: avoid;
    }
}
";

/// Devanagari font stack: external web fonts plus a family override scoped to
/// Hindi-tagged elements.
const HINDI_FONT_CSS: &str = "\
@import url('https://fonts.googleapis.com/css2?family=Hind:wght@300;400;500;600;700&display=swap');
@import url('https://fonts.googleapis.com/css2?family=Noto+Sans+Devanagari:wght@400;500;600;700&display=swap');

[lang=\"hi\"], .hindi, *:lang(hi) {
    font-family: 'Noto Sans Devanagari', 'Hind', 'Arial Unicode MS', sans-serif !important;
    font-feature-settings: \"kern\" 1;
    text-rendering: optimizeLegibility;
}
";

/// Span of an opening tag: `start` of `<`, `attrs` just past the tag name,
/// `end` just past the closing `>`.
struct TagSpan {
    start: usize,
    attrs: usize,
    end: usize,
}

/// Find the first opening tag with the given name, ignoring case and
/// tolerating attributes. `<head>`, `<HEAD lang="x">`, and `<head\n>` all
/// match; `<header>` does not.
fn find_open_tag(html: &str, name: &str) -> Option<TagSpan> {
    let lower = html.to_ascii_lowercase();
    let needle = format!("<{name}");
    let mut from = 0;
    while let Some(offset) = lower[from..].find(&needle) {
        let start = from + offset;
        let attrs = start + needle.len();
        match lower.as_bytes().get(attrs) {
            Some(b'>') | Some(b'/') | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') => {
                let close = lower[attrs..].find('>')?;
                return Some(TagSpan { start, attrs, end: attrs + close + 1 });
            }
            _ => from = attrs,
        }
    }
    None
}

/// Find the byte offset of the first closing tag with the given name,
/// ignoring case.
fn find_close_tag(html: &str, name: &str) -> Option<usize> {
    html.to_ascii_lowercase().find(&format!("</{name}"))
}

fn has_charset(html: &str) -> bool {
    html.to_ascii_lowercase().contains("charset")
}

fn has_lang(html: &str) -> bool {
    find_open_tag(html, "html").is_some_and(|tag| html[tag.attrs..tag.end].to_ascii_lowercase().contains("lang="))
}

/// Page-geometry CSS: exact slide dimensions with zero margins, or an `@page`
/// margin rule carrying the caller's values for paper formats.
fn page_css(options: &ConversionOptions, geometry: Option<&PageGeometry>) -> String {
    let mut css = String::new();
    match geometry {
        Some(geometry) => {
            let (width, height) = (geometry.width_css(), geometry.height_css());
            let _ = write!(
                css,
                "\
@page {{
    size: {width} {height};
    margin: 0;
}}
@media screen {{
    html, body {{
        width: {width_px}px;
        height: {height_px}px;
        margin: 0;
        padding: 0;
        overflow: visible;
    }}
}}
@media print {{
    html, body {{
        width: {width};
        height: {height};
        margin: 0 !important;
        padding: 0 !important;
        overflow: visible !important;
    }}
    .page {{
        width: {width} !important;
        height: {height} !important;
        min-width: {width} !important;
        min-height: {height} !important;
        max-width: {width} !important;
        max-height: {height} !important;
        margin: 0 !important;
        padding: 0 !important;
        page-break-after: always !important;
        page-break-inside: avoid !important;
        position: relative !important;
        overflow: visible !important;
        box-sizing: border-box !important;
    }}
    .page:first-child {{
        page-break-before: auto !important;
    }}
    .page:last-child {{
        page-break-after: auto !important;
    }}
}}
* {{
    box-sizing: border-box;
    -webkit-print-color-adjust: exact !important;
    print-color-adjust: exact !important;
}}
",
                width_px = geometry.width_px,
                height_px = geometry.height_px,
            );
        }
        None => {
            let margins = options.effective_margins();
            let _ = write!(
                css,
                "\
@page {{
    margin: {top} {right} {bottom} {left};
}}
html, body {{
    width: 100%;
    height: 100%;
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}}
",
                top = margins.top,
                right = margins.right,
                bottom = margins.bottom,
                left = margins.left,
            );
        }
    }
    css
}

/// The complete injected `<style>` block.
fn style_block(options: &ConversionOptions, geometry: Option<&PageGeometry>) -> String {
    let mut block = String::from("<style>\n");
    block.push_str(&page_css(options, geometry));
    block.push_str(PRINT_CSS);
    if options.hindi_fonts {
        block.push_str(HINDI_FONT_CSS);
    }
    block.push_str("</style>");
    block
}

/// Belt-and-suspenders slide sizing, injected at runtime on top of the staged
/// document so engine-default sizing cannot leak back in.
pub(crate) fn slide_override_css(geometry: &PageGeometry) -> String {
    let (width, height) = (geometry.width_css(), geometry.height_css());
    format!(
        "\
@media print {{
    html, body {{
        width: {width} !important;
        height: {height} !important;
        margin: 0 !important;
        padding: 0 !important;
        overflow: visible !important;
    }}
    .page {{
        width: {width} !important;
        height: {height} !important;
        min-width: {width} !important;
        min-height: {height} !important;
        max-width: {width} !important;
        max-height: {height} !important;
        margin: 0 !important;
        padding: 0 !important;
        overflow: visible !important;
        position: relative !important;
        page-break-after: always !important;
        page-break-inside: avoid !important;
        box-sizing: border-box !important;
    }}
    .page:last-child {{
        page-break-after: auto !important;
    }}
}}
@media screen {{
    .page {{
        margin-bottom: 20px;
    }}
}}
"
    )
}

/// Prepare raw HTML for printing.
///
/// Returns a new string; the input is never mutated. See the module docs for
/// the exact augmentations and their idempotence guarantees.
pub fn prepare(html: &str, options: &ConversionOptions, geometry: Option<&PageGeometry>) -> String {
    let style = style_block(options, geometry);

    let mut document = html.to_string();
    if options.hindi_fonts && !has_lang(&document) {
        if let Some(tag) = find_open_tag(&document, "html") {
            document.insert_str(tag.attrs, " lang=\"hi\"");
        }
    }

    let Some(head) = find_open_tag(&document, "head") else {
        // No head section at all: synthesize a minimal document around the
        // caller's fragment.
        let lang = if options.hindi_fonts { " lang=\"hi\"" } else { "" };
        return format!(
            "<!DOCTYPE html>\n<html{lang}>\n<head>\n<meta charset=\"UTF-8\">\n{style}\n</head>\n<body>\n{document}\n</body>\n</html>\n"
        );
    };

    if !has_charset(&document) {
        document.insert_str(head.end, "\n<meta charset=\"UTF-8\">");
    }

    match find_close_tag(&document, "head") {
        Some(close) => document.insert_str(close, &style),
        None => {
            // Malformed document with an unclosed head; inject right after the
            // opening tag so the styles still apply.
            tracing::warn!("document head is never closed; injecting styles after the opening tag");
            let insert_at = find_open_tag(&document, "head").map_or(head.end, |tag| tag.end);
            document.insert_str(insert_at, &style);
        }
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::resolve_slide;

    fn plain_options() -> ConversionOptions {
        ConversionOptions { hindi_fonts: false, ..ConversionOptions::default() }
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn wraps_headless_fragment_in_full_document() {
        let output = prepare("<h1>Hi</h1>", &plain_options(), None);
        assert_eq!(count(&output, "<head>"), 1);
        assert_eq!(count(&output, "meta charset=\"UTF-8\""), 1);
        assert_eq!(count(&output, "<style>"), 1);
        assert!(output.contains("<body>\n<h1>Hi</h1>\n</body>"));
        assert!(output.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn preserves_existing_head_and_appends_style_before_close() {
        let input = "<html><head><title>Doc</title></head><body>x</body></html>";
        let output = prepare(input, &plain_options(), None);
        assert!(output.contains("<title>Doc</title>"));
        let style = output.find("<style>").unwrap();
        let close = output.find("</head>").unwrap();
        assert!(style < close);
        assert!(output.find("<title>Doc</title>").unwrap() < style);
    }

    #[test]
    fn charset_and_lang_insertions_are_idempotent() {
        let input = "<html><head></head><body>x</body></html>";
        let options = ConversionOptions::default();
        let once = prepare(input, &options, None);
        let twice = prepare(&once, &options, None);
        assert_eq!(count(&twice, "charset=\"UTF-8\""), 1);
        // Scoped to the root tag: the injected font CSS legitimately carries
        // [lang="hi"] selectors of its own.
        assert_eq!(count(&twice, "<html lang=\"hi\""), 1);
    }

    #[test]
    fn lang_not_injected_when_already_present() {
        let input = "<html lang=\"en\"><head></head><body></body></html>";
        let output = prepare(input, &ConversionOptions::default(), None);
        assert!(output.contains("<html lang=\"en\">"));
        assert!(!output.contains("<html lang=\"hi\""));
    }

    #[test]
    fn lang_injection_tolerates_uppercase_and_attributes() {
        let input = "<HTML class=\"app\"><HEAD></HEAD><BODY></BODY></HTML>";
        let output = prepare(input, &ConversionOptions::default(), None);
        assert!(output.contains("<HTML lang=\"hi\" class=\"app\">"));
        // Style still lands inside the uppercase head.
        assert!(output.find("<style>").unwrap() < output.find("</HEAD>").unwrap());
    }

    #[test]
    fn header_element_is_not_mistaken_for_head() {
        let input = "<html><body><header>top</header></body></html>";
        let output = prepare(input, &plain_options(), None);
        // No real head: the document gets wrapped.
        assert!(output.starts_with("<!DOCTYPE html>"));
        assert!(output.contains("<header>top</header>"));
    }

    #[test]
    fn paper_css_carries_caller_margins() {
        let output = prepare("<html><head></head><body></body></html>", &plain_options(), None);
        assert!(output.contains("margin: 12mm 10mm 14mm 10mm;"));
        assert!(output.contains("print-color-adjust: exact"));
    }

    #[test]
    fn slide_css_uses_exact_dimensions_and_zero_margins() {
        let geometry = resolve_slide("PPT_16_9").unwrap();
        let options = ConversionOptions { format: String::from("PPT_16_9"), ..plain_options() };
        let output = prepare("<html><head></head><body></body></html>", &options, Some(&geometry));
        assert!(output.contains("size: 13.333in 7.5in;"));
        assert!(output.contains("width: 1280px;"));
        assert!(!output.contains("12mm"));
    }

    #[test]
    fn hindi_fonts_toggle_controls_font_css() {
        let with = prepare("<h1>x</h1>", &ConversionOptions::default(), None);
        let without = prepare("<h1>x</h1>", &plain_options(), None);
        assert!(with.contains("Noto+Sans+Devanagari"));
        assert!(!without.contains("Noto+Sans+Devanagari"));
    }

    #[test]
    fn input_is_never_mutated() {
        let input = String::from("<h1>Hi</h1>");
        let _ = prepare(&input, &ConversionOptions::default(), None);
        assert_eq!(input, "<h1>Hi</h1>");
    }
}
