//! End-to-end conversion tests.
//!
//! These require a working Chrome/Chromium installation and are ignored by
//! default. Run with: cargo test -p platen-render -- --ignored

use platen_render::{BrowserSettings, ConversionOptions, Converter, Length, Margins};
use std::path::PathBuf;

fn converter(temp: &tempfile::TempDir) -> Converter {
    Converter::new(temp.path().join("temp"), BrowserSettings::default()).expect("converter should construct")
}

fn output_path(temp: &tempfile::TempDir, name: &str) -> PathBuf {
    temp.path().join(name)
}

fn staged_files(temp: &tempfile::TempDir) -> Vec<PathBuf> {
    std::fs::read_dir(temp.path().join("temp"))
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default()
}

#[tokio::test]
#[ignore]
async fn raw_html_with_defaults_produces_a_pdf() {
    let temp = tempfile::tempdir().unwrap();
    let converter = converter(&temp);
    let output = output_path(&temp, "hello.pdf");

    let conversion = converter
        .convert_html("<html><body><h1>Hi</h1></body></html>", &output, &ConversionOptions::default())
        .await
        .expect("conversion should succeed");
    converter.shutdown().await;

    let on_disk = std::fs::metadata(&output).unwrap().len();
    assert!(on_disk > 0, "PDF should be non-empty");
    assert_eq!(conversion.bytes, on_disk, "reported size should match the file on disk");
    assert_eq!(conversion.pages, 1);

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(&bytes[..5], b"%PDF-", "output should start with the PDF magic");
}

#[tokio::test]
#[ignore]
async fn widescreen_slide_overrides_caller_margins() {
    let temp = tempfile::tempdir().unwrap();
    let converter = converter(&temp);
    let output = output_path(&temp, "slides.pdf");

    // Caller-supplied margins must be discarded for slide formats.
    let options = ConversionOptions {
        format: String::from("PPT_16_9"),
        margins: Margins {
            top: Length::inches(1.0),
            right: Length::inches(1.0),
            bottom: Length::inches(1.0),
            left: Length::inches(1.0),
        },
        ..ConversionOptions::default()
    };
    let html = "<html><body><div class=\"page\"><h1>Slide one</h1></div></body></html>";
    let conversion = converter.convert_html(html, &output, &options).await.expect("conversion should succeed");
    converter.shutdown().await;

    assert!(conversion.bytes > 0);
    // 13.333in x 7.5in at 72 points per inch, as written into the page's
    // MediaBox by Chrome.
    let content = String::from_utf8_lossy(&std::fs::read(&output).unwrap()).into_owned();
    assert!(content.contains("959.97") || content.contains("960"), "page width should be ~960pt: {content:.40}");
    assert!(content.contains("540"), "page height should be 540pt");
}

#[tokio::test]
#[ignore]
async fn failed_conversion_leaves_no_staged_file() {
    let temp = tempfile::tempdir().unwrap();
    let converter = converter(&temp);
    let output = temp.path().join("no-such-dir").join("out.pdf");

    // Persisting to a nonexistent directory fails after the document was
    // staged; the staged file must still be cleaned up.
    let result = converter.convert_html("<html><body>x</body></html>", &output, &ConversionOptions::default()).await;
    converter.shutdown().await;

    assert!(result.is_err());
    assert!(staged_files(&temp).is_empty(), "staging directory should be empty after a failure");
}

#[tokio::test]
#[ignore]
async fn file_entry_point_reads_utf8_input() {
    let temp = tempfile::tempdir().unwrap();
    let converter = converter(&temp);
    let input = temp.path().join("doc.html");
    std::fs::write(&input, "<html><body><p>नमस्ते</p></body></html>").unwrap();
    let output = output_path(&temp, "doc.pdf");

    let conversion =
        converter.convert_file(&input, &output, &ConversionOptions::default()).await.expect("conversion should succeed");
    converter.shutdown().await;

    assert!(conversion.bytes > 0);
    assert!(output.exists());
}
