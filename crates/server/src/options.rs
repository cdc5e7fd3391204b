//! Request option normalization.
//!
//! The three endpoints accept the same option fields through different
//! transports: JSON bodies carry native booleans and numbers (but tolerate
//! their string forms), multipart bodies carry everything as text. Both roads
//! lead through [`RequestOptions`] into the orchestrator's
//! [`ConversionOptions`], merging caller values over the documented defaults.

use crate::error::ApiError;
use platen_render::{ConversionOptions, Length, Margins};
use serde::{Deserialize, Deserializer};

/// Caller-supplied conversion options, all optional.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestOptions {
    pub format: Option<String>,
    #[serde(deserialize_with = "flag")]
    pub landscape: Option<bool>,
    #[serde(deserialize_with = "number")]
    pub scale: Option<f64>,
    pub margin_top: Option<String>,
    pub margin_right: Option<String>,
    pub margin_bottom: Option<String>,
    pub margin_left: Option<String>,
}

impl RequestOptions {
    /// Record a multipart text field by its form name. Unknown names are
    /// ignored, mirroring lenient form handling.
    pub fn set_text_field(&mut self, name: &str, value: String) {
        match name {
            "format" => self.format = Some(value),
            "landscape" => self.landscape = Some(value == "true"),
            "scale" => self.scale = value.parse().ok(),
            "marginTop" => self.margin_top = Some(value),
            "marginRight" => self.margin_right = Some(value),
            "marginBottom" => self.margin_bottom = Some(value),
            "marginLeft" => self.margin_left = Some(value),
            _ => tracing::debug!(field = name, "ignoring unknown option field"),
        }
    }

    /// Merge over the defaults and enforce the slide-margin invariant.
    pub fn into_options(self) -> Result<ConversionOptions, ApiError> {
        let mut options = ConversionOptions::default();
        if let Some(format) = self.format {
            options.format = format;
        }
        if let Some(landscape) = self.landscape {
            options.landscape = landscape;
        }
        if let Some(scale) = self.scale {
            options.scale = scale;
        }
        options.margins = Margins {
            top: margin(self.margin_top, options.margins.top)?,
            right: margin(self.margin_right, options.margins.right)?,
            bottom: margin(self.margin_bottom, options.margins.bottom)?,
            left: margin(self.margin_left, options.margins.left)?,
        };
        // Slide formats print edge-to-edge; caller margins are discarded here
        // so they never reach the print call.
        if options.format.starts_with("PPT_") {
            options.margins = Margins::ZERO;
        }
        Ok(options)
    }
}

fn margin(value: Option<String>, default: Length) -> Result<Length, ApiError> {
    match value {
        Some(value) => value.parse::<Length>().map_err(|err| ApiError::InvalidOption(err.to_string())),
        None => Ok(default),
    }
}

/// Accepts `true`/`false` as JSON booleans or their string forms.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }
    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Bool(value) => value,
        Raw::Text(value) => value == "true",
    }))
}

/// Accepts numbers or their string forms; unparseable strings fall back to
/// the default rather than failing the request.
fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }
    Ok(Option::<Raw>::deserialize(deserializer)?.and_then(|raw| match raw {
        Raw::Number(value) => Some(value),
        Raw::Text(value) => value.parse().ok(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn empty_request_yields_documented_defaults() {
        let options = RequestOptions::default().into_options().unwrap();
        assert_eq!(options.format, "A4");
        assert!(!options.landscape);
        assert_eq!(options.scale, 1.0);
        assert_eq!(options.margins, Margins::default());
        assert!(options.print_background);
        assert!(options.prefer_css_page_size);
        assert!(options.hindi_fonts);
    }

    #[test]
    fn json_options_deserialize_with_camel_case_names() {
        let request: RequestOptions = serde_json::from_str(
            r#"{"format":"Letter","landscape":true,"scale":0.8,"marginTop":"5mm","marginLeft":"0.5in"}"#,
        )
        .unwrap();
        let options = request.into_options().unwrap();
        assert_eq!(options.format, "Letter");
        assert!(options.landscape);
        assert_eq!(options.scale, 0.8);
        assert_eq!(options.margins.top, "5mm".parse().unwrap());
        assert_eq!(options.margins.left, "0.5in".parse().unwrap());
        // Unspecified margins keep their defaults.
        assert_eq!(options.margins.right, Margins::default().right);
    }

    #[rstest]
    #[case(r#"{"landscape":"true"}"#, true)]
    #[case(r#"{"landscape":"false"}"#, false)]
    #[case(r#"{"landscape":"yes"}"#, false)]
    #[case(r#"{"landscape":true}"#, true)]
    fn landscape_accepts_bool_and_string_forms(#[case] body: &str, #[case] expected: bool) {
        let request: RequestOptions = serde_json::from_str(body).unwrap();
        assert_eq!(request.into_options().unwrap().landscape, expected);
    }

    #[rstest]
    #[case(r#"{"scale":"1.5"}"#, 1.5)]
    #[case(r#"{"scale":2}"#, 2.0)]
    #[case(r#"{"scale":"garbage"}"#, 1.0)]
    fn scale_accepts_number_and_string_forms(#[case] body: &str, #[case] expected: f64) {
        let request: RequestOptions = serde_json::from_str(body).unwrap();
        assert_eq!(request.into_options().unwrap().scale, expected);
    }

    #[test]
    fn slide_formats_zero_margins_regardless_of_caller_values() {
        let request = RequestOptions {
            format: Some(String::from("PPT_16_9")),
            margin_top: Some(String::from("25mm")),
            margin_bottom: Some(String::from("25mm")),
            ..RequestOptions::default()
        };
        let options = request.into_options().unwrap();
        assert!(options.margins.is_zero());
    }

    #[test]
    fn malformed_margins_are_rejected() {
        let request = RequestOptions { margin_top: Some(String::from("12pt")), ..RequestOptions::default() };
        match request.into_options() {
            Err(ApiError::InvalidOption(message)) => assert!(message.contains("12pt"), "message should name the bad value: {message}"),
            other => panic!("expected an invalid-option error, got {other:?}"),
        }
    }

    #[test]
    fn multipart_text_fields_populate_the_same_options() {
        let mut request = RequestOptions::default();
        request.set_text_field("format", String::from("PPT_4_3"));
        request.set_text_field("landscape", String::from("true"));
        request.set_text_field("scale", String::from("0.9"));
        request.set_text_field("marginTop", String::from("20mm"));
        request.set_text_field("unknownField", String::from("ignored"));

        let options = request.into_options().unwrap();
        assert_eq!(options.format, "PPT_4_3");
        assert!(options.landscape);
        assert_eq!(options.scale, 0.9);
        assert!(options.margins.is_zero(), "slide format wins over the supplied margin");
    }
}
