//! `LibreTranslate` request and response types.

use serde::{Deserialize, Serialize};

/// Body of a `POST /translate` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub q: String,
    pub source: String,
    pub target: String,
    pub format: String,
}

impl TranslationRequest {
    /// Plain-text request with automatic source detection.
    #[must_use]
    pub fn auto(text: &str, target: &str) -> Self {
        Self {
            q: text.to_string(),
            source: "auto".to_string(),
            target: target.to_string(),
            format: "text".to_string(),
        }
    }
}

/// Language detected by the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedLanguage {
    pub language: String,
    /// Percentage, 0 to 100.
    #[serde(default)]
    pub confidence: f64,
}

/// Body of a `/translate` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResponse {
    #[serde(default)]
    pub translated_text: String,
    #[serde(default)]
    pub detected_language: Option<DetectedLanguage>,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

/// A completed translation call.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub translated_text: String,
    pub detected_language: Option<DetectedLanguage>,
    pub alternatives: Vec<String>,
    pub target_language: String,
}

impl Translation {
    #[must_use]
    pub fn new(response: TranslationResponse, target_language: &str) -> Self {
        Self {
            translated_text: response.translated_text,
            detected_language: response.detected_language,
            alternatives: response.alternatives,
            target_language: target_language.to_string(),
        }
    }

    /// Detected source language, if the endpoint reported one.
    #[must_use]
    pub fn source_language(&self) -> Option<&str> {
        self.detected_language.as_ref().map(|d| d.language.as_str())
    }

    /// True when text came back and the source differs from the target.
    ///
    /// Text already in the target language counts as a failure so it is
    /// not echoed back as a "translation".
    #[must_use]
    pub fn is_success(&self) -> bool {
        if self.translated_text.is_empty() {
            return false;
        }
        self.source_language()
            .is_some_and(|source| !source.eq_ignore_ascii_case(&self.target_language))
    }

    /// `[Translated FR|EN 92%]: hello`
    #[must_use]
    pub fn render(&self) -> String {
        let (source, confidence) = match &self.detected_language {
            Some(d) => (d.language.to_uppercase(), format!("{:.0}", d.confidence)),
            None => ("??".to_string(), "N/A".to_string()),
        };
        format!(
            "[Translated {source}|{} {confidence}%]: {}",
            self.target_language.to_uppercase(),
            self.translated_text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(text: &str, language: &str, confidence: f64) -> TranslationResponse {
        TranslationResponse {
            translated_text: text.to_string(),
            detected_language: Some(DetectedLanguage {
                language: language.to_string(),
                confidence,
            }),
            alternatives: Vec::new(),
        }
    }

    #[test]
    fn test_request_serializes_expected_body() {
        let body = serde_json::to_value(TranslationRequest::auto("bonjour", "en")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"q": "bonjour", "source": "auto", "target": "en", "format": "text"})
        );
    }

    #[test]
    fn test_response_parses_camel_case() {
        let json = r#"{"translatedText":"hello","detectedLanguage":{"language":"fr","confidence":92},"alternatives":["hi"]}"#;
        let parsed: TranslationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, TranslationResponse {
            alternatives: vec!["hi".to_string()],
            ..response("hello", "fr", 92.0)
        });
    }

    #[test]
    fn test_render_and_success_for_foreign_text() {
        let translation = Translation::new(response("hello", "fr", 92.0), "en");
        assert!(translation.is_success());
        assert_eq!(translation.render(), "[Translated FR|EN 92%]: hello");
    }

    #[test]
    fn test_same_language_is_not_success() {
        let translation = Translation::new(response("hello", "en", 99.0), "EN");
        assert!(!translation.is_success());
    }

    #[test]
    fn test_empty_text_is_not_success() {
        let translation = Translation::new(response("", "fr", 50.0), "en");
        assert!(!translation.is_success());
    }

    #[test]
    fn test_render_without_detection() {
        let translation = Translation::new(
            TranslationResponse {
                translated_text: "hallo".to_string(),
                detected_language: None,
                alternatives: Vec::new(),
            },
            "de",
        );
        assert!(!translation.is_success());
        assert_eq!(translation.render(), "[Translated ??|DE N/A%]: hallo");
    }
}
