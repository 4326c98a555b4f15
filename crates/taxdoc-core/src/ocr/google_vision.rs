//! Google Cloud Vision `images:annotate` backend.

use std::path::Path;
use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::{Engine, OcrBackend, RecognizedText};
use crate::error::OcrError;
use crate::models::config::GoogleVisionConfig;

/// Vision does not score TEXT_DETECTION output; this is reported instead.
const DETECTED_CONFIDENCE: f32 = 0.9;

/// Google Vision text detection over REST with an API key.
pub struct GoogleVisionBackend {
    timeout: Duration,
    endpoint: String,
    api_key: String,
}

impl GoogleVisionBackend {
    /// Build a backend from configuration; the API key must be set.
    pub fn new(config: &GoogleVisionConfig, timeout: Duration) -> Result<Self, OcrError> {
        let Some(api_key) = config.api_key.as_ref() else {
            return Err(OcrError::Unavailable(Engine::GoogleVision));
        };

        Ok(Self {
            timeout,
            endpoint: config.endpoint.clone(),
            api_key: api_key.clone(),
        })
    }
}

impl OcrBackend for GoogleVisionBackend {
    fn engine(&self) -> Engine {
        Engine::GoogleVision
    }

    fn recognize(&self, image_path: &Path) -> Result<RecognizedText, OcrError> {
        let bytes = std::fs::read(image_path)?;
        debug!("Sending {} bytes to Google Vision", bytes.len());

        let request = json!({
            "requests": [{
                "image": { "content": general_purpose::STANDARD.encode(&bytes) },
                "features": [{ "type": "TEXT_DETECTION" }]
            }]
        });

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| http_error(e.to_string()))?;

        let body: Value = client
            .post(format!("{}?key={}", self.endpoint, self.api_key))
            .json(&request)
            .send()
            .map_err(|e| http_error(e.to_string()))?
            .json()
            .map_err(|e| http_error(e.to_string()))?;

        parse_annotate_response(&body)
    }
}

/// First annotation's description; an error payload is a failure.
pub(crate) fn parse_annotate_response(body: &Value) -> Result<RecognizedText, OcrError> {
    let error = body
        .pointer("/responses/0/error/message")
        .or_else(|| body.pointer("/error/message"))
        .and_then(Value::as_str);
    if let Some(message) = error {
        return Err(OcrError::Api {
            engine: Engine::GoogleVision,
            message: message.to_string(),
        });
    }

    let text = body
        .pointer("/responses/0/textAnnotations/0/description")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let confidence = if text.trim().is_empty() {
        0.0
    } else {
        DETECTED_CONFIDENCE
    };

    Ok(RecognizedText::new(text, confidence))
}

fn http_error(message: String) -> OcrError {
    OcrError::Http {
        engine: Engine::GoogleVision,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_annotations() {
        let body = json!({
            "responses": [{
                "textAnnotations": [
                    {"description": "HDFC BANK\nStatement"},
                    {"description": "HDFC"}
                ]
            }]
        });

        let text = parse_annotate_response(&body).unwrap();
        assert_eq!(text.text, "HDFC BANK\nStatement");
        assert_eq!(text.confidence, DETECTED_CONFIDENCE);
    }

    #[test]
    fn test_empty_response_has_zero_confidence() {
        let body = json!({"responses": [{}]});
        let text = parse_annotate_response(&body).unwrap();
        assert_eq!(text.text, "");
        assert_eq!(text.confidence, 0.0);
    }

    #[test]
    fn test_error_payload_is_failure() {
        let body = json!({"responses": [{"error": {"message": "Bad image data."}}]});
        match parse_annotate_response(&body) {
            Err(OcrError::Api { engine, message }) => {
                assert_eq!(engine, Engine::GoogleVision);
                assert_eq!(message, "Bad image data.");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
