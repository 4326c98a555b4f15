//! Azure Document Intelligence (`prebuilt-read`) backend.

use std::path::Path;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, trace};

use super::{Engine, OcrBackend, RecognizedText};
use crate::error::OcrError;
use crate::models::config::AzureConfig;

/// Confidence reported when the service returns lines but no word scores.
const DEFAULT_CONFIDENCE: f32 = 0.9;

const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Azure Document Intelligence read model over REST.
///
/// The blocking HTTP client is built per call so the backend can be created
/// inside an async runtime and used from blocking worker threads.
pub struct AzureBackend {
    timeout: Duration,
    endpoint: String,
    api_key: String,
    model: String,
    api_version: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl AzureBackend {
    /// Build a backend from configuration; endpoint and key must be set.
    pub fn new(config: &AzureConfig, timeout: Duration) -> Result<Self, OcrError> {
        let (Some(endpoint), Some(api_key)) = (config.endpoint.as_ref(), config.api_key.as_ref())
        else {
            return Err(OcrError::Unavailable(Engine::Azure));
        };

        Ok(Self {
            timeout,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.clone(),
            model: config.model.clone(),
            api_version: config.api_version.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_polls: config.max_polls,
        })
    }

    fn client(&self) -> Result<Client, OcrError> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| http_error(e.to_string()))
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/formrecognizer/documentModels/{}:analyze?api-version={}",
            self.endpoint, self.model, self.api_version
        )
    }

    fn submit(&self, client: &Client, bytes: Vec<u8>) -> Result<String, OcrError> {
        let response = client
            .post(self.analyze_url())
            .header(KEY_HEADER, &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .map_err(|e| http_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(api_error(format!("{}: {}", status, body)));
        }

        response
            .headers()
            .get("Operation-Location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| api_error("response has no Operation-Location header".to_string()))
    }

    fn poll(&self, client: &Client, operation: &str) -> Result<Value, OcrError> {
        for attempt in 1..=self.max_polls {
            thread::sleep(self.poll_interval);

            let body: Value = client
                .get(operation)
                .header(KEY_HEADER, &self.api_key)
                .send()
                .and_then(|r| r.error_for_status())
                .map_err(|e| http_error(e.to_string()))?
                .json()
                .map_err(|e| http_error(e.to_string()))?;

            let status = body.get("status").and_then(Value::as_str).unwrap_or("");
            trace!("Azure poll {}: {}", attempt, status);

            match status {
                "succeeded" => return Ok(body),
                "failed" => {
                    let message = body
                        .pointer("/error/message")
                        .and_then(Value::as_str)
                        .unwrap_or("analysis failed");
                    return Err(api_error(message.to_string()));
                }
                _ => continue,
            }
        }

        Err(OcrError::Timeout {
            engine: Engine::Azure,
            attempts: self.max_polls,
        })
    }
}

impl OcrBackend for AzureBackend {
    fn engine(&self) -> Engine {
        Engine::Azure
    }

    fn recognize(&self, image_path: &Path) -> Result<RecognizedText, OcrError> {
        let bytes = std::fs::read(image_path)?;
        debug!("Submitting {} bytes to Azure", bytes.len());

        let client = self.client()?;
        let operation = self.submit(&client, bytes)?;
        let body = self.poll(&client, &operation)?;
        Ok(parse_analyze_result(&body))
    }
}

/// Page lines joined by newline; mean word confidence.
pub(crate) fn parse_analyze_result(body: &Value) -> RecognizedText {
    let empty = Vec::new();
    let pages = body
        .pointer("/analyzeResult/pages")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    let mut lines = Vec::new();
    let mut confidences = Vec::new();

    for page in pages {
        if let Some(page_lines) = page.get("lines").and_then(Value::as_array) {
            lines.extend(
                page_lines
                    .iter()
                    .filter_map(|l| l.get("content").and_then(Value::as_str)),
            );
        }
        if let Some(words) = page.get("words").and_then(Value::as_array) {
            confidences.extend(
                words
                    .iter()
                    .filter_map(|w| w.get("confidence").and_then(Value::as_f64)),
            );
        }
    }

    let confidence = if confidences.is_empty() {
        DEFAULT_CONFIDENCE
    } else {
        (confidences.iter().sum::<f64>() / confidences.len() as f64) as f32
    };

    RecognizedText::new(lines.join("\n"), confidence)
}

fn http_error(message: String) -> OcrError {
    OcrError::Http {
        engine: Engine::Azure,
        message,
    }
}

fn api_error(message: String) -> OcrError {
    OcrError::Api {
        engine: Engine::Azure,
        message,
    }
}
