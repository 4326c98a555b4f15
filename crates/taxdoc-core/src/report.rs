//! Forwarding processing results to the accounting backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{Result, TaxdocError};
use crate::models::config::BackendConfig;
use crate::pipeline::ProcessedDocument;

const PROCESSED_PATH: &str = "/api/ai/document-processed";

/// Outcome of one document as sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub success: bool,
    pub error: Option<String>,
    pub data: Option<ProcessedDocument>,
}

impl ProcessingReport {
    pub fn succeeded(document: ProcessedDocument) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(document),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: None,
        }
    }
}

/// Posts reports to `{url}/api/ai/document-processed`.
pub struct BackendReporter {
    endpoint: Option<String>,
    api_key: Option<String>,
    timeout: Duration,
}

impl BackendReporter {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            endpoint: config
                .url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(|url| format!("{}{}", url.trim_end_matches('/'), PROCESSED_PATH)),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Whether a backend URL is configured.
    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Send the report. Returns `Ok(false)` when reporting is disabled.
    pub async fn try_send(&self, user_id: &str, report: &ProcessingReport) -> Result<bool> {
        let Some(endpoint) = self.endpoint.as_deref() else {
            debug!("No backend URL configured, skipping report");
            return Ok(false);
        };

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| TaxdocError::Report(e.to_string()))?;

        let mut request = client.post(endpoint).json(&json!({
            "user_id": user_id,
            "results": report,
        }));
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| TaxdocError::Report(e.to_string()))?;

        info!("Reported results for user {} to {}", user_id, endpoint);
        Ok(true)
    }

    /// Send the report, logging instead of returning failures.
    pub async fn send(&self, user_id: &str, report: &ProcessingReport) {
        if let Err(e) = self.try_send(user_id, report).await {
            warn!("Failed to send results to backend: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let reporter = BackendReporter::new(&BackendConfig {
            url: Some("http://localhost:3000/".to_string()),
            ..BackendConfig::default()
        });
        assert!(reporter.is_enabled());
        assert_eq!(
            reporter.endpoint(),
            Some("http://localhost:3000/api/ai/document-processed")
        );
    }

    #[tokio::test]
    async fn test_disabled_without_url() {
        let reporter = BackendReporter::new(&BackendConfig {
            url: Some("  ".to_string()),
            ..BackendConfig::default()
        });
        assert!(!reporter.is_enabled());

        let sent = reporter
            .try_send("user-1", &ProcessingReport::failed("unreadable"))
            .await
            .unwrap();
        assert!(!sent);
    }

    #[test]
    fn test_failed_report_shape() {
        let json = serde_json::to_value(ProcessingReport::failed("bad file")).unwrap();
        assert_eq!(
            json,
            json!({"success": false, "error": "bad file", "data": null})
        );
    }
}
