//! Configuration structures for the document pipeline.
//!
//! A [`GatewayConfig`] is an immutable snapshot. Components receive it (or one
//! of its sections) at construction; reloading means building a new snapshot
//! and swapping it into a [`ConfigHandle`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::TaxdocError;
use crate::ocr::{Engine, OcrMethod};

/// Upper bound accepted for `files.max_size_bytes`.
pub const MAX_UPLOAD_LIMIT: u64 = 100 * 1024 * 1024;

/// Main configuration for the taxdoc pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// OCR engine configuration.
    pub ocr: OcrConfig,

    /// PDF intake configuration.
    pub pdf: PdfConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Upload validation.
    pub files: FileConfig,

    /// Result forwarding.
    pub backend: BackendConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Method used when the caller does not pick one.
    pub default_method: OcrMethod,

    /// Engines that may be probed at all.
    pub enabled_engines: Vec<Engine>,

    /// Maximum number of concurrent OCR jobs.
    pub worker_threads: usize,

    /// Laplacian variance above which EasyOCR is preferred over Tesseract.
    pub complexity_threshold: f64,

    /// Timeout for a single HTTP request to a hosted engine.
    pub request_timeout_secs: u64,

    pub azure: AzureConfig,
    pub google_vision: GoogleVisionConfig,
    pub easyocr: EasyOcrConfig,
    pub tesseract: TesseractConfig,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            default_method: OcrMethod::Auto,
            enabled_engines: Engine::PRIORITY.to_vec(),
            worker_threads: 4,
            complexity_threshold: 500.0,
            request_timeout_secs: 60,
            azure: AzureConfig::default(),
            google_vision: GoogleVisionConfig::default(),
            easyocr: EasyOcrConfig::default(),
            tesseract: TesseractConfig::default(),
        }
    }
}

/// Azure Document Intelligence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    /// Regional endpoint, e.g. `https://eastus.api.cognitive.microsoft.com/`.
    pub endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub model: String,
    pub api_version: String,
    pub poll_interval_ms: u64,
    pub max_polls: u32,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            model: "prebuilt-read".to_string(),
            api_version: "2023-07-31".to_string(),
            poll_interval_ms: 1000,
            max_polls: 60,
        }
    }
}

impl AzureConfig {
    pub fn is_configured(&self) -> bool {
        has_value(&self.endpoint) && has_value(&self.api_key)
    }
}

/// Google Vision settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleVisionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub endpoint: String,
}

impl Default for GoogleVisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://vision.googleapis.com/v1/images:annotate".to_string(),
        }
    }
}

impl GoogleVisionConfig {
    pub fn is_configured(&self) -> bool {
        has_value(&self.api_key)
    }
}

/// EasyOCR command-line tool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EasyOcrConfig {
    pub command: String,
    pub languages: Vec<String>,
    pub gpu: bool,
}

impl Default for EasyOcrConfig {
    fn default() -> Self {
        Self {
            command: "easyocr".to_string(),
            languages: vec!["en".to_string()],
            gpu: false,
        }
    }
}

/// Tesseract command-line tool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseractConfig {
    pub command: String,
    pub language: String,
    /// Page segmentation mode.
    pub psm: u8,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            command: "tesseract".to_string(),
            language: "eng".to_string(),
            psm: 3,
        }
    }
}

/// PDF intake configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Use embedded PDF text instead of OCR when there is enough of it.
    pub prefer_embedded_text: bool,

    /// Minimum text length to consider a PDF as text-based.
    pub min_text_length: usize,

    /// DPI for rasterising the first page before OCR.
    pub render_dpi: u32,

    /// Rasteriser executable (poppler).
    pub pdftoppm_command: String,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            prefer_embedded_text: true,
            min_text_length: 50,
            render_dpi: 150,
            pdftoppm_command: "pdftoppm".to_string(),
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Statement lines shorter than this are not parsed.
    pub min_line_length: usize,

    /// Maximum number of invoice line items kept.
    pub max_line_items: usize,

    /// Drop GSTINs that fail structural validation.
    pub strict_gstin: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_line_length: 10,
            max_line_items: 10,
            strict_gstin: false,
        }
    }
}

/// Upload validation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub max_size_bytes: u64,
    pub allowed_extensions: Vec<String>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 10 * 1024 * 1024,
            allowed_extensions: ["jpg", "jpeg", "png", "pdf"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Backend service that receives processing results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Fill credentials and endpoints from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Fill credentials and endpoints from `lookup`; non-empty values win.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT") {
            self.ocr.azure.endpoint = Some(v);
        }
        if let Some(v) = get("AZURE_DOCUMENT_INTELLIGENCE_KEY") {
            self.ocr.azure.api_key = Some(v);
        }
        if let Some(v) = get("GOOGLE_VISION_API_KEY") {
            self.ocr.google_vision.api_key = Some(v);
        }
        if let Some(v) = get("NODE_BACKEND_URL") {
            self.backend.url = Some(v);
        }
        if let Some(v) = get("NODE_BACKEND_API_KEY") {
            self.backend.api_key = Some(v);
        }

        self
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), TaxdocError> {
        if self.files.max_size_bytes == 0 {
            return Err(TaxdocError::Config("files.max_size_bytes must be positive".into()));
        }
        if self.files.max_size_bytes > MAX_UPLOAD_LIMIT {
            return Err(TaxdocError::Config(format!(
                "files.max_size_bytes cannot exceed {} bytes",
                MAX_UPLOAD_LIMIT
            )));
        }
        if self.ocr.worker_threads == 0 {
            return Err(TaxdocError::Config("ocr.worker_threads must be at least 1".into()));
        }
        if !self.ocr.complexity_threshold.is_finite() || self.ocr.complexity_threshold < 0.0 {
            return Err(TaxdocError::Config(
                "ocr.complexity_threshold must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

fn has_value(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Shared reference to the current configuration snapshot.
///
/// Readers take a cheap `Arc` clone; a reload replaces the whole snapshot and
/// never mutates one in place.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    current: Arc<RwLock<Arc<GatewayConfig>>>,
    source: Option<PathBuf>,
}

impl ConfigHandle {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(config))),
            source: None,
        }
    }

    /// Load a snapshot from `path` (with environment overrides) and remember
    /// the path for [`ConfigHandle::reload`].
    pub fn load(path: &Path) -> Result<Self, TaxdocError> {
        let config = GatewayConfig::from_file(path)?.with_env_overrides();
        config.validate()?;
        Ok(Self {
            current: Arc::new(RwLock::new(Arc::new(config))),
            source: Some(path.to_path_buf()),
        })
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<GatewayConfig> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Validate `config` and make it the current snapshot.
    pub fn replace(&self, config: GatewayConfig) -> Result<Arc<GatewayConfig>, TaxdocError> {
        config.validate()?;
        let next = Arc::new(config);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::clone(&next);
        Ok(next)
    }

    /// Re-read the file this handle was loaded from.
    pub fn reload(&self) -> Result<Arc<GatewayConfig>, TaxdocError> {
        let path = self
            .source
            .as_deref()
            .ok_or_else(|| TaxdocError::Config("configuration was not loaded from a file".into()))?;
        let config = GatewayConfig::from_file(path)?.with_env_overrides();
        self.replace(config)
    }
}
