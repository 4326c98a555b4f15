//! OCR engines, engine selection and the blocking worker pool.

mod azure;
mod complexity;
mod easyocr;
mod google_vision;
mod pool;
mod preprocessing;
mod registry;
mod selector;
mod tesseract;

pub use azure::AzureBackend;
pub use complexity::{image_complexity, laplacian_variance};
pub use easyocr::EasyOcrBackend;
pub use google_vision::GoogleVisionBackend;
pub use pool::OcrPool;
pub use preprocessing::ImagePreprocessor;
pub use registry::EngineRegistry;
pub use selector::{select_engine, OcrService, OCR_UNAVAILABLE_MESSAGE};
pub use tesseract::TesseractBackend;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// An OCR backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Engine {
    #[serde(rename = "azure")]
    Azure,
    #[serde(rename = "google_vision")]
    GoogleVision,
    #[serde(rename = "easyocr")]
    EasyOcr,
    #[serde(rename = "tesseract")]
    Tesseract,
}

impl Engine {
    /// All engines, highest priority first.
    pub const PRIORITY: [Engine; 4] = [
        Engine::Azure,
        Engine::GoogleVision,
        Engine::EasyOcr,
        Engine::Tesseract,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Azure => "azure",
            Engine::GoogleVision => "google_vision",
            Engine::EasyOcr => "easyocr",
            Engine::Tesseract => "tesseract",
        }
    }

    /// Whether the engine runs on a hosted service.
    pub fn is_remote(&self) -> bool {
        matches!(self, Engine::Azure | Engine::GoogleVision)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "azure" => Ok(Engine::Azure),
            "google_vision" | "google" => Ok(Engine::GoogleVision),
            "easyocr" => Ok(Engine::EasyOcr),
            "tesseract" => Ok(Engine::Tesseract),
            other => Err(format!("unknown OCR engine: {}", other)),
        }
    }
}

/// Engine requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OcrMethod {
    /// Let the selector decide.
    #[default]
    Auto,
    Azure,
    GoogleVision,
    #[serde(rename = "easyocr")]
    EasyOcr,
    Tesseract,
}

impl OcrMethod {
    /// The explicitly requested engine, if any.
    pub fn engine(&self) -> Option<Engine> {
        match self {
            OcrMethod::Auto => None,
            OcrMethod::Azure => Some(Engine::Azure),
            OcrMethod::GoogleVision => Some(Engine::GoogleVision),
            OcrMethod::EasyOcr => Some(Engine::EasyOcr),
            OcrMethod::Tesseract => Some(Engine::Tesseract),
        }
    }
}

impl From<Engine> for OcrMethod {
    fn from(engine: Engine) -> Self {
        match engine {
            Engine::Azure => OcrMethod::Azure,
            Engine::GoogleVision => OcrMethod::GoogleVision,
            Engine::EasyOcr => OcrMethod::EasyOcr,
            Engine::Tesseract => OcrMethod::Tesseract,
        }
    }
}

impl FromStr for OcrMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(OcrMethod::Auto);
        }
        s.parse::<Engine>().map(OcrMethod::from)
    }
}

/// Where the text of an [`OcrResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodUsed {
    Azure,
    GoogleVision,
    #[serde(rename = "easyocr")]
    EasyOcr,
    Tesseract,
    /// Text embedded in a PDF.
    PdfText,
    /// No engine was available.
    None,
}

impl From<Engine> for MethodUsed {
    fn from(engine: Engine) -> Self {
        match engine {
            Engine::Azure => MethodUsed::Azure,
            Engine::GoogleVision => MethodUsed::GoogleVision,
            Engine::EasyOcr => MethodUsed::EasyOcr,
            Engine::Tesseract => MethodUsed::Tesseract,
        }
    }
}

impl fmt::Display for MethodUsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MethodUsed::Azure => "azure",
            MethodUsed::GoogleVision => "google_vision",
            MethodUsed::EasyOcr => "easyocr",
            MethodUsed::Tesseract => "tesseract",
            MethodUsed::PdfText => "pdf_text",
            MethodUsed::None => "none",
        };
        f.write_str(name)
    }
}

/// Text and confidence returned by a single backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    pub text: String,
    /// Engine reported confidence (0.0 - 1.0).
    pub confidence: f32,
}

impl RecognizedText {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Result of one OCR invocation. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub extracted_text: String,

    /// Confidence (0.0 - 1.0); 0 when no engine produced text.
    pub confidence: f32,

    /// Processing time in seconds.
    pub processing_time: f64,

    pub method_used: MethodUsed,
}

impl OcrResult {
    /// Successful recognition by `engine`.
    pub fn recognized(engine: Engine, text: RecognizedText, elapsed: Duration) -> Self {
        Self {
            extracted_text: text.text,
            confidence: text.confidence,
            processing_time: elapsed.as_secs_f64(),
            method_used: engine.into(),
        }
    }

    /// Text taken directly from a PDF.
    pub fn embedded_text(text: String, elapsed: Duration) -> Self {
        Self {
            extracted_text: text,
            confidence: 1.0,
            processing_time: elapsed.as_secs_f64(),
            method_used: MethodUsed::PdfText,
        }
    }

    /// No engine is available at all.
    pub fn unavailable() -> Self {
        Self {
            extracted_text: OCR_UNAVAILABLE_MESSAGE.to_string(),
            confidence: 0.0,
            processing_time: 0.0,
            method_used: MethodUsed::None,
        }
    }

    /// Every engine failed; the last error becomes the text.
    pub fn failed(method: MethodUsed, message: impl fmt::Display, elapsed: Duration) -> Self {
        Self {
            extracted_text: format!("OCR extraction failed: {}", message),
            confidence: 0.0,
            processing_time: elapsed.as_secs_f64(),
            method_used: method,
        }
    }

    /// Whether any text was recognised.
    pub fn has_text(&self) -> bool {
        self.confidence > 0.0 && !self.extracted_text.trim().is_empty()
    }
}

/// A blocking OCR engine.
pub trait OcrBackend: Send + Sync {
    /// Engine implemented by this backend.
    fn engine(&self) -> Engine;

    /// Recognise the text in the image at `image_path`.
    fn recognize(&self, image_path: &Path) -> Result<RecognizedText, OcrError>;
}
