//! Engine selection and the fallback chain.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::complexity::image_complexity;
use super::registry::EngineRegistry;
use super::{Engine, MethodUsed, OcrMethod, OcrResult};
use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Text of the result returned when no engine is available.
pub const OCR_UNAVAILABLE_MESSAGE: &str =
    "OCR services unavailable. Please configure Azure Document Intelligence or install OCR dependencies.";

/// Choose the engine for one image.
///
/// An explicit request wins if that engine is available; an unavailable one
/// falls back to the first available engine. For `auto`: Azure, then Google
/// Vision; between the two local engines the image complexity
/// decides (EasyOCR above `threshold`, Tesseract at or below). `complexity`
/// is only evaluated when both local engines are the remaining choice.
pub fn select_engine<F>(
    available: &[Engine],
    requested: OcrMethod,
    complexity: F,
    threshold: f64,
) -> Option<Engine>
where
    F: FnOnce() -> Option<f64>,
{
    let first = available.first().copied()?;

    if let Some(engine) = requested.engine() {
        if available.contains(&engine) {
            return Some(engine);
        }
        debug!("Requested {} is not available, using {}", engine, first);
        return Some(first);
    }

    for remote in [Engine::Azure, Engine::GoogleVision] {
        if available.contains(&remote) {
            return Some(remote);
        }
    }

    let has_easyocr = available.contains(&Engine::EasyOcr);
    let has_tesseract = available.contains(&Engine::Tesseract);
    if has_easyocr && has_tesseract {
        return match complexity() {
            Some(variance) if variance > threshold => Some(Engine::EasyOcr),
            Some(_) => Some(Engine::Tesseract),
            None => Some(first),
        };
    }

    Some(first)
}

/// Runs the selected engine and falls back through the others.
pub struct OcrService {
    registry: Arc<EngineRegistry>,
    complexity_threshold: f64,
}

impl OcrService {
    pub fn new(registry: Arc<EngineRegistry>) -> Self {
        Self {
            registry,
            complexity_threshold: OcrConfig::default().complexity_threshold,
        }
    }

    /// Probe engines and take the threshold from configuration.
    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(Arc::new(EngineRegistry::probe(config)))
            .with_complexity_threshold(config.complexity_threshold)
    }

    /// Set the Laplacian variance above which EasyOCR is preferred.
    pub fn with_complexity_threshold(mut self, threshold: f64) -> Self {
        self.complexity_threshold = threshold;
        self
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    /// Extract text from the image at `path`.
    ///
    /// The selected engine runs first; on error the remaining engines are
    /// tried in priority order. This call blocks.
    pub fn extract_text(&self, path: &Path, method: OcrMethod) -> OcrResult {
        let start = Instant::now();
        let available = self.registry.available();

        let complexity = || match image_complexity(path) {
            Ok(variance) => {
                debug!("Image complexity {:.1}", variance);
                Some(variance)
            }
            Err(e) => {
                warn!("Could not measure image complexity: {}", e);
                None
            }
        };

        let Some(chosen) = select_engine(&available, method, complexity, self.complexity_threshold)
        else {
            warn!("No OCR engine available");
            return OcrResult::unavailable();
        };

        let order = std::iter::once(chosen).chain(available.iter().copied().filter(|e| *e != chosen));
        let mut last_error: Option<OcrError> = None;

        for engine in order {
            let Some(backend) = self.registry.backend(engine) else {
                continue;
            };

            match backend.recognize(path) {
                Ok(text) => {
                    let result = OcrResult::recognized(engine, text, start.elapsed());
                    info!(
                        "{} extracted {} characters in {:.2}s",
                        engine,
                        result.extracted_text.len(),
                        result.processing_time
                    );
                    return result;
                }
                Err(e) => {
                    warn!("{} failed: {}", engine, e);
                    last_error = Some(e);
                }
            }
        }

        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no engine produced a result".to_string());
        OcrResult::failed(MethodUsed::from(chosen), message, start.elapsed())
    }
}
