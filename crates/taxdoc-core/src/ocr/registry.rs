//! Discovery of the OCR engines usable on this host.

use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::{
    AzureBackend, EasyOcrBackend, Engine, GoogleVisionBackend, OcrBackend, TesseractBackend,
};
use crate::models::config::OcrConfig;

/// Available backends in priority order.
pub struct EngineRegistry {
    backends: Vec<Arc<dyn OcrBackend>>,
}

impl EngineRegistry {
    /// Probe every enabled engine once.
    ///
    /// Remote engines need credentials; local engines need their executable
    /// to respond.
    pub fn probe(config: &OcrConfig) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let mut backends: Vec<Arc<dyn OcrBackend>> = Vec::new();

        for engine in Engine::PRIORITY {
            if !config.enabled_engines.contains(&engine) {
                debug!("{} disabled by configuration", engine);
                continue;
            }

            let backend: Option<Arc<dyn OcrBackend>> = match engine {
                Engine::Azure => AzureBackend::new(&config.azure, timeout)
                    .ok()
                    .map(|b| Arc::new(b) as Arc<dyn OcrBackend>),
                Engine::GoogleVision => GoogleVisionBackend::new(&config.google_vision, timeout)
                    .ok()
                    .map(|b| Arc::new(b) as Arc<dyn OcrBackend>),
                Engine::EasyOcr => command_available(&config.easyocr.command, "--help")
                    .then(|| Arc::new(EasyOcrBackend::new(&config.easyocr)) as Arc<dyn OcrBackend>),
                Engine::Tesseract => command_available(&config.tesseract.command, "--version")
                    .then(|| {
                        Arc::new(TesseractBackend::new(&config.tesseract)) as Arc<dyn OcrBackend>
                    }),
            };

            match backend {
                Some(backend) => backends.push(backend),
                None => debug!("{} not available", engine),
            }
        }

        let registry = Self::from_backends(backends);
        info!("OCR engines available: {:?}", registry.available());
        registry
    }

    /// Registry over explicit backends, reordered by engine priority.
    pub fn from_backends(mut backends: Vec<Arc<dyn OcrBackend>>) -> Self {
        backends.sort_by_key(|b| b.engine());
        backends.dedup_by_key(|b| b.engine());
        Self { backends }
    }

    /// Registry with no engines.
    pub fn empty() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    /// Available engines, highest priority first.
    pub fn available(&self) -> Vec<Engine> {
        self.backends.iter().map(|b| b.engine()).collect()
    }

    pub fn contains(&self, engine: Engine) -> bool {
        self.backends.iter().any(|b| b.engine() == engine)
    }

    pub fn backend(&self, engine: Engine) -> Option<&Arc<dyn OcrBackend>> {
        self.backends.iter().find(|b| b.engine() == engine)
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

/// Whether `command arg` can be spawned and exits successfully.
pub fn command_available(command: &str, arg: &str) -> bool {
    Command::new(command)
        .arg(arg)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::error::OcrError;
    use crate::models::config::{AzureConfig, EasyOcrConfig, TesseractConfig};
    use crate::ocr::RecognizedText;

    struct Stub(Engine);

    impl OcrBackend for Stub {
        fn engine(&self) -> Engine {
            self.0
        }

        fn recognize(&self, _image_path: &Path) -> Result<RecognizedText, OcrError> {
            Ok(RecognizedText::new("", 0.0))
        }
    }

    #[test]
    fn test_from_backends_orders_by_priority() {
        let backends: Vec<Arc<dyn OcrBackend>> = vec![
            Arc::new(Stub(Engine::Tesseract)),
            Arc::new(Stub(Engine::Azure)),
            Arc::new(Stub(Engine::Tesseract)),
        ];
        let registry = EngineRegistry::from_backends(backends);
        assert_eq!(registry.available(), vec![Engine::Azure, Engine::Tesseract]);
        assert!(registry.contains(Engine::Azure));
        assert!(registry.backend(Engine::EasyOcr).is_none());
    }

    #[test]
    fn test_probe_without_credentials_or_tools() {
        let config = OcrConfig {
            azure: AzureConfig::default(),
            easyocr: EasyOcrConfig {
                command: "taxdoc-no-such-easyocr".to_string(),
                ..EasyOcrConfig::default()
            },
            tesseract: TesseractConfig {
                command: "taxdoc-no-such-tesseract".to_string(),
                ..TesseractConfig::default()
            },
            ..OcrConfig::default()
        };
        assert!(EngineRegistry::probe(&config).is_empty());
    }

    #[test]
    fn test_probe_respects_enabled_engines() {
        let mut config = OcrConfig::default();
        config.azure.endpoint = Some("https://example.test".to_string());
        config.azure.api_key = Some("key".to_string());
        config.google_vision.api_key = Some("key".to_string());
        config.enabled_engines = vec![Engine::GoogleVision];

        let registry = EngineRegistry::probe(&config);
        assert_eq!(registry.available(), vec![Engine::GoogleVision]);
    }

    #[test]
    fn test_missing_command_is_unavailable() {
        assert!(!command_available("taxdoc-no-such-command", "--version"));
    }
}
