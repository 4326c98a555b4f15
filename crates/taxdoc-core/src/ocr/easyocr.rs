//! EasyOCR command-line backend.

use std::path::Path;
use std::process::Command;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::{Engine, OcrBackend, RecognizedText};
use crate::error::OcrError;
use crate::models::config::EasyOcrConfig;

lazy_static! {
    /// Tail of a `(box, 'text', confidence)` detail line.
    static ref DETAIL_LINE: Regex = Regex::new(
        r#"(?:'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)")\s*,\s*(?:np\.float(?:32|64)\()?\s*([0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)?)\s*\)?\s*\)\s*$"#
    ).unwrap();
}

/// Runs the `easyocr` tool with detail output.
pub struct EasyOcrBackend {
    command: String,
    languages: Vec<String>,
    gpu: bool,
}

impl EasyOcrBackend {
    pub fn new(config: &EasyOcrConfig) -> Self {
        Self {
            command: config.command.clone(),
            languages: config.languages.clone(),
            gpu: config.gpu,
        }
    }

    fn process_error(message: impl Into<String>) -> OcrError {
        OcrError::Process {
            engine: Engine::EasyOcr,
            message: message.into(),
        }
    }
}

impl OcrBackend for EasyOcrBackend {
    fn engine(&self) -> Engine {
        Engine::EasyOcr
    }

    fn recognize(&self, image_path: &Path) -> Result<RecognizedText, OcrError> {
        let output = Command::new(&self.command)
            .arg("-l")
            .args(&self.languages)
            .arg("-f")
            .arg(image_path)
            .args(["--detail", "1", "--gpu", if self.gpu { "True" } else { "False" }])
            .output()
            .map_err(|e| Self::process_error(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Self::process_error(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let text = parse_detail_output(&stdout);
        debug!("EasyOCR read {} characters", text.text.len());
        Ok(text)
    }
}

/// Fragments joined by spaces; mean fragment confidence.
pub(crate) fn parse_detail_output(output: &str) -> RecognizedText {
    let mut fragments = Vec::new();
    let mut confidences = Vec::new();

    for line in output.lines() {
        let Some(caps) = DETAIL_LINE.captures(line.trim()) else {
            continue;
        };
        let Some(text) = caps.get(1).or_else(|| caps.get(2)) else {
            continue;
        };
        let Ok(confidence) = caps[3].parse::<f64>() else {
            continue;
        };

        fragments.push(text.as_str().replace("\\'", "'").replace("\\\"", "\""));
        confidences.push(confidence);
    }

    if confidences.is_empty() {
        return RecognizedText::new("", 0.0);
    }

    let confidence = confidences.iter().sum::<f64>() / confidences.len() as f64;
    RecognizedText::new(fragments.join(" "), confidence as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detail_output() {
        let output = "\
([[10, 5], [120, 5], [120, 25], [10, 25]], 'TAX INVOICE', 0.9)
([[np.int32(10), np.int32(30)], [np.int32(200), np.int32(30)]], \"Vendor's copy\", np.float64(0.7))
WARNING: Using CPU. Note: This module is much faster with a GPU.
";
        let text = parse_detail_output(output);
        assert_eq!(text.text, "TAX INVOICE Vendor's copy");
        assert!((text.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_no_detections() {
        let text = parse_detail_output("");
        assert_eq!(text.text, "");
        assert_eq!(text.confidence, 0.0);
    }

    #[test]
    fn test_missing_executable_is_process_error() {
        let backend = EasyOcrBackend::new(&EasyOcrConfig {
            command: "taxdoc-no-such-easyocr".to_string(),
            ..EasyOcrConfig::default()
        });
        let result = backend.recognize(Path::new("page.png"));
        assert!(matches!(
            result,
            Err(OcrError::Process { engine: Engine::EasyOcr, .. })
        ));
    }
}
