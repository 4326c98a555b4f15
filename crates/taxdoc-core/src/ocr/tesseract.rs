//! Tesseract command-line backend.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use super::preprocessing::ImagePreprocessor;
use super::{Engine, OcrBackend, RecognizedText};
use crate::error::OcrError;
use crate::models::config::TesseractConfig;

/// TSV row level for a single word.
const WORD_LEVEL: &str = "5";

/// Runs `tesseract` on a preprocessed copy of the image and reads TSV output.
pub struct TesseractBackend {
    command: String,
    language: String,
    psm: u8,
    preprocessor: ImagePreprocessor,
}

impl TesseractBackend {
    pub fn new(config: &TesseractConfig) -> Self {
        Self {
            command: config.command.clone(),
            language: config.language.clone(),
            psm: config.psm,
            preprocessor: ImagePreprocessor::new(),
        }
    }

    /// Replace the image preprocessor.
    pub fn with_preprocessor(mut self, preprocessor: ImagePreprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    fn process_error(message: impl Into<String>) -> OcrError {
        OcrError::Process {
            engine: Engine::Tesseract,
            message: message.into(),
        }
    }
}

impl OcrBackend for TesseractBackend {
    fn engine(&self) -> Engine {
        Engine::Tesseract
    }

    fn recognize(&self, image_path: &Path) -> Result<RecognizedText, OcrError> {
        let image = image::open(image_path).map_err(|e| OcrError::InvalidImage(e.to_string()))?;
        let prepared = self.preprocessor.prepare(&image);

        let staged = tempfile::Builder::new()
            .prefix("taxdoc-ocr-")
            .suffix(".png")
            .tempfile()?;
        prepared
            .save(staged.path())
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

        let output = Command::new(&self.command)
            .arg(staged.path())
            .arg("stdout")
            .args(["-l", &self.language])
            .args(["--psm", &self.psm.to_string()])
            .arg("tsv")
            .output()
            .map_err(|e| Self::process_error(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Self::process_error(stderr.trim().to_string()));
        }

        let text = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        debug!(
            "Tesseract read {} characters (confidence {:.2})",
            text.text.len(),
            text.confidence
        );
        Ok(text)
    }
}

/// Words grouped into lines by `(page, block, paragraph, line)`.
///
/// Confidence is the mean of the positive word confidences scaled to 0-1.
pub(crate) fn parse_tsv(tsv: &str) -> RecognizedText {
    let mut lines: Vec<((u32, u32, u32, u32), Vec<String>)> = Vec::new();
    let mut confidences = Vec::new();

    for row in tsv.lines() {
        let columns: Vec<&str> = row.split('\t').collect();
        if columns.len() < 12 || columns[0] != WORD_LEVEL {
            continue;
        }

        let word = columns[11].trim();
        if word.is_empty() {
            continue;
        }

        let key_part = |i: usize| columns[i].parse::<u32>().unwrap_or(0);
        let key = (key_part(1), key_part(2), key_part(3), key_part(4));

        if let Ok(conf) = columns[10].parse::<f64>() {
            if conf > 0.0 {
                confidences.push(conf);
            }
        }

        match lines.last_mut() {
            Some((last, words)) if *last == key => words.push(word.to_string()),
            _ => lines.push((key, vec![word.to_string()])),
        }
    }

    let text = lines
        .iter()
        .map(|(_, words)| words.join(" "))
        .collect::<Vec<_>>()
        .join("\n");

    let confidence = if confidences.is_empty() {
        0.0
    } else {
        confidences.iter().sum::<f64>() / confidences.len() as f64 / 100.0
    };

    RecognizedText::new(text, confidence as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t
4\t1\t1\t1\t1\t0\t10\t10\t300\t20\t-1\t
5\t1\t1\t1\t1\t1\t10\t10\t60\t20\t96.5\tGrand
5\t1\t1\t1\t1\t2\t80\t10\t60\t20\t93.5\tTotal
5\t1\t1\t1\t2\t1\t10\t40\t90\t20\t90\t11,800.00
5\t1\t1\t1\t2\t2\t110\t40\t10\t20\t-1\t
";

    #[test]
    fn test_parse_tsv_groups_lines() {
        let text = parse_tsv(TSV);
        assert_eq!(text.text, "Grand Total\n11,800.00");
        assert!((text.confidence - 0.9333333).abs() < 1e-4);
    }

    #[test]
    fn test_parse_tsv_header_only() {
        let text = parse_tsv("level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n");
        assert_eq!(text.text, "");
        assert_eq!(text.confidence, 0.0);
    }

    #[test]
    fn test_unreadable_image_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::write(&path, b"garbage").unwrap();

        let backend = TesseractBackend::new(&TesseractConfig::default());
        assert!(matches!(
            backend.recognize(&path),
            Err(OcrError::InvalidImage(_))
        ));
    }
}
