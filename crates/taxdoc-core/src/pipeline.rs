//! End-to-end processing of one uploaded document.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::detect::detect_document_type;
use crate::enhance::{enhance_statement, EnhancedStatement, TransactionEnhancer};
use crate::error::{PdfError, Result};
use crate::invoice::InvoiceParser;
use crate::models::config::{GatewayConfig, PdfConfig};
use crate::models::document::{DocumentType, ParsedDocument};
use crate::ocr::{EngineRegistry, MethodUsed, OcrMethod, OcrPool, OcrResult, OcrService};
use crate::pdf::{page_image, PageImage, PdfExtractor};
use crate::statement::StatementParser;
use crate::validators::{sanitize_filename, validate_upload};

/// Document type supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentHint {
    /// Detect the type from the text.
    #[default]
    Auto,
    Known(DocumentType),
}

impl FromStr for DocumentHint {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(DocumentHint::Auto);
        }
        s.parse::<DocumentType>().map(DocumentHint::Known)
    }
}

impl fmt::Display for DocumentHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentHint::Auto => f.write_str("auto"),
            DocumentHint::Known(ty) => write!(f, "{}", ty),
        }
    }
}

/// Type and structured data derived from document text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub document_type: DocumentType,
    pub processed_data: Option<ParsedDocument>,
    pub enhanced_data: Option<EnhancedStatement>,
}

/// Everything produced for one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub file_name: String,
    pub ocr_result: OcrResult,
    #[serde(flatten)]
    pub analysis: DocumentAnalysis,
}

/// Text obtained from a PDF before any OCR.
enum PdfIntake {
    Text(String),
    Image(PageImage),
}

/// Validation, text extraction, type detection, parsing and enhancement.
pub struct DocumentProcessor {
    config: Arc<GatewayConfig>,
    pool: OcrPool,
    statements: StatementParser,
    invoices: InvoiceParser,
    enhancer: Option<Arc<dyn TransactionEnhancer>>,
}

impl DocumentProcessor {
    pub fn new(config: Arc<GatewayConfig>, pool: OcrPool) -> Self {
        Self {
            statements: StatementParser::from_config(&config.extraction),
            invoices: InvoiceParser::from_config(&config.extraction),
            config,
            pool,
            enhancer: None,
        }
    }

    /// Probe the OCR engines and size the worker pool from configuration.
    pub fn from_config(config: Arc<GatewayConfig>) -> Self {
        let service = Arc::new(OcrService::from_config(&config.ocr));
        let pool = OcrPool::new(service, config.ocr.worker_threads);
        Self::new(config, pool)
    }

    /// Processor for plain text only; file processing finds no OCR engine.
    pub fn without_ocr(config: Arc<GatewayConfig>) -> Self {
        let service = Arc::new(OcrService::new(Arc::new(EngineRegistry::empty())));
        Self::new(config, OcrPool::new(service, 1))
    }

    /// Annotate bank-statement transactions with `enhancer`.
    pub fn with_enhancer(mut self, enhancer: Arc<dyn TransactionEnhancer>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn ocr(&self) -> &OcrPool {
        &self.pool
    }

    /// Process an uploaded file.
    ///
    /// Only upload validation fails the call; text extraction problems end up
    /// as a zero-confidence OCR result.
    pub async fn process_file(
        &self,
        path: &Path,
        hint: DocumentHint,
        method: OcrMethod,
    ) -> Result<ProcessedDocument> {
        let start = Instant::now();
        validate_upload(path, &self.config.files)?;

        let file_name = path
            .file_name()
            .map(|n| sanitize_filename(&n.to_string_lossy()))
            .unwrap_or_else(|| "upload".to_string());
        info!("Processing {}", file_name);

        let ocr_result = self.read_text(path, method).await;

        let analysis = if ocr_result.has_text() {
            self.process_text(&ocr_result.extracted_text, hint)
        } else {
            warn!("No text recovered from {}", file_name);
            DocumentAnalysis {
                document_type: match hint {
                    DocumentHint::Known(ty) => ty,
                    DocumentHint::Auto => DocumentType::Other,
                },
                processed_data: None,
                enhanced_data: None,
            }
        };

        info!(
            "Processed {} as {} via {} in {:.2}s",
            file_name,
            analysis.document_type,
            ocr_result.method_used,
            start.elapsed().as_secs_f64()
        );

        Ok(ProcessedDocument {
            file_name,
            ocr_result,
            analysis,
        })
    }

    /// Detect, parse and enhance plain text.
    pub fn process_text(&self, text: &str, hint: DocumentHint) -> DocumentAnalysis {
        let document_type = match hint {
            DocumentHint::Known(ty) => ty,
            DocumentHint::Auto => detect_document_type(text),
        };

        let processed_data = match document_type {
            DocumentType::BankStatement => {
                Some(ParsedDocument::BankStatement(self.statements.parse(text)))
            }
            DocumentType::Invoice => Some(ParsedDocument::Invoice(self.invoices.parse(text))),
            DocumentType::GstNotice | DocumentType::Other => None,
        };

        let enhanced_data = match (&processed_data, self.enhancer.as_deref()) {
            (Some(ParsedDocument::BankStatement(statement)), Some(enhancer)) => {
                Some(enhance_statement(statement, enhancer))
            }
            _ => None,
        };

        DocumentAnalysis {
            document_type,
            processed_data,
            enhanced_data,
        }
    }

    async fn read_text(&self, path: &Path, method: OcrMethod) -> OcrResult {
        let is_pdf = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if !is_pdf {
            return self.pool.extract_text(path.to_path_buf(), method).await;
        }

        let start = Instant::now();
        let pdf_path = path.to_path_buf();
        let pdf_config = self.config.pdf.clone();
        let intake = tokio::task::spawn_blocking(move || pdf_intake(&pdf_path, &pdf_config)).await;

        match intake {
            Ok(Ok(PdfIntake::Text(text))) => OcrResult::embedded_text(text, start.elapsed()),
            Ok(Ok(PdfIntake::Image(page))) => {
                // `page` owns the temporary image until OCR has finished
                let result = self.pool.extract_text(page.path().to_path_buf(), method).await;
                drop(page);
                result
            }
            Ok(Err(e)) => {
                warn!("PDF intake failed: {}", e);
                OcrResult::failed(MethodUsed::None, e, start.elapsed())
            }
            Err(e) => OcrResult::failed(MethodUsed::None, e, start.elapsed()),
        }
    }
}

fn pdf_intake(path: &Path, config: &PdfConfig) -> std::result::Result<PdfIntake, PdfError> {
    let pdf = PdfExtractor::open(path)?;

    if config.prefer_embedded_text {
        let content = pdf.analyze(config.min_text_length);
        if content.pdf_type.has_text() {
            debug!("Using {} characters of embedded text", content.text.len());
            return Ok(PdfIntake::Text(content.text));
        }
    }

    page_image(path, &pdf, config).map(PdfIntake::Image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhance::KeywordEnhancer;

    fn processor() -> DocumentProcessor {
        DocumentProcessor::without_ocr(Arc::new(GatewayConfig::default()))
    }

    const STATEMENT: &str = "HDFC Bank\nAccount No: 50100123456789\n\
        01/01/2024  Salary credit  50000.00\n\
        02/01/2024  Petrol pump Dr  2000.00\n";

    #[test]
    fn test_hint_parse() {
        assert_eq!("auto".parse::<DocumentHint>().unwrap(), DocumentHint::Auto);
        assert_eq!(
            "invoice".parse::<DocumentHint>().unwrap(),
            DocumentHint::Known(DocumentType::Invoice)
        );
        assert!("receipt".parse::<DocumentHint>().is_err());
    }

    #[test]
    fn test_process_text_detects_statement() {
        let analysis = processor().process_text(STATEMENT, DocumentHint::Auto);
        assert_eq!(analysis.document_type, DocumentType::BankStatement);
        match analysis.processed_data {
            Some(ParsedDocument::BankStatement(statement)) => {
                assert_eq!(statement.transactions.len(), 2)
            }
            other => panic!("unexpected data: {:?}", other),
        }
        assert!(analysis.enhanced_data.is_none());
    }

    #[test]
    fn test_hint_overrides_detection() {
        let analysis = processor().process_text(STATEMENT, DocumentHint::Known(DocumentType::Other));
        assert_eq!(analysis.document_type, DocumentType::Other);
        assert!(analysis.processed_data.is_none());
    }

    #[test]
    fn test_enhancer_runs_on_statements() {
        let processor = processor().with_enhancer(Arc::new(KeywordEnhancer));
        let analysis = processor.process_text(STATEMENT, DocumentHint::Auto);
        let enhanced = analysis.enhanced_data.unwrap();
        assert_eq!(enhanced.enhanced_transactions.len(), 2);
        assert!(enhanced.ai_summary.categories_found.contains(&"Fuel".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_upload_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Invoice No: 1").unwrap();

        let result = processor()
            .process_file(&path, DocumentHint::Auto, OcrMethod::Auto)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_no_engines_yields_unavailable_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        image::GrayImage::from_pixel(4, 4, image::Luma([255]))
            .save(&path)
            .unwrap();

        let document = processor()
            .process_file(&path, DocumentHint::Auto, OcrMethod::Auto)
            .await
            .unwrap();
        assert_eq!(document.file_name, "scan.png");
        assert_eq!(document.ocr_result.method_used, MethodUsed::None);
        assert_eq!(document.analysis.document_type, DocumentType::Other);
        assert!(document.analysis.processed_data.is_none());
    }

    #[test]
    fn test_processed_document_json_shape() {
        let document = ProcessedDocument {
            file_name: "bill.png".to_string(),
            ocr_result: OcrResult::unavailable(),
            analysis: processor().process_text("", DocumentHint::Known(DocumentType::GstNotice)),
        };
        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(json["document_type"], "gst_notice");
        assert!(json["processed_data"].is_null());
        assert_eq!(json["ocr_result"]["method_used"], "none");
    }
}
