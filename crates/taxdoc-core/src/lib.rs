//! Core library for tax document ingestion.
//!
//! This crate provides:
//! - Document type detection from OCR text
//! - OCR engine backends (Azure, Google Vision, EasyOCR, Tesseract), a
//!   capability registry, complexity-based engine selection and a bounded
//!   worker pool
//! - PDF processing (embedded text, page images)
//! - Bank statement and invoice field extraction (dates, amounts, GSTIN,
//!   totals, tax) with confidence scores
//! - Keyword categorisation, transaction enhancement and backend reporting

pub mod detect;
pub mod enhance;
pub mod error;
pub mod invoice;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod statement;
pub mod validators;

pub use detect::detect_document_type;
pub use enhance::{EnhancedStatement, KeywordEnhancer, TransactionEnhancer};
pub use error::{Result, TaxdocError};
pub use invoice::InvoiceParser;
pub use models::config::{ConfigHandle, GatewayConfig};
pub use models::document::{
    BankStatementResult, Direction, DocumentType, InvoiceResult, LineItem, ParsedDocument,
    TransactionRecord,
};
pub use ocr::{Engine, MethodUsed, OcrMethod, OcrResult};
pub use pipeline::{DocumentHint, DocumentProcessor, ProcessedDocument};
pub use report::{BackendReporter, ProcessingReport};
pub use statement::StatementParser;
