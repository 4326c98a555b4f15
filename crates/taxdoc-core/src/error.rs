//! Error types for the taxdoc-core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::ocr::Engine;

/// Main error type for the taxdoc library.
#[derive(Error, Debug)]
pub enum TaxdocError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The uploaded file was rejected before processing.
    #[error("invalid upload {path}: {reason}")]
    InvalidUpload { path: PathBuf, reason: String },

    /// Forwarding results to the backend failed.
    #[error("report error: {0}")]
    Report(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to produce a page image.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors raised by OCR engine backends.
///
/// These never reach callers of [`crate::ocr::OcrService`]; the selector turns
/// them into fallbacks or a zero-confidence result.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The engine is not part of the capability snapshot.
    #[error("{0} is not available")]
    Unavailable(Engine),

    /// The engine's HTTP API failed.
    #[error("{engine} request failed: {message}")]
    Http { engine: Engine, message: String },

    /// The engine's API answered with an error payload.
    #[error("{engine} API error: {message}")]
    Api { engine: Engine, message: String },

    /// A command-line engine could not be run or exited unsuccessfully.
    #[error("{engine} process failed: {message}")]
    Process { engine: Engine, message: String },

    /// The engine did not finish within its polling budget.
    #[error("{engine} timed out after {attempts} polls")]
    Timeout { engine: Engine, attempts: u32 },

    /// The input image could not be read or preprocessed.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// I/O error while preparing engine input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Internal faults raised by a single extraction step.
///
/// A pattern that simply finds nothing is not an error; it yields `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// A captured amount could not be parsed as a number.
    #[error("malformed number for {field}: {value:?}")]
    MalformedNumber { field: &'static str, value: String },

    /// Adding an amount to a running total exceeded the decimal range.
    #[error("sum of {field} overflowed at {value}")]
    SumOverflow { field: &'static str, value: String },
}

/// Result type for the taxdoc library.
pub type Result<T> = std::result::Result<T, TaxdocError>;
