//! PDF intake: embedded text, page rasterisation and embedded page images.

mod extractor;
mod render;

pub use extractor::{PdfContent, PdfExtractor};
pub use render::{is_pdftoppm_available, page_image, rasterize_first_page, PageImage};

use crate::error::PdfError;

/// Type of PDF content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfType {
    /// Contains enough extractable text.
    Text,
    /// Contains only images (scanned document).
    Image,
    /// Contains both text and images.
    Hybrid,
    /// Empty or unreadable.
    Empty,
}

impl PdfType {
    /// Classify from the embedded text length and the image count.
    pub fn classify(text_len: usize, min_text_length: usize, images: usize) -> Self {
        match (text_len >= min_text_length && text_len > 0, images > 0) {
            (true, false) => PdfType::Text,
            (false, true) => PdfType::Image,
            (true, true) => PdfType::Hybrid,
            (false, false) => PdfType::Empty,
        }
    }

    /// Whether the embedded text can stand in for OCR.
    pub fn has_text(&self) -> bool {
        matches!(self, PdfType::Text | PdfType::Hybrid)
    }
}

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(PdfType::classify(120, 50, 0), PdfType::Text);
        assert_eq!(PdfType::classify(10, 50, 1), PdfType::Image);
        assert_eq!(PdfType::classify(50, 50, 2), PdfType::Hybrid);
        assert_eq!(PdfType::classify(0, 0, 0), PdfType::Empty);
        assert!(!PdfType::Image.has_text());
    }
}
