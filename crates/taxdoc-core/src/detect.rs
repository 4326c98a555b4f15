//! Keyword based document type detection.

use tracing::debug;

use crate::models::document::DocumentType;

/// Keyword sets in priority order; the first set with a hit decides.
const TYPE_KEYWORDS: &[(DocumentType, &[&str])] = &[
    (
        DocumentType::BankStatement,
        &["statement", "account", "balance", "transaction", "bank"],
    ),
    (DocumentType::Invoice, &["invoice", "bill", "gstin", "tax invoice"]),
    (
        DocumentType::GstNotice,
        &["gst", "notice", "department", "compliance"],
    ),
];

/// Detect the document type from extracted text. Never fails.
pub fn detect_document_type(text: &str) -> DocumentType {
    let lower = text.to_lowercase();

    let detected = TYPE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(ty, _)| *ty)
        .unwrap_or(DocumentType::Other);

    debug!("Detected document type: {}", detected);
    detected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_each_type() {
        assert_eq!(
            detect_document_type("HDFC BANK\nStatement of Account"),
            DocumentType::BankStatement
        );
        assert_eq!(
            detect_document_type("TAX INVOICE\nInvoice No: INV-1"),
            DocumentType::Invoice
        );
        assert_eq!(
            detect_document_type("Show cause NOTICE issued under GST law"),
            DocumentType::GstNotice
        );
        assert_eq!(detect_document_type("Dear friend, hello"), DocumentType::Other);
        assert_eq!(detect_document_type(""), DocumentType::Other);
    }

    #[test]
    fn test_bank_keywords_take_priority() {
        // mentions both an invoice and an account
        let text = "Invoice payable to account 1234";
        assert_eq!(detect_document_type(text), DocumentType::BankStatement);
    }
}
