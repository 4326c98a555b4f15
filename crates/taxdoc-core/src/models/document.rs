//! Structured records produced from document text.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of document recognised from its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    BankStatement,
    Invoice,
    GstNotice,
    Other,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::BankStatement => "bank_statement",
            DocumentType::Invoice => "invoice",
            DocumentType::GstNotice => "gst_notice",
            DocumentType::Other => "other",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bank_statement" => Ok(DocumentType::BankStatement),
            "invoice" => Ok(DocumentType::Invoice),
            "gst_notice" => Ok(DocumentType::GstNotice),
            "other" => Ok(DocumentType::Other),
            other => Err(format!("unknown document type: {}", other)),
        }
    }
}

/// Money flow direction of a statement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Debit => "debit",
            Direction::Credit => "credit",
        }
    }
}

/// One transaction recognised on a bank statement line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Date exactly as it appeared in the line.
    pub date: Option<String>,

    /// Line text with date, amounts and Dr/Cr markers removed.
    pub description: String,

    #[serde(with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,

    pub direction: Direction,

    pub category: String,

    /// Heuristic reliability (0.0 - 1.0).
    pub confidence: f32,
}

impl TransactionRecord {
    /// Calendar date, when the raw date text is a real date.
    pub fn value_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(crate::rules::dates::parse_date)
    }
}

/// Statement totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementSummary {
    pub total_transactions: usize,

    #[serde(with = "rust_decimal::serde::float")]
    pub total_debits: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub total_credits: Decimal,

    /// Always `total_credits - total_debits`.
    #[serde(with = "rust_decimal::serde::float")]
    pub net_amount: Decimal,

    /// Earliest parsable transaction date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_start: Option<NaiveDate>,

    /// Latest parsable transaction date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_end: Option<NaiveDate>,
}

/// Parsed bank statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankStatementResult {
    pub transactions: Vec<TransactionRecord>,

    /// `account_number`, `bank_name`, `statement_period` when found.
    pub account_details: BTreeMap<String, String>,

    pub summary: StatementSummary,

    /// Share of transactions that carry an amount; 0 when there are none.
    pub parsing_confidence: f32,

    /// Internal faults that were downgraded to absent fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

/// A single invoice line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,

    pub quantity: u32,

    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// Fields extracted from a single invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceResult {
    pub invoice_number: Option<String>,

    pub date: Option<String>,

    pub vendor_name: Option<String>,

    pub vendor_gstin: Option<String>,

    /// Structural GSTIN check outcome; `None` when no GSTIN was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_gstin_valid: Option<bool>,

    #[serde(with = "rust_decimal::serde::float_option")]
    pub total_amount: Option<Decimal>,

    /// Sum of every GST/CGST/SGST/IGST amount found.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub tax_amount: Option<Decimal>,

    pub line_items: Vec<LineItem>,

    /// Found share of invoice number, date, vendor name and total.
    pub confidence: f32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl InvoiceResult {
    /// Confidence as the share of the four key fields that are present.
    pub fn completeness(&self) -> f32 {
        let found = [
            self.invoice_number.is_some(),
            self.date.is_some(),
            self.vendor_name.is_some(),
            self.total_amount.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count();

        found as f32 / 4.0
    }
}

/// Structured output of one of the document parsers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParsedDocument {
    BankStatement(BankStatementResult),
    Invoice(InvoiceResult),
}

impl ParsedDocument {
    pub fn confidence(&self) -> f32 {
        match self {
            ParsedDocument::BankStatement(s) => s.parsing_confidence,
            ParsedDocument::Invoice(i) => i.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_round_trip_names() {
        for ty in [
            DocumentType::BankStatement,
            DocumentType::Invoice,
            DocumentType::GstNotice,
            DocumentType::Other,
        ] {
            assert_eq!(ty.as_str().parse::<DocumentType>().unwrap(), ty);
        }
        assert!("receipt".parse::<DocumentType>().is_err());
    }

    #[test]
    fn test_transaction_serializes_as_numbers() {
        let record = TransactionRecord {
            date: Some("02/01/2024".to_string()),
            description: "ATM Withdrawal".to_string(),
            amount: Some(Decimal::new(200000, 2)),
            direction: Direction::Debit,
            category: "miscellaneous".to_string(),
            confidence: 0.8,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["amount"], serde_json::json!(2000.0));
        assert_eq!(json["direction"], "debit");
    }

    #[test]
    fn test_completeness_quarters() {
        let mut invoice = InvoiceResult::default();
        assert_eq!(invoice.completeness(), 0.0);

        invoice.invoice_number = Some("INV-1".to_string());
        assert_eq!(invoice.completeness(), 0.25);

        invoice.total_amount = Some(Decimal::ONE);
        invoice.date = Some("01/01/2024".to_string());
        invoice.vendor_name = Some("ABC Company".to_string());
        assert_eq!(invoice.completeness(), 1.0);
    }
}
