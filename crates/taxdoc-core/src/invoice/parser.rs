//! Rule-based invoice field extraction.

use std::time::Instant;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::document::{InvoiceResult, LineItem};
use crate::rules::dates::first_date;
use crate::rules::patterns::{
    INVOICE_NUMBER_PATTERNS, LINE_ITEM, TAX_AMOUNT, TOTAL_PATTERNS, TOTAL_PLAIN, VENDOR_PATTERNS,
};
use crate::rules::{parse_amount, validate_gstin, AmountExtractor, FieldExtractor, GstinExtractor, StepResult};

/// Vendor names must be longer than this to be accepted.
const MIN_VENDOR_LEN: usize = 3;

/// GSTIN found on an invoice together with its structural check.
#[derive(Debug, Clone, PartialEq)]
struct CheckedGstin {
    value: String,
    valid: bool,
}

/// Invoice parser applying ordered pattern lists.
///
/// A missing field lowers the confidence; a malformed number is recorded in
/// `diagnostics` and the field is left unset.
pub struct InvoiceParser {
    /// Maximum number of line items kept.
    max_line_items: usize,
    /// Drop GSTINs that fail validation.
    strict_gstin: bool,
}

impl InvoiceParser {
    /// Create a new parser with default settings.
    pub fn new() -> Self {
        let defaults = ExtractionConfig::default();
        Self {
            max_line_items: defaults.max_line_items,
            strict_gstin: defaults.strict_gstin,
        }
    }

    /// Create a parser from the extraction section of the configuration.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new()
            .with_max_line_items(config.max_line_items)
            .with_strict_gstin(config.strict_gstin)
    }

    /// Set the line item cap.
    pub fn with_max_line_items(mut self, max: usize) -> Self {
        self.max_line_items = max;
        self
    }

    /// Set strict GSTIN validation.
    pub fn with_strict_gstin(mut self, strict: bool) -> Self {
        self.strict_gstin = strict;
        self
    }

    /// Parse invoice text. Never fails.
    pub fn parse(&self, text: &str) -> InvoiceResult {
        let start = Instant::now();
        let mut diagnostics = Vec::new();

        info!("Parsing invoice from {} characters of text", text.len());

        let invoice_number = settle(extract_invoice_number(text), &mut diagnostics);
        let date = first_date(text).map(|m| m.value);
        let vendor_name = settle(extract_vendor_name(text), &mut diagnostics);

        let gstin = settle(self.extract_gstin(text), &mut diagnostics);
        let vendor_gstin_valid = gstin.as_ref().map(|g| g.valid);
        let vendor_gstin = gstin.map(|g| g.value);

        let total_amount = settle(extract_total(text), &mut diagnostics);
        let tax_amount = extract_tax(text, &mut diagnostics);
        let line_items = self.extract_line_items(text);

        let mut invoice = InvoiceResult {
            invoice_number,
            date,
            vendor_name,
            vendor_gstin,
            vendor_gstin_valid,
            total_amount,
            tax_amount,
            line_items,
            confidence: 0.0,
            diagnostics,
        };
        invoice.confidence = invoice.completeness();

        debug!(
            "Extracted invoice {:?} with confidence {:.2} in {:?}",
            invoice.invoice_number,
            invoice.confidence,
            start.elapsed()
        );

        invoice
    }

    fn extract_gstin(&self, text: &str) -> StepResult<CheckedGstin> {
        let Some(found) = GstinExtractor::new().extract(text)? else {
            return Ok(None);
        };

        let valid = validate_gstin(&found.value);
        if !valid {
            if self.strict_gstin {
                warn!("Dropping invalid GSTIN {}", found.value);
                return Ok(None);
            }
            debug!("GSTIN {} failed validation", found.value);
        }

        Ok(Some(CheckedGstin {
            value: found.value,
            valid,
        }))
    }

    fn extract_line_items(&self, text: &str) -> Vec<LineItem> {
        let amounts = AmountExtractor::for_field("line_item");

        text.lines()
            .filter(|line| LINE_ITEM.is_match(line))
            .take(self.max_line_items)
            .map(|line| LineItem {
                description: line.trim().to_string(),
                quantity: 1,
                amount: amounts
                    .extract(line)
                    .ok()
                    .flatten()
                    .map(|m| m.value)
                    .unwrap_or(Decimal::ZERO),
            })
            .collect()
    }
}

impl Default for InvoiceParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Downgrade a step fault to an absent field.
fn settle<T>(step: StepResult<T>, diagnostics: &mut Vec<String>) -> Option<T> {
    match step {
        Ok(value) => value,
        Err(e) => {
            warn!("{}", e);
            diagnostics.push(e.to_string());
            None
        }
    }
}

/// First invoice number among the `invoice`, `inv` and `bill` labels.
pub fn extract_invoice_number(text: &str) -> StepResult<String> {
    Ok(INVOICE_NUMBER_PATTERNS
        .iter()
        .find_map(|p| p.captures(text))
        .map(|caps| caps[1].trim().to_string()))
}

/// First labelled vendor name longer than three characters.
pub fn extract_vendor_name(text: &str) -> StepResult<String> {
    for pattern in VENDOR_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            let name = caps[1].trim().trim_end_matches([',', '.', '-']).trim();
            if name.chars().count() > MIN_VENDOR_LEN {
                return Ok(Some(name.to_string()));
            }
        }
    }
    Ok(None)
}

/// First total among the labelled total patterns; sub totals are skipped.
pub fn extract_total(text: &str) -> StepResult<Decimal> {
    for pattern in TOTAL_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            return parse_amount(&caps[1], "total_amount").map(Some);
        }
    }

    for caps in TOTAL_PLAIN.captures_iter(text) {
        if caps.get(1).is_some() {
            continue;
        }
        return parse_amount(&caps[2], "total_amount").map(Some);
    }

    Ok(None)
}

/// Sum of every GST/CGST/SGST/IGST/tax amount in the text.
///
/// A capture that does not parse, or would overflow the sum, is skipped and
/// recorded in `diagnostics`.
pub fn extract_tax(text: &str, diagnostics: &mut Vec<String>) -> Option<Decimal> {
    let mut total: Option<Decimal> = None;

    for caps in TAX_AMOUNT.captures_iter(text) {
        let step = parse_amount(&caps[1], "tax_amount").and_then(|amount| {
            total
                .unwrap_or(Decimal::ZERO)
                .checked_add(amount)
                .ok_or_else(|| ExtractionError::SumOverflow {
                    field: "tax_amount",
                    value: amount.to_string(),
                })
        });

        match step {
            Ok(sum) => total = Some(sum),
            Err(e) => {
                warn!("{}", e);
                diagnostics.push(e.to_string());
            }
        }
    }

    total
}
