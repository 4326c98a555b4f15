//! Single statement line to transaction record.

use regex::Captures;
use tracing::trace;

use crate::models::document::{Direction, TransactionRecord};
use crate::rules::patterns::{
    AMOUNT_SHAPED, DATE_DAY_MONTH, DATE_DMY, DATE_YMD, DEBIT_CREDIT_MARKER,
};
use crate::rules::{categorize, AmountExtractor, DateExtractor, FieldExtractor, StepResult};

/// Confidence for a line with a date, an amount and a description.
pub const LINE_CONFIDENCE: f32 = 0.8;

/// Confidence for a line whose description is empty after cleaning.
pub const BARE_LINE_CONFIDENCE: f32 = 0.5;

const DEBIT_KEYWORDS: &[&str] = &["dr", "debit", "withdrawal", "paid"];

/// Parse one trimmed statement line.
///
/// Returns `Ok(None)` when the line has no date or no amount. The amount is
/// searched with every date blanked out so day/month digits are never taken
/// as the amount.
pub fn parse_transaction_line(line: &str) -> StepResult<TransactionRecord> {
    let Some(date) = DateExtractor::new().extract(line)? else {
        return Ok(None);
    };

    let masked = mask_dates(line);
    let Some(amount) = AmountExtractor::new().extract(&masked)? else {
        trace!("Dated line without amount: {:?}", line);
        return Ok(None);
    };

    let description = clean_description(&masked);
    let confidence = if description.is_empty() {
        BARE_LINE_CONFIDENCE
    } else {
        LINE_CONFIDENCE
    };

    Ok(Some(TransactionRecord {
        date: Some(date.value),
        category: categorize(&description).to_string(),
        description,
        amount: Some(amount.value),
        direction: classify_direction(line),
        confidence,
    }))
}

/// Replace every date-shaped substring with spaces of the same length.
fn mask_dates(line: &str) -> String {
    let blank = |caps: &Captures| " ".repeat(caps[0].len());

    let mut masked = line.to_string();
    for pattern in [&*DATE_DMY, &*DATE_DAY_MONTH, &*DATE_YMD] {
        masked = pattern.replace_all(&masked, blank).into_owned();
    }
    masked
}

/// `Debit` when any debit keyword occurs anywhere in the line.
pub fn classify_direction(line: &str) -> Direction {
    let lower = line.to_lowercase();
    if DEBIT_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Direction::Debit
    } else {
        Direction::Credit
    }
}

/// Remove amount-shaped text and Dr/Cr markers, then collapse whitespace.
pub fn clean_description(text: &str) -> String {
    let without_amounts = AMOUNT_SHAPED.replace_all(text, " ");
    let without_markers = DEBIT_CREDIT_MARKER.replace_all(&without_amounts, " ");
    without_markers.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_atm_withdrawal_line() {
        let record = parse_transaction_line("02/01/2024  ATM Withdrawal Dr  2000.00")
            .unwrap()
            .unwrap();

        assert_eq!(
            record,
            TransactionRecord {
                date: Some("02/01/2024".to_string()),
                description: "ATM Withdrawal".to_string(),
                amount: Some(Decimal::new(200000, 2)),
                direction: Direction::Debit,
                category: "miscellaneous".to_string(),
                confidence: 0.8,
            }
        );
    }

    #[test]
    fn test_credit_line_with_thousands() {
        let record = parse_transaction_line("15/01/2024 Salary from Acme Cr 1,250.50")
            .unwrap()
            .unwrap();

        assert_eq!(record.amount, Some(Decimal::new(125050, 2)));
        assert_eq!(record.direction, Direction::Credit);
        assert_eq!(record.description, "Salary from Acme");
    }

    #[test]
    fn test_date_digits_are_not_the_amount() {
        let record = parse_transaction_line("03/02/2024 Swiggy order 450")
            .unwrap()
            .unwrap();

        assert_eq!(record.amount, Some(Decimal::from(450)));
        assert_eq!(record.category, "food");
    }

    #[test]
    fn test_rupee_prefixed_amount() {
        let record = parse_transaction_line("5 Mar 2024 HP petrol paid ₹ 3,000")
            .unwrap()
            .unwrap();

        assert_eq!(record.date.as_deref(), Some("5 Mar 2024"));
        assert_eq!(record.amount, Some(Decimal::from(3000)));
        assert_eq!(record.direction, Direction::Debit);
        assert_eq!(record.description, "HP petrol paid");
        assert_eq!(record.category, "fuel");
    }

    #[test]
    fn test_line_without_date_or_amount() {
        assert_eq!(parse_transaction_line("Opening Balance 10,000.00").unwrap(), None);
        assert_eq!(parse_transaction_line("01/01/2024 Opening").unwrap(), None);
    }

    #[test]
    fn test_second_date_is_not_the_amount() {
        assert_eq!(
            parse_transaction_line("Period: 01/01/2024 to 31/01/2024").unwrap(),
            None
        );
    }

    #[test]
    fn test_empty_description_lowers_confidence() {
        let record = parse_transaction_line("01/01/2024 Dr 500.00").unwrap().unwrap();
        assert_eq!(record.description, "");
        assert_eq!(record.confidence, BARE_LINE_CONFIDENCE);
    }

    #[test]
    fn test_clean_description() {
        assert_eq!(clean_description("  UPI Rs. 1,200.00 Zomato  Cr. "), "UPI Zomato");
        assert_eq!(clean_description("NEFT123 ref 99"), "NEFT123 ref");
    }
}
