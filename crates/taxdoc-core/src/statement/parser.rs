//! Bank statement assembly from OCR text.

use std::collections::BTreeMap;
use std::time::Instant;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::document::{BankStatementResult, Direction, StatementSummary, TransactionRecord};
use crate::rules::patterns::{ACCOUNT_NUMBER, BANK_GENERIC, BANK_KNOWN, STATEMENT_PERIOD};

use super::line::parse_transaction_line;

/// Bank statement parser.
///
/// Never fails: the worst case is an empty transaction list with confidence 0.
pub struct StatementParser {
    /// Lines shorter than this (after trimming) are skipped.
    min_line_length: usize,
}

impl StatementParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self {
            min_line_length: ExtractionConfig::default().min_line_length,
        }
    }

    /// Create a parser from the extraction section of the configuration.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new().with_min_line_length(config.min_line_length)
    }

    /// Set the minimum line length.
    pub fn with_min_line_length(mut self, length: usize) -> Self {
        self.min_line_length = length;
        self
    }

    /// Parse statement text.
    pub fn parse(&self, text: &str) -> BankStatementResult {
        let start = Instant::now();
        let mut diagnostics = Vec::new();

        info!("Parsing bank statement from {} characters of text", text.len());

        let account_details = extract_account_details(text);

        let mut transactions = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.chars().count() < self.min_line_length {
                continue;
            }

            match parse_transaction_line(line) {
                Ok(Some(record)) => transactions.push(record),
                Ok(None) => {}
                Err(e) => {
                    warn!("Line {}: {}", index + 1, e);
                    diagnostics.push(format!("line {}: {}", index + 1, e));
                }
            }
        }

        let summary = summarize(&transactions, &mut diagnostics);
        let parsing_confidence = parsing_confidence(&transactions);

        debug!(
            "Parsed {} transactions in {:?} (confidence {:.2})",
            transactions.len(),
            start.elapsed(),
            parsing_confidence
        );

        BankStatementResult {
            transactions,
            account_details,
            summary,
            parsing_confidence,
            diagnostics,
        }
    }
}

impl Default for StatementParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Account number, bank name and statement period, where present.
pub fn extract_account_details(text: &str) -> BTreeMap<String, String> {
    let mut details = BTreeMap::new();

    if let Some(caps) = ACCOUNT_NUMBER.captures(text) {
        details.insert("account_number".to_string(), caps[1].to_string());
    }

    let bank = BANK_KNOWN
        .captures(text)
        .map(|c| c[1].to_uppercase())
        .or_else(|| BANK_GENERIC.captures(text).map(|c| c[1].trim().to_string()));
    if let Some(bank) = bank {
        details.insert("bank_name".to_string(), bank);
    }

    if let Some(caps) = STATEMENT_PERIOD.captures(text) {
        let period = caps[1].trim();
        if !period.is_empty() {
            details.insert("statement_period".to_string(), period.to_string());
        }
    }

    details
}

/// Debit/credit totals and the covered date range.
///
/// An amount that would overflow its running total is left out of it and
/// reported in `diagnostics`.
pub fn summarize(transactions: &[TransactionRecord], diagnostics: &mut Vec<String>) -> StatementSummary {
    let mut total_debits = Decimal::ZERO;
    let mut total_credits = Decimal::ZERO;

    for record in transactions {
        let amount = record.amount.unwrap_or_default();
        let (total, field) = match record.direction {
            Direction::Debit => (&mut total_debits, "total_debits"),
            Direction::Credit => (&mut total_credits, "total_credits"),
        };
        match total.checked_add(amount) {
            Some(sum) => *total = sum,
            None => {
                let e = ExtractionError::SumOverflow {
                    field,
                    value: amount.to_string(),
                };
                warn!("{}", e);
                diagnostics.push(e.to_string());
            }
        }
    }

    let dates: Vec<_> = transactions.iter().filter_map(|t| t.value_date()).collect();

    StatementSummary {
        total_transactions: transactions.len(),
        total_debits,
        total_credits,
        net_amount: total_credits - total_debits,
        period_start: dates.iter().min().copied(),
        period_end: dates.iter().max().copied(),
    }
}

/// Share of transactions with an amount; 0 for an empty list.
pub fn parsing_confidence(transactions: &[TransactionRecord]) -> f32 {
    if transactions.is_empty() {
        return 0.0;
    }
    let with_amount = transactions.iter().filter(|t| t.amount.is_some()).count();
    with_amount as f32 / transactions.len() as f32
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;

    const STATEMENT: &str = r#"
        HDFC BANK
        Statement of Account
        Account No: 50100123456789
        Statement Period: 01/01/2024 to 31/01/2024

        Date        Narration                    Amount
        01/01/2024  Opening Balance              10,000.00
        02/01/2024  ATM Withdrawal Dr  2000.00
        05/01/2024  Salary Credit Cr  50,000.00
        10/01/2024  Swiggy order paid  450.50
        Closing
    "#;

    #[test]
    fn test_parse_statement() {
        let result = StatementParser::new().parse(STATEMENT);

        assert_eq!(result.account_details["account_number"], "50100123456789");
        assert_eq!(result.account_details["bank_name"], "HDFC");
        assert_eq!(
            result.account_details["statement_period"],
            "01/01/2024 to 31/01/2024"
        );

        // the period line carries dates but no amount
        assert_eq!(result.transactions.len(), 4);
        assert_eq!(result.transactions[1].description, "ATM Withdrawal");
        assert_eq!(result.transactions[3].category, "food");

        let summary = &result.summary;
        assert_eq!(summary.total_transactions, 4);
        assert_eq!(summary.total_debits, Decimal::new(245050, 2));
        assert_eq!(summary.total_credits, Decimal::new(6000000, 2));
        assert_eq!(summary.net_amount, summary.total_credits - summary.total_debits);
        assert_eq!(summary.period_start, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(summary.period_end, NaiveDate::from_ymd_opt(2024, 1, 10));
        assert_eq!(result.parsing_confidence, 1.0);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_overflowing_totals_are_reported() {
        let huge = "01/01/2024 Ref credit 50000000000000000000000000000";
        let text = format!("{}\n{}\n05/01/2024 Interest credit 10", huge, huge);

        let result = StatementParser::new().parse(&text);

        assert_eq!(result.transactions.len(), 3);
        assert_eq!(
            result.summary.total_credits,
            "50000000000000000000000000010".parse::<Decimal>().unwrap()
        );
        assert_eq!(result.summary.total_debits, Decimal::ZERO);
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.diagnostics[0].contains("total_credits"));
    }

    #[test]
    fn test_empty_statement_has_zero_confidence() {
        let result = StatementParser::new().parse("");
        assert!(result.transactions.is_empty());
        assert_eq!(result.parsing_confidence, 0.0);
        assert_eq!(result.summary.net_amount, Decimal::ZERO);
        assert!(result.account_details.is_empty());
    }

    #[test]
    fn test_short_lines_are_skipped() {
        let parser = StatementParser::new().with_min_line_length(40);
        let result = parser.parse("02/01/2024 ATM Dr 2000.00");
        assert!(result.transactions.is_empty());
    }

    #[test]
    fn test_generic_bank_name() {
        let details = extract_account_details("Punjab National Bank\nBranch: Delhi");
        assert_eq!(details["bank_name"], "Punjab National Bank");

        let details = extract_account_details("A/C No. XXXX1234");
        assert_eq!(details["account_number"], "XXXX1234");
    }

    #[test]
    fn test_confidence_counts_amounts() {
        let record = |amount| TransactionRecord {
            date: None,
            description: String::new(),
            amount,
            direction: Direction::Credit,
            category: "miscellaneous".to_string(),
            confidence: 0.8,
        };
        let records = vec![record(Some(Decimal::ONE)), record(None)];
        assert_eq!(parsing_confidence(&records), 0.5);
    }
}
