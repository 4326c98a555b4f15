//! Per-transaction annotation of parsed bank statements.
//!
//! The annotating service itself lives outside this crate; it plugs in through
//! [`TransactionEnhancer`]. A failing enhancer never fails the statement: the
//! transaction gets [`fallback_annotation`] instead.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::document::{BankStatementResult, TransactionRecord};
use crate::rules::category::{categorize, MISCELLANEOUS};

/// Annotation attached to one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub category: String,
    /// `income` or `expense`.
    pub transaction_type: String,
    pub confidence: f32,
    pub tags: Vec<String>,
    pub is_business_expense: bool,
    pub gst_applicable: bool,
    /// One of 0, 5, 12, 18, 28.
    pub suggested_gst_rate: u8,
}

/// Annotation used when the enhancer fails.
pub fn fallback_annotation() -> Annotation {
    Annotation {
        category: "Miscellaneous".to_string(),
        transaction_type: "expense".to_string(),
        confidence: 0.3,
        tags: vec!["uncategorized".to_string()],
        is_business_expense: false,
        gst_applicable: false,
        suggested_gst_rate: 0,
    }
}

#[derive(Error, Debug)]
pub enum EnhanceError {
    #[error("enhancer unavailable: {0}")]
    Unavailable(String),

    #[error("malformed annotation: {0}")]
    Malformed(String),
}

/// Annotates a transaction from its description and amount.
pub trait TransactionEnhancer: Send + Sync {
    fn annotate(&self, description: &str, amount: Decimal) -> Result<Annotation, EnhanceError>;
}

/// Offline enhancer built on the keyword categorizer.
///
/// `(category, GST rate, business expense)` per keyword category.
const KEYWORD_PROFILES: &[(&str, u8, bool)] = &[
    ("food", 5, false),
    ("fuel", 0, true),
    ("utilities", 18, true),
    ("transport", 5, true),
    ("shopping", 18, false),
    ("medical", 12, false),
    ("education", 0, false),
    ("entertainment", 18, false),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordEnhancer;

impl TransactionEnhancer for KeywordEnhancer {
    fn annotate(&self, description: &str, _amount: Decimal) -> Result<Annotation, EnhanceError> {
        let category = categorize(description);
        if category == MISCELLANEOUS {
            return Ok(fallback_annotation());
        }

        let Some(&(_, rate, business)) = KEYWORD_PROFILES.iter().find(|(c, _, _)| *c == category)
        else {
            return Err(EnhanceError::Malformed(format!("no profile for {}", category)));
        };

        Ok(Annotation {
            category: title_case(category),
            transaction_type: "expense".to_string(),
            confidence: 0.6,
            tags: vec![category.to_string()],
            is_business_expense: business,
            gst_applicable: rate > 0,
            suggested_gst_rate: rate,
        })
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A transaction with its annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedTransaction {
    #[serde(flatten)]
    pub transaction: TransactionRecord,
    pub ai_category: String,
    pub ai_confidence: f32,
    pub is_business_expense: bool,
    pub gst_applicable: bool,
    pub suggested_gst_rate: u8,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnhancementSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_business_expenses: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gst_applicable_amount: Decimal,
    /// Distinct categories, sorted.
    pub categories_found: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnhancedStatement {
    pub enhanced_transactions: Vec<EnhancedTransaction>,
    pub ai_summary: EnhancementSummary,
}

/// Annotate every transaction that has an amount.
pub fn enhance_statement(
    statement: &BankStatementResult,
    enhancer: &dyn TransactionEnhancer,
) -> EnhancedStatement {
    let mut enhanced_transactions = Vec::new();
    let mut summary = EnhancementSummary::default();
    let mut categories = BTreeSet::new();

    for transaction in &statement.transactions {
        let Some(amount) = transaction.amount else {
            continue;
        };

        let annotation = match enhancer.annotate(&transaction.description, amount) {
            Ok(annotation) => annotation,
            Err(e) => {
                warn!("Enhancer failed for {:?}: {}", transaction.description, e);
                fallback_annotation()
            }
        };

        if annotation.is_business_expense {
            accumulate(&mut summary.total_business_expenses, amount, "business expenses");
        }
        if annotation.gst_applicable {
            accumulate(&mut summary.gst_applicable_amount, amount, "GST applicable amount");
        }
        if !annotation.category.is_empty() {
            categories.insert(annotation.category.clone());
        }

        enhanced_transactions.push(EnhancedTransaction {
            transaction: transaction.clone(),
            ai_category: annotation.category,
            ai_confidence: annotation.confidence,
            is_business_expense: annotation.is_business_expense,
            gst_applicable: annotation.gst_applicable,
            suggested_gst_rate: annotation.suggested_gst_rate,
            tags: annotation.tags,
        });
    }

    summary.categories_found = categories.into_iter().collect();
    debug!(
        "Enhanced {} of {} transactions",
        enhanced_transactions.len(),
        statement.transactions.len()
    );

    EnhancedStatement {
        enhanced_transactions,
        ai_summary: summary,
    }
}

/// Add `amount` to `total`, leaving the total unchanged on overflow.
fn accumulate(total: &mut Decimal, amount: Decimal, label: &str) {
    match total.checked_add(amount) {
        Some(sum) => *total = sum,
        None => warn!("Skipping {} in {}: total overflowed", amount, label),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::document::Direction;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn record(description: &str, amount: Option<Decimal>) -> TransactionRecord {
        TransactionRecord {
            date: Some("01/01/2024".to_string()),
            description: description.to_string(),
            amount,
            direction: Direction::Debit,
            category: categorize(description).to_string(),
            confidence: 0.8,
        }
    }

    struct Failing;

    impl TransactionEnhancer for Failing {
        fn annotate(&self, _: &str, _: Decimal) -> Result<Annotation, EnhanceError> {
            Err(EnhanceError::Unavailable("offline".to_string()))
        }
    }

    #[test]
    fn test_failure_uses_fallback() {
        let statement = BankStatementResult {
            transactions: vec![record("Swiggy order", Some(dec("450.00")))],
            ..BankStatementResult::default()
        };

        let enhanced = enhance_statement(&statement, &Failing);
        let first = &enhanced.enhanced_transactions[0];
        assert_eq!(first.ai_category, "Miscellaneous");
        assert_eq!(first.ai_confidence, 0.3);
        assert_eq!(first.tags, vec!["uncategorized".to_string()]);
        assert_eq!(enhanced.ai_summary.total_business_expenses, Decimal::ZERO);
    }

    #[test]
    fn test_summary_aggregates() {
        let statement = BankStatementResult {
            transactions: vec![
                record("Petrol pump", Some(dec("2000.00"))),
                record("Electricity bill", Some(dec("1500.50"))),
                record("Netflix", Some(dec("649"))),
                record("No amount", None),
            ],
            ..BankStatementResult::default()
        };

        let enhanced = enhance_statement(&statement, &KeywordEnhancer);
        assert_eq!(enhanced.enhanced_transactions.len(), 3);
        assert_eq!(enhanced.ai_summary.total_business_expenses, dec("3500.50"));
        assert_eq!(enhanced.ai_summary.gst_applicable_amount, dec("2149.50"));
        assert_eq!(
            enhanced.ai_summary.categories_found,
            vec!["Entertainment", "Fuel", "Utilities"]
        );
    }

    #[test]
    fn test_summary_survives_overflow() {
        let huge = dec("50000000000000000000000000000");
        let statement = BankStatementResult {
            transactions: vec![
                record("Petrol pump", Some(huge)),
                record("Petrol pump", Some(huge)),
            ],
            ..BankStatementResult::default()
        };

        let enhanced = enhance_statement(&statement, &KeywordEnhancer);
        assert_eq!(enhanced.enhanced_transactions.len(), 2);
        assert_eq!(enhanced.ai_summary.total_business_expenses, huge);
    }

    #[test]
    fn test_enhanced_transaction_flattens_record() {
        let enhanced = enhance_statement(
            &BankStatementResult {
                transactions: vec![record("Uber trip", Some(dec("250")))],
                ..BankStatementResult::default()
            },
            &KeywordEnhancer,
        );

        let json = serde_json::to_value(&enhanced.enhanced_transactions[0]).unwrap();
        assert_eq!(json["description"], "Uber trip");
        assert_eq!(json["amount"], 250.0);
        assert_eq!(json["ai_category"], "Transport");
        assert_eq!(json["suggested_gst_rate"], 5);
    }
}
