//! Amount extraction for rupee-denominated documents.

use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;
use tracing::trace;

use super::patterns::{AMOUNT_DECIMAL, AMOUNT_INTEGER, AMOUNT_RS, AMOUNT_RUPEE};
use super::{ExtractionMatch, FieldExtractor, StepResult};
use crate::error::ExtractionError;

/// Amount extractor for a single statement or invoice line.
///
/// Patterns are tried in order (`₹`, `Rs.`, two-decimal, plain integer). Each
/// pattern contributes only its first match; a capture that does not parse
/// moves on to the next pattern.
pub struct AmountExtractor {
    field: &'static str,
}

impl AmountExtractor {
    pub fn new() -> Self {
        Self { field: "amount" }
    }

    /// Name reported in [`ExtractionError::MalformedNumber`].
    pub fn for_field(field: &'static str) -> Self {
        Self { field }
    }

    fn patterns() -> [&'static Regex; 4] {
        [&AMOUNT_RUPEE, &AMOUNT_RS, &AMOUNT_DECIMAL, &AMOUNT_INTEGER]
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> StepResult<Self::Output> {
        let mut fault = None;

        for pattern in Self::patterns() {
            let Some(caps) = pattern.captures(text) else {
                continue;
            };
            let (Some(full), Some(number)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            match parse_amount(number.as_str(), self.field) {
                Ok(value) => {
                    return Ok(Some(
                        ExtractionMatch::new(value)
                            .with_position(full.start(), full.end()),
                    ));
                }
                Err(e) => {
                    trace!("Skipping unparsable amount {:?}", number.as_str());
                    fault.get_or_insert(e);
                }
            }
        }

        match fault {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

/// Parse an amount with `,` thousands separators (e.g. `"1,250.50"`).
pub fn parse_amount(s: &str, field: &'static str) -> Result<Decimal, ExtractionError> {
    let cleaned: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    let cleaned = cleaned.strip_suffix('.').unwrap_or(&cleaned);

    if cleaned.is_empty() {
        return Err(ExtractionError::MalformedNumber {
            field,
            value: s.to_string(),
        });
    }

    Decimal::from_str(cleaned).map_err(|_| ExtractionError::MalformedNumber {
        field,
        value: s.to_string(),
    })
}
