//! Date extraction for statements and invoices.
//!
//! Dates are reported exactly as written. [`parse_date`] turns the raw text
//! into a calendar date where one is needed (statement periods).

use chrono::NaiveDate;
use regex::Regex;

use super::patterns::{DATE_DAY_MONTH, DATE_DMY, DATE_YMD};
use super::{ExtractionMatch, FieldExtractor, StepResult};

/// Date field extractor.
///
/// Patterns are tried in a fixed order (`D/M/Y`, `D Mon Y`, `Y-M-D`); the
/// first pattern that matches anywhere wins.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }

    fn patterns() -> [&'static Regex; 3] {
        [&DATE_DMY, &DATE_DAY_MONTH, &DATE_YMD]
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> StepResult<Self::Output> {
        for pattern in Self::patterns() {
            if let Some(m) = pattern.find(text) {
                return Ok(Some(
                    ExtractionMatch::new(m.as_str().to_string())
                        .with_position(m.start(), m.end()),
                ));
            }
        }
        Ok(None)
    }
}

/// First date substring in `text`, as written.
pub fn first_date(text: &str) -> Option<ExtractionMatch<String>> {
    DateExtractor::new().extract(text).ok().flatten()
}

/// Interpret a date substring as a calendar date.
///
/// Day-first for `D/M/Y`; two-digit years map to 2000-2050 and 1951-1999.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Some(caps) = DATE_DMY.captures(raw) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year = parse_year(&caps[3])?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = DATE_DAY_MONTH.captures(raw) {
        let day: u32 = caps[1].parse().ok()?;
        let month = month_to_number(&caps[2])?;
        let year = parse_year(&caps[3])?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = DATE_YMD.captures(raw) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    if year < 100 {
        if year <= 50 {
            Some(2000 + year)
        } else {
            Some(1900 + year)
        }
    } else {
        Some(year)
    }
}

fn month_to_number(month: &str) -> Option<u32> {
    let prefix: String = month.chars().take(3).collect::<String>().to_lowercase();
    let number = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(text: &str) -> Option<String> {
        first_date(text).map(|m| m.value)
    }

    #[test]
    fn test_dmy_substring_is_returned_verbatim() {
        assert_eq!(
            found("02/01/2024  ATM Withdrawal Dr  2000.00"),
            Some("02/01/2024".to_string())
        );
        assert_eq!(found("paid on 5-3-24 via UPI"), Some("5-3-24".to_string()));
    }

    #[test]
    fn test_ymd_substring_is_returned_verbatim() {
        assert_eq!(found("NEFT 2024-01-15 salary"), Some("2024-01-15".to_string()));
        assert_eq!(found("value 2024/1/5"), Some("2024/1/5".to_string()));
    }

    #[test]
    fn test_month_name_forms() {
        assert_eq!(found("1st Jan 2024 opening"), Some("1st Jan 2024".to_string()));
        assert_eq!(found("15 March 2024"), Some("15 March 2024".to_string()));
    }

    #[test]
    fn test_pattern_order_wins_over_position() {
        let m = first_date("2024-01-15 then 16/01/2024").unwrap();
        assert_eq!(m.value, "16/01/2024");
        assert_eq!(m.position, Some((16, 26)));
    }

    #[test]
    fn test_no_date() {
        assert_eq!(found("Opening balance 10,000.00"), None);
    }

    #[test]
    fn test_parse_date() {
        let jan_15 = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(parse_date("15/01/2024"), jan_15);
        assert_eq!(parse_date("15-01-24"), jan_15);
        assert_eq!(parse_date("15th Jan 2024"), jan_15);
        assert_eq!(parse_date("2024-01-15"), jan_15);
        assert_eq!(parse_date("31/02/2024"), None);
        assert_eq!(parse_date("not a date"), None);
    }
}
