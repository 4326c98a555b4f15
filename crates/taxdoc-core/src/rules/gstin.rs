//! GSTIN (Indian GST identification number) extraction and validation.
//!
//! Layout: 2-digit state code, 10-character PAN, entity number, `Z`, and a
//! mod-36 check character.

use super::patterns::{GSTIN_FORMAT, GSTIN_LABELLED};
use super::{ExtractionMatch, FieldExtractor, StepResult};

const CHARSET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// GSTIN field extractor.
///
/// Only a token that follows a `GSTIN` label is taken; no structural check is
/// applied here.
pub struct GstinExtractor;

impl GstinExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GstinExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for GstinExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> StepResult<Self::Output> {
        let Some(caps) = GSTIN_LABELLED.captures(text) else {
            return Ok(None);
        };
        let Some(value) = caps.get(1) else {
            return Ok(None);
        };

        Ok(Some(
            ExtractionMatch::new(value.as_str().to_uppercase())
                .with_position(value.start(), value.end()),
        ))
    }
}

/// Validate GSTIN format, state code and check character.
pub fn validate_gstin(gstin: &str) -> bool {
    let gstin = gstin.trim().to_uppercase();

    if !GSTIN_FORMAT.is_match(&gstin) {
        return false;
    }

    let state: u32 = match gstin[..2].parse() {
        Ok(s) => s,
        Err(_) => return false,
    };
    if !(1..=38).contains(&state) && state != 97 && state != 99 {
        return false;
    }

    let bytes = gstin.as_bytes();
    match check_char(&bytes[..14]) {
        Some(expected) => expected == bytes[14],
        None => false,
    }
}

/// Compute the check character for the first 14 GSTIN characters.
fn check_char(body: &[u8]) -> Option<u8> {
    let mut sum = 0u32;

    for (i, c) in body.iter().enumerate() {
        let value = CHARSET.iter().position(|x| x == c)? as u32;
        let factor = if i % 2 == 0 { 1 } else { 2 };
        let product = value * factor;
        sum += product / 36 + product % 36;
    }

    let check = (36 - sum % 36) % 36;
    Some(CHARSET[check as usize])
}
