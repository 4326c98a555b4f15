//! Rule-based field extractors for Indian financial documents.

pub mod amounts;
pub mod category;
pub mod dates;
pub mod gstin;
pub mod patterns;

pub use amounts::{parse_amount, AmountExtractor};
pub use category::categorize;
pub use dates::{parse_date, DateExtractor};
pub use gstin::{validate_gstin, GstinExtractor};

use crate::error::ExtractionError;

/// Outcome of one extraction step.
///
/// `Ok(None)` means the field is absent; `Err` is an internal fault the caller
/// may downgrade to an absent field.
pub type StepResult<T> = Result<Option<T>, ExtractionError>;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the first occurrence of the field.
    fn extract(&self, text: &str) -> StepResult<Self::Output>;
}

/// Extracted value and where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Byte span in the source text.
    pub position: Option<(usize, usize)>,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            position: None,
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
