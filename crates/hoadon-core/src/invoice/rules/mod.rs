//! Rule-based field extractors for Vietnamese receipts.
//!
//! Each extractor looks at one trimmed OCR line and either returns a value or
//! nothing. Extractors hold no state between calls.

pub mod amounts;
pub mod contact;
pub mod identity;
pub mod patterns;
pub mod totals;

pub use amounts::{amounts_in_line, format_vnd, normalize_amount, numeric_tokens};
pub use contact::{AddressExtractor, PhoneExtractor};
pub use identity::{DateExtractor, InvoiceNumberExtractor, SellerExtractor};
pub use totals::{AmountExtractor, AmountField, AmountRule, amount_from_line, is_vat_line};

/// Trait for single-line field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Cheap keyword gate evaluated on the lowercased line before any regex
    /// work. Extractors without a keyword accept every line.
    fn applies_to(&self, _line_lower: &str) -> bool {
        true
    }

    /// Extract the field from one line.
    fn extract(&self, line: &str) -> Option<ExtractionMatch<Self::Output>>;
}

/// A value produced by an extractor, with the rule that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Name of the rule that fired.
    pub rule: &'static str,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, rule: &'static str, source: impl Into<String>) -> Self {
        Self {
            value,
            rule,
            source: source.into(),
        }
    }
}
