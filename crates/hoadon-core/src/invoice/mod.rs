//! Receipt field extraction module.

pub mod fallback;
pub mod items;
mod parser;
pub mod reconcile;
pub mod rules;

pub use parser::{ExtractionResult, ReceiptParser};
pub use reconcile::{Repair, reconcile};

use crate::models::invoice::InvoiceRecord;
use crate::ocr::RawOcrResult;

/// Trait for receipt extractors.
///
/// Extraction is best-effort and never fails: missing fields fall back to
/// their documented defaults.
pub trait ReceiptExtractor {
    /// Extract a receipt from OCR output.
    fn extract(&self, raw: &RawOcrResult) -> InvoiceRecord;

    /// Extract a receipt from plain text.
    fn extract_from_text(&self, text: &str) -> InvoiceRecord;
}
