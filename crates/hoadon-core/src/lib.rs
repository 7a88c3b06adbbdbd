//! Core library for Vietnamese retail receipt OCR processing.
//!
//! This crate provides:
//! - Amount normalization for mixed Vietnamese/Western number formats
//! - Rule-based field extraction (receipt number, date, seller, totals, items)
//! - Whole-text fallbacks and reconciliation of inconsistent totals
//! - OCR backends (plain text, Google Cloud Vision)
//! - Expense classification for tax categories

pub mod error;
pub mod expense;
pub mod invoice;
pub mod models;
pub mod ocr;

pub use error::{ConfigError, HoadonError, OcrError, Result};
pub use expense::{ExpenseCategory, ExpenseClassification, classify};
pub use invoice::{ExtractionResult, ReceiptExtractor, ReceiptParser};
pub use models::config::{ExtractionConfig, HoadonConfig, OcrBackendKind, OcrConfig};
pub use models::invoice::{InvoiceRecord, LineItem, OcrFailure};
pub use ocr::{OcrBackend, PlainTextBackend, RawOcrResult, create_backend};

#[cfg(feature = "vision")]
pub use ocr::VisionBackend;
