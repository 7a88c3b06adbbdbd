//! Structured receipt parser: one pass over the OCR lines, whole-text
//! fallbacks for unresolved fields, then reconciliation.

use std::path::Path;
use std::time::Instant;

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::models::config::ExtractionConfig;
use crate::models::invoice::{Field, InvoiceDraft, InvoiceRecord, OcrFailure};
use crate::ocr::{OcrBackend, RawOcrResult};

use super::ReceiptExtractor;
use super::fallback::WholeTextFallback;
use super::items::segment_items;
use super::reconcile::reconcile;
use super::rules::{
    AddressExtractor, AmountExtractor, DateExtractor, ExtractionMatch, FieldExtractor,
    InvoiceNumberExtractor, PhoneExtractor, SellerExtractor,
};

/// Result of receipt extraction.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Extracted receipt.
    pub record: InvoiceRecord,
    /// Fields that could not be found and repairs that were applied.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Rule-based receipt parser.
///
/// Stateless between calls; one parser can be shared by any number of
/// independent parses.
pub struct ReceiptParser {
    config: ExtractionConfig,
}

/// Field extractors used by the line pass.
struct LineExtractors {
    invoice_number: InvoiceNumberExtractor,
    date: DateExtractor,
    seller: SellerExtractor,
    phone: PhoneExtractor,
    address: AddressExtractor,
    subtotal: AmountExtractor,
    vat: AmountExtractor,
    total: AmountExtractor,
}

impl LineExtractors {
    fn new(config: &ExtractionConfig) -> Self {
        Self {
            invoice_number: InvoiceNumberExtractor::new(),
            date: DateExtractor::new(),
            seller: SellerExtractor::new(),
            phone: PhoneExtractor::new(),
            address: AddressExtractor::new(),
            subtotal: AmountExtractor::subtotal(config.amount_window),
            vat: AmountExtractor::vat(config.vat_window),
            total: AmountExtractor::total(config.amount_window),
        }
    }
}

fn try_extract<E: FieldExtractor>(
    extractor: &E,
    line: &str,
    line_lower: &str,
) -> Option<ExtractionMatch<E::Output>> {
    if !extractor.applies_to(line_lower) {
        return None;
    }
    extractor.extract(line)
}

impl ReceiptParser {
    /// Create a parser with default heuristics.
    pub fn new() -> Self {
        Self::with_config(ExtractionConfig::default())
    }

    /// Create a parser with custom heuristics.
    pub fn with_config(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Parse OCR output, using the local clock for synthetic defaults.
    pub fn parse(&self, raw: &RawOcrResult) -> ExtractionResult {
        self.parse_at(raw, Local::now().naive_local())
    }

    /// Parse already-recognized text.
    pub fn parse_text(&self, text: &str) -> ExtractionResult {
        self.parse(&RawOcrResult::from_text(text))
    }

    /// Recognize an image with `backend` and parse the result.
    ///
    /// Backend failures never propagate: they are logged and produce the
    /// default record marked `OCR_NOT_CONFIGURED`.
    pub fn parse_image(&self, backend: &dyn OcrBackend, path: &Path) -> ExtractionResult {
        match backend.recognize(path) {
            Ok(raw) => self.parse(&raw),
            Err(e) => {
                warn!("{} OCR failed for {}: {}", backend.name(), path.display(), e);
                let mut result = self.parse(&RawOcrResult::default());
                result.warnings.push(format!("OCR failed: {}", e));
                result
            }
        }
    }

    /// Parse OCR output with an explicit clock value.
    pub fn parse_at(&self, raw: &RawOcrResult, now: NaiveDateTime) -> ExtractionResult {
        let start = Instant::now();
        let mut warnings = Vec::new();

        if raw.is_empty() {
            warn!("OCR returned no text blocks");
            warnings.push("OCR returned no text".to_string());
            return ExtractionResult {
                record: InvoiceRecord::ocr_unavailable(OcrFailure::NotConfigured, now),
                warnings,
                processing_time_ms: start.elapsed().as_millis() as u64,
            };
        }

        let raw = raw.normalized();
        let full_text = raw.full_text();
        if full_text.trim().is_empty() {
            warn!("OCR text is blank");
            warnings.push("OCR text is blank".to_string());
            return ExtractionResult {
                record: InvoiceRecord::ocr_unavailable(OcrFailure::Empty, now),
                warnings,
                processing_time_ms: start.elapsed().as_millis() as u64,
            };
        }

        let lines = raw.lines();
        info!("Parsing receipt from {} lines of OCR text", lines.len());

        let mut draft = InvoiceDraft::new(full_text);
        self.line_pass(&lines, &mut draft);
        draft.set_items(segment_items(&lines, self.config.item_header_lines));

        let combined = raw.combined();
        let fallback = WholeTextFallback::new(full_text, &combined, &self.config);
        self.fill_identity(&fallback, &mut draft);

        if draft.subtotal() == 0.0 && draft.total() == 0.0 {
            warn!("Line pass found no subtotal or total, using whole-text fallbacks");
            warnings.push("Used whole-text fallbacks for amounts".to_string());
            self.fill_amounts_and_contact(&fallback, &mut draft);
        }

        for field in draft.missing_fields() {
            warnings.push(format!("Could not extract {}", field.name()));
        }
        if draft.items().is_empty() {
            warnings.push("Could not extract line items".to_string());
        }

        let mut record = draft.finish(now);
        if let Some(repair) = reconcile(&mut record) {
            warnings.push(repair.to_string());
        }

        info!(
            "Extracted amounts - subtotal: {}, VAT: {}, total: {}",
            record.subtotal, record.vat, record.total
        );

        ExtractionResult {
            record,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Single forward pass. Every field except `total` keeps its first
    /// match; `total` keeps the last "tổng cộng" line that parses.
    fn line_pass(&self, lines: &[&str], draft: &mut InvoiceDraft) {
        let ex = LineExtractors::new(&self.config);

        for (index, line) in lines.iter().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let lower = line.to_lowercase();

            if !draft.is_set(Field::InvoiceNumber) {
                if let Some(m) = try_extract(&ex.invoice_number, line, &lower) {
                    debug!("invoice_number on line {}: {} ({})", index, m.value, m.rule);
                    draft.set_invoice_number(m.value);
                }
            }

            if !draft.is_set(Field::Date) {
                if let Some(m) = try_extract(&ex.date, line, &lower) {
                    debug!("date on line {}: {} from '{}'", index, m.value, m.source);
                    draft.set_date(m.value);
                }
            }

            if !draft.is_set(Field::SellerName) && index < self.config.seller_scan_lines {
                if let Some(m) = try_extract(&ex.seller, line, &lower) {
                    debug!("seller_name on line {}: {}", index, m.value);
                    draft.set_seller_name(m.value);
                }
            }

            if !draft.is_set(Field::SellerPhone) {
                if let Some(m) = try_extract(&ex.phone, line, &lower) {
                    debug!("seller_phone on line {}: {} ({})", index, m.value, m.rule);
                    draft.set_seller_phone(m.value);
                }
            }

            if !draft.is_set(Field::SellerAddress) {
                if let Some(m) = try_extract(&ex.address, line, &lower) {
                    debug!("seller_address on line {}: {}", index, m.value);
                    draft.set_seller_address(m.value);
                }
            }

            if !draft.is_set(Field::Subtotal) {
                if let Some(m) = try_extract(&ex.subtotal, line, &lower) {
                    debug!("subtotal on line {}: {} ({}) from '{}'", index, m.value, m.rule, line);
                    draft.set_subtotal(m.value);
                }
            }

            if !draft.is_set(Field::Vat) {
                if let Some(m) = try_extract(&ex.vat, line, &lower) {
                    debug!("vat on line {}: {} ({}) from '{}'", index, m.value, m.rule, line);
                    draft.set_vat(m.value);
                }
            }

            if ex.total.applies_to(&lower) {
                match ex.total.extract(line) {
                    Some(m) => {
                        debug!("total on line {}: {} ({}) from '{}'", index, m.value, m.rule, line);
                        if let Some(previous) = draft.replace_total(m.value) {
                            debug!("total {} replaced by later line {}", previous, index);
                        }
                    }
                    None => warn!("Could not parse total from line {}: '{}'", index, line),
                }
            }
        }
    }

    fn fill_identity(&self, fallback: &WholeTextFallback<'_>, draft: &mut InvoiceDraft) {
        if !draft.is_set(Field::InvoiceNumber) {
            if let Some(value) = fallback.invoice_number() {
                debug!("invoice_number from whole text: {}", value);
                draft.set_invoice_number(value);
            }
        }
        if !draft.is_set(Field::Date) {
            if let Some(value) = fallback.date() {
                debug!("date from whole text: {}", value);
                draft.set_date(value);
            }
        }
        if !draft.is_set(Field::SellerName) {
            if let Some(value) = fallback.seller_name() {
                debug!("seller_name from whole text: {}", value);
                draft.set_seller_name(value);
            }
        }
    }

    fn fill_amounts_and_contact(&self, fallback: &WholeTextFallback<'_>, draft: &mut InvoiceDraft) {
        if let Some(value) = fallback.subtotal() {
            draft.set_subtotal(value);
        }
        if !draft.is_set(Field::Vat) {
            if let Some(value) = fallback.vat() {
                draft.set_vat(value);
            }
        }
        if let Some(value) = fallback.total() {
            draft.set_total(value);
        }
        if !draft.is_set(Field::SellerPhone) {
            if let Some(value) = fallback.phone() {
                draft.set_seller_phone(value);
            }
        }
        if !draft.is_set(Field::SellerAddress) {
            if let Some(value) = fallback.address() {
                draft.set_seller_address(value);
            }
        }
        if draft.items().is_empty() {
            draft.set_items(fallback.items());
        }
    }
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiptExtractor for ReceiptParser {
    fn extract(&self, raw: &RawOcrResult) -> InvoiceRecord {
        self.parse(raw).record
    }

    fn extract_from_text(&self, text: &str) -> InvoiceRecord {
        self.parse_text(text).record
    }
}
