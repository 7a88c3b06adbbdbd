//! Receipt data models: the mutable draft built while parsing and the
//! fixed-shape record handed to persistence/API layers.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Seller name used when OCR produced nothing at all.
pub const UNKNOWN_SELLER: &str = "Unknown";

/// Raw text stored on records created without any OCR output.
pub const OCR_UNAVAILABLE_TEXT: &str = "OCR not available: no text was recognized in the image";

/// A single purchased line on a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Item description with numbers and quantity markers stripped.
    pub name: String,

    /// Quantity (defaults to 1 when no `<qty> x` marker is present).
    pub quantity: f64,

    /// Price per unit.
    pub unit_price: f64,

    /// Line amount (last number on the line).
    pub amount: f64,
}

/// Marker attached to records built without usable OCR text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OcrFailure {
    /// The OCR backend produced no blocks (missing or unconfigured backend).
    #[serde(rename = "OCR_NOT_CONFIGURED")]
    NotConfigured,

    /// The OCR backend answered, but the recognized text is blank.
    #[serde(rename = "OCR_EMPTY")]
    Empty,
}

impl OcrFailure {
    /// Wire representation of the marker.
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrFailure::NotConfigured => "OCR_NOT_CONFIGURED",
            OcrFailure::Empty => "OCR_EMPTY",
        }
    }
}

impl fmt::Display for OcrFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final structured receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Receipt number, or a synthetic `INV<timestamp>` when none was found.
    pub invoice_number: String,

    /// ISO-8601 date (`YYYY-MM-DD`).
    pub date: String,

    /// Amount before VAT.
    pub subtotal: f64,

    /// VAT amount.
    pub vat: f64,

    /// Grand total.
    pub total: f64,

    #[serde(default)]
    pub seller_name: Option<String>,

    #[serde(default)]
    pub seller_phone: Option<String>,

    #[serde(default)]
    pub seller_address: Option<String>,

    /// Purchased lines in receipt order.
    #[serde(default)]
    pub items: Vec<LineItem>,

    /// Full OCR text the record was derived from.
    pub raw_text: String,

    /// Set only when the record was built without OCR text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OcrFailure>,
}

impl InvoiceRecord {
    /// Build the documented default record for missing or blank OCR output.
    pub fn ocr_unavailable(failure: OcrFailure, now: NaiveDateTime) -> Self {
        Self {
            invoice_number: synthetic_invoice_number(now),
            date: now.date().format("%Y-%m-%d").to_string(),
            subtotal: 0.0,
            vat: 0.0,
            total: 0.0,
            seller_name: Some(UNKNOWN_SELLER.to_string()),
            seller_phone: None,
            seller_address: None,
            items: Vec::new(),
            raw_text: OCR_UNAVAILABLE_TEXT.to_string(),
            error: Some(failure),
        }
    }
}

/// Timestamp-derived receipt number used when extraction finds none.
pub fn synthetic_invoice_number(now: NaiveDateTime) -> String {
    format!("INV{}", now.format("%Y%m%d%H%M%S"))
}

/// Identifies one field of the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    InvoiceNumber,
    Date,
    Subtotal,
    Vat,
    Total,
    SellerName,
    SellerPhone,
    SellerAddress,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::InvoiceNumber => "invoice_number",
            Field::Date => "date",
            Field::Subtotal => "subtotal",
            Field::Vat => "vat",
            Field::Total => "total",
            Field::SellerName => "seller_name",
            Field::SellerPhone => "seller_phone",
            Field::SellerAddress => "seller_address",
        }
    }
}

/// Partially-filled receipt owned by one parse call.
///
/// Every scalar field is written at most once through its `set_*` method;
/// later writes are ignored and reported as `false`. `total` is the single
/// exception: [`InvoiceDraft::replace_total`] overwrites it so that the last
/// grand-total line on the receipt wins.
#[derive(Debug, Clone, Default)]
pub struct InvoiceDraft {
    invoice_number: Option<String>,
    date: Option<String>,
    subtotal: Option<f64>,
    vat: Option<f64>,
    total: Option<f64>,
    seller_name: Option<String>,
    seller_phone: Option<String>,
    seller_address: Option<String>,
    items: Vec<LineItem>,
    raw_text: String,
}

fn set_once<T>(slot: &mut Option<T>, value: T) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(value);
    true
}

impl InvoiceDraft {
    /// Create an empty draft for the given OCR text.
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            ..Self::default()
        }
    }

    /// Whether the field has already been populated.
    pub fn is_set(&self, field: Field) -> bool {
        match field {
            Field::InvoiceNumber => self.invoice_number.is_some(),
            Field::Date => self.date.is_some(),
            Field::Subtotal => self.subtotal.is_some(),
            Field::Vat => self.vat.is_some(),
            Field::Total => self.total.is_some(),
            Field::SellerName => self.seller_name.is_some(),
            Field::SellerPhone => self.seller_phone.is_some(),
            Field::SellerAddress => self.seller_address.is_some(),
        }
    }

    /// Fields that are still empty, in declaration order.
    pub fn missing_fields(&self) -> Vec<Field> {
        [
            Field::InvoiceNumber,
            Field::Date,
            Field::Subtotal,
            Field::Vat,
            Field::Total,
            Field::SellerName,
            Field::SellerPhone,
            Field::SellerAddress,
        ]
        .into_iter()
        .filter(|f| !self.is_set(*f))
        .collect()
    }

    pub fn set_invoice_number(&mut self, value: String) -> bool {
        set_once(&mut self.invoice_number, value)
    }

    pub fn set_date(&mut self, value: String) -> bool {
        set_once(&mut self.date, value)
    }

    pub fn set_subtotal(&mut self, value: f64) -> bool {
        set_once(&mut self.subtotal, value)
    }

    pub fn set_vat(&mut self, value: f64) -> bool {
        set_once(&mut self.vat, value)
    }

    /// First-write total, used by whole-text fallbacks.
    pub fn set_total(&mut self, value: f64) -> bool {
        set_once(&mut self.total, value)
    }

    /// Overwrite the total; returns the previous value.
    pub fn replace_total(&mut self, value: f64) -> Option<f64> {
        self.total.replace(value)
    }

    pub fn set_seller_name(&mut self, value: String) -> bool {
        set_once(&mut self.seller_name, value)
    }

    pub fn set_seller_phone(&mut self, value: String) -> bool {
        set_once(&mut self.seller_phone, value)
    }

    pub fn set_seller_address(&mut self, value: String) -> bool {
        set_once(&mut self.seller_address, value)
    }

    pub fn set_items(&mut self, items: Vec<LineItem>) {
        self.items = items;
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn invoice_number(&self) -> Option<&str> {
        self.invoice_number.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn subtotal(&self) -> f64 {
        self.subtotal.unwrap_or(0.0)
    }

    pub fn vat(&self) -> f64 {
        self.vat.unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.total.unwrap_or(0.0)
    }

    /// Close the draft into a record, filling unresolved identity fields
    /// with their clock-derived defaults.
    pub fn finish(self, now: NaiveDateTime) -> InvoiceRecord {
        InvoiceRecord {
            invoice_number: self
                .invoice_number
                .unwrap_or_else(|| synthetic_invoice_number(now)),
            date: self
                .date
                .unwrap_or_else(|| now.date().format("%Y-%m-%d").to_string()),
            subtotal: self.subtotal.unwrap_or(0.0),
            vat: self.vat.unwrap_or(0.0),
            total: self.total.unwrap_or(0.0),
            seller_name: self.seller_name,
            seller_phone: self.seller_phone,
            seller_address: self.seller_address,
            items: self.items,
            raw_text: self.raw_text,
            error: None,
        }
    }
}
