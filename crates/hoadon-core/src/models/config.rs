//! Configuration structures for the receipt pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Main configuration for the hoadon pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HoadonConfig {
    /// OCR backend configuration.
    pub ocr: OcrConfig,

    /// Receipt extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Which OCR backend turns images into text blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackendKind {
    /// Google Cloud Vision REST API (`TEXT_DETECTION`).
    #[default]
    Vision,
    /// Input files already contain recognized UTF-8 text.
    PlainText,
}

/// OCR backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Backend to use for image inputs.
    pub backend: OcrBackendKind,

    /// Vision `images:annotate` endpoint.
    pub vision_endpoint: String,

    /// Vision API key. The CLI falls back to `GOOGLE_CLOUD_VISION_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vision_api_key: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackendKind::Vision,
            vision_endpoint: "https://vision.googleapis.com/v1/images:annotate".to_string(),
            vision_api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Inclusive plausibility window for a monetary field. Zero is never accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountWindow {
    pub min: f64,
    pub max: f64,
}

impl AmountWindow {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `amount` is a plausible value for the field.
    pub fn accepts(&self, amount: f64) -> bool {
        amount > 0.0 && amount >= self.min && amount <= self.max
    }
}

/// Receipt extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Seller names are only taken from this many leading lines.
    pub seller_scan_lines: usize,

    /// Leading lines skipped by the item segmenter (header block).
    pub item_header_lines: usize,

    /// Leading lines checked line-by-line by the invoice-number fallback.
    pub invoice_scan_lines: usize,

    /// Leading lines checked by the seller-name fallback.
    pub seller_fallback_lines: usize,

    /// Leading lines checked by the address fallback.
    pub address_fallback_lines: usize,

    /// Plausible subtotal/total range.
    pub amount_window: AmountWindow,

    /// Plausible VAT range on keyword lines.
    pub vat_window: AmountWindow,

    /// Exclusive VAT upper bound for the whole-text fallback scan of VAT lines.
    /// The keyword-line `LineScan` tier is bounded by `vat_window` instead.
    pub vat_scan_max: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            seller_scan_lines: 10,
            item_header_lines: 5,
            invoice_scan_lines: 20,
            seller_fallback_lines: 15,
            address_fallback_lines: 20,
            amount_window: AmountWindow::new(1_000.0, 100_000_000.0),
            vat_window: AmountWindow::new(0.0, 10_000_000.0),
            vat_scan_max: 1_000_000.0,
        }
    }
}

impl ExtractionConfig {
    /// Check that windows are ordered and scan lengths are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, window) in [
            ("amount_window", &self.amount_window),
            ("vat_window", &self.vat_window),
        ] {
            if window.min < 0.0 || window.min > window.max {
                return Err(ConfigError::Invalid(format!(
                    "{name} must satisfy 0 <= min <= max (got {}..{})",
                    window.min, window.max
                )));
            }
        }

        if self.vat_scan_max <= 0.0 {
            return Err(ConfigError::Invalid(
                "vat_scan_max must be positive".to_string(),
            ));
        }

        if self.seller_scan_lines == 0 || self.invoice_scan_lines == 0 {
            return Err(ConfigError::Invalid(
                "scan line counts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl HoadonConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.extraction.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
