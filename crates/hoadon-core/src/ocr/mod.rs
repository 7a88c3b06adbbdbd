//! OCR collaborators and their output.
//!
//! Recognition itself is delegated to an external engine; this module only
//! defines the text it hands back ([`RawOcrResult`]) and the [`OcrBackend`]
//! seam the parser calls through.

mod plain;
#[cfg(feature = "vision")]
mod vision;

pub use plain::PlainTextBackend;
#[cfg(feature = "vision")]
pub use vision::VisionBackend;

use std::path::Path;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::OcrError;
use crate::models::config::{OcrBackendKind, OcrConfig};

/// Ordered text blocks recognized in one image.
///
/// Block 0 is the full recognized text, newline-delimited into lines. Any
/// further blocks are individual fragments (words or paragraphs) and are only
/// consulted by whole-text fallbacks. An empty sequence means nothing was
/// recognized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawOcrResult {
    pub blocks: Vec<String>,
}

impl RawOcrResult {
    pub fn new(blocks: Vec<String>) -> Self {
        Self { blocks }
    }

    /// Single-block result holding already-recognized text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            blocks: vec![text.into()],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block 0, or `""` when nothing was recognized.
    pub fn full_text(&self) -> &str {
        self.blocks.first().map(String::as_str).unwrap_or("")
    }

    /// Lines of the full text, untrimmed and including blank lines.
    pub fn lines(&self) -> Vec<&str> {
        self.full_text().split('\n').collect()
    }

    /// Every block joined with spaces.
    pub fn combined(&self) -> String {
        self.blocks.join(" ")
    }

    /// NFC-normalized copy, so decomposed diacritics compare equal to the
    /// precomposed keywords used by the extractors.
    pub fn normalized(&self) -> Self {
        Self {
            blocks: self.blocks.iter().map(|b| b.nfc().collect()).collect(),
        }
    }
}

/// An engine that turns an input file into text blocks.
pub trait OcrBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Recognize the text in the file at `path`.
    fn recognize(&self, path: &Path) -> Result<RawOcrResult, OcrError>;
}

/// Build the backend selected in the configuration.
///
/// `api_key` overrides the key stored in the config (e.g. from the
/// environment).
pub fn create_backend(
    config: &OcrConfig,
    api_key: Option<String>,
) -> Result<Box<dyn OcrBackend>, OcrError> {
    match config.backend {
        OcrBackendKind::PlainText => Ok(Box::new(PlainTextBackend::new())),
        OcrBackendKind::Vision => create_vision_backend(config, api_key),
    }
}

#[cfg(feature = "vision")]
fn create_vision_backend(
    config: &OcrConfig,
    api_key: Option<String>,
) -> Result<Box<dyn OcrBackend>, OcrError> {
    let key = api_key
        .or_else(|| config.vision_api_key.clone())
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| OcrError::Unavailable("no Google Cloud Vision API key".to_string()))?;
    Ok(Box::new(VisionBackend::new(config, key)?))
}

#[cfg(not(feature = "vision"))]
fn create_vision_backend(
    _config: &OcrConfig,
    _api_key: Option<String>,
) -> Result<Box<dyn OcrBackend>, OcrError> {
    Err(OcrError::Unavailable(
        "built without the `vision` feature".to_string(),
    ))
}
