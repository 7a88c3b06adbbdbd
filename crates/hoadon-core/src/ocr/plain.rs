//! Backend for inputs that already contain recognized text.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::{OcrBackend, RawOcrResult};
use crate::error::OcrError;

/// Reads a UTF-8 text file; the whole file becomes block 0.
#[derive(Debug, Clone, Default)]
pub struct PlainTextBackend;

impl PlainTextBackend {
    pub fn new() -> Self {
        Self
    }
}

impl OcrBackend for PlainTextBackend {
    fn name(&self) -> &'static str {
        "plain_text"
    }

    fn recognize(&self, path: &Path) -> Result<RawOcrResult, OcrError> {
        let text = fs::read_to_string(path)?;
        debug!("Read {} bytes of text from {}", text.len(), path.display());
        Ok(RawOcrResult::from_text(text.replace("\r\n", "\n")))
    }
}
