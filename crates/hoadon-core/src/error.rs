//! Error types for the hoadon-core library.
//!
//! Receipt parsing itself never fails; these errors belong to the edges of the
//! pipeline (OCR backends and configuration files).

use thiserror::Error;

/// Main error type for the hoadon library.
#[derive(Error, Debug)]
pub enum HoadonError {
    /// OCR backend error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by an OCR backend.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The backend is not configured (missing credentials, disabled feature).
    #[error("OCR backend unavailable: {0}")]
    Unavailable(String),

    /// Failed to read the input image or text.
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level failure talking to a remote service.
    #[error("request failed: {0}")]
    Request(String),

    /// The remote service answered with a non-success status.
    #[error("OCR service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body could not be understood.
    #[error("malformed OCR response: {0}")]
    Response(String),
}

/// Errors related to loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read or write the configuration file.
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its allowed range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result type for the hoadon library.
pub type Result<T> = std::result::Result<T, HoadonError>;
