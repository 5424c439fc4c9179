//! Error types for nutriscan

use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Symbol decoder failure for a single bitmap
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Bitmap has zero width or height")]
    EmptyBitmap,

    #[error("Decoder failed: {0}")]
    Failed(String),
}

/// Nutrition lookup collaborator failures
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Lookup transport error: {0}")]
    Transport(String),

    #[error("Malformed lookup response: {0}")]
    Malformed(String),
}

/// Text-generation collaborator failures.
///
/// These never reach the caller of the pipeline; every variant is absorbed by a fallback.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("Text generation unavailable: {0}")]
    Unavailable(String),

    #[error("Text generation request failed: {0}")]
    RequestFailed(String),

    #[error("Text generation timed out after {0}s")]
    Timeout(u64),

    #[error("Text generation API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Malformed text generation output: {0}")]
    MalformedOutput(String),
}

/// Failures that reach the boundary of the scan pipeline
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Nutrition lookup failed: {0}")]
    LookupTransport(String),

    #[error("Scan aborted unexpectedly")]
    Aborted,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Scan(#[from] ScanError),

    #[error("{0}")]
    Lookup(#[from] LookupError),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid image format: {0}")]
    InvalidImageFormat(String),

    #[error("No barcode found in image")]
    NoBarcodeFound,

    #[error("Excel export error: {0}")]
    Excel(String),
}

pub type Result<T> = std::result::Result<T, Error>;
