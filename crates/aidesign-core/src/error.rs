//! Error types for canvas operations.

use crate::elements::ElementId;
use thiserror::Error;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors surfaced by the canvas engine.
///
/// Geometry never fails: degenerate sizes are clamped and unresolvable
/// relations fall back to "no parent". These variants cover decoding,
/// parsing and id lookups only.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
    #[error("Bitmap decode failed: {0}")]
    BitmapDecode(String),
    #[error("Base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<image::ImageError> for CanvasError {
    fn from(err: image::ImageError) -> Self {
        CanvasError::BitmapDecode(err.to_string())
    }
}
