//! Renderer error types.

use std::time::Duration;

use card_core::CropError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while cropping, composing or exporting.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The upload is not an image type.
    #[error("Unsupported file type: {0}. Please upload an image")]
    UnsupportedMediaType(String),

    /// The source image could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The crop session rejected the request.
    #[error(transparent)]
    Crop(#[from] CropError),

    /// No drawing surface could be created.
    #[error("Rendering unavailable: {0}")]
    RenderingUnavailable(String),

    /// The crop rectangle has no area or is not finite.
    #[error("Invalid crop area: {0}")]
    InvalidCrop(String),

    /// Encoding the cropped photo failed.
    #[error("Image encoding failed: {0}")]
    Encode(String),

    /// Capturing the card failed.
    #[error("Card capture failed: {0}")]
    Capture(String),

    /// A referenced asset did not resolve in time.
    #[error("Card capture timed out after {0:?}")]
    CaptureTimeout(Duration),
}

impl RenderError {
    /// Returns true if the user can fix this by retrying or re-uploading.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::RenderingUnavailable(_))
    }
}
