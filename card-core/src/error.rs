//! Error types for card operations.

use thiserror::Error;

use crate::catalog::Category;

/// Result type for card model operations.
pub type CardResult<T> = Result<T, CardError>;

/// Errors raised while mutating a [`CardModel`](crate::CardModel).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardError {
    /// The category already holds the maximum number of technologies.
    #[error("You can select up to {max} items in {category}")]
    CategoryFull {
        /// Category that is full.
        category: Category,
        /// The per-category limit.
        max: usize,
    },

    /// The technology is already selected.
    #[error("{0} is already selected")]
    DuplicateTech(String),

    /// The technology id is not part of the catalog.
    #[error("Unknown technology: {0}")]
    UnknownTech(String),

    /// A color value is not a `#rrggbb` hex string.
    #[error("Invalid color: {0}")]
    InvalidColor(String),
}

/// A user-facing, step-blocking validation failure.
///
/// Validation errors never leave the wizard; they carry the message shown
/// next to the offending field.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    /// Human readable message.
    pub message: String,
}

impl ValidationError {
    /// Create a validation error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors raised by the crop interaction surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CropError {
    /// No image is loaded into the session.
    #[error("No image loaded")]
    NoImage,

    /// No non-degenerate crop rectangle has been computed yet.
    #[error("Crop area not ready")]
    NotReady,

    /// The image dimensions or aspect ratio are unusable.
    #[error("Invalid crop input: {0}")]
    InvalidInput(String),
}
