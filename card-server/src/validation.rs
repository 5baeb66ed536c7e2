//! Input validation for untrusted data.
//!
//! Card content itself is checked by the wizard rules in `card-core`; this
//! module covers ids, sizes and other transport-level limits.

use thiserror::Error;

/// Maximum length for card ids (`local-` plus a simple UUID is 38 chars).
pub const MAX_CARD_ID_LEN: usize = 64;
/// Largest accepted export edge in pixels.
pub const MAX_EXPORT_DIMENSION: u32 = 4096;
/// Largest accepted source image edge in pixels.
pub const MAX_SOURCE_DIMENSION: u32 = 8192;
/// Maximum request body size. Photos travel as base64 data URLs.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024; // 16MB

/// Validation error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    /// Card id exceeds maximum length.
    #[error("card id too long (max {MAX_CARD_ID_LEN} chars)")]
    CardIdTooLong,
    /// Card id is empty or contains invalid characters.
    #[error("card id contains invalid characters")]
    CardIdInvalidChars,
    /// Export size is zero or too large.
    #[error("export size {width}x{height} out of range (1..={MAX_EXPORT_DIMENSION})")]
    ExportSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// Uploaded image is too large to crop.
    #[error("image {width}x{height} too large (max {MAX_SOURCE_DIMENSION} per side)")]
    SourceTooLarge {
        /// Source width.
        width: u32,
        /// Source height.
        height: u32,
    },
}

/// Check if a character is valid for ids (ASCII alphanumeric, hyphen, or underscore).
fn is_valid_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Validate a card id taken from a URL path.
///
/// Valid card ids:
/// - 1-64 characters
/// - ASCII alphanumeric, hyphen, underscore only
///
/// # Errors
///
/// Returns [`InputError::CardIdTooLong`] if the id exceeds 64 characters.
/// Returns [`InputError::CardIdInvalidChars`] if the id is empty or contains invalid characters.
pub fn validate_card_id(id: &str) -> Result<(), InputError> {
    if id.len() > MAX_CARD_ID_LEN {
        return Err(InputError::CardIdTooLong);
    }
    if id.is_empty() || !id.chars().all(is_valid_id_char) {
        return Err(InputError::CardIdInvalidChars);
    }
    Ok(())
}

/// Validate a requested export size.
///
/// # Errors
///
/// Returns [`InputError::ExportSize`] if either side is zero or above
/// [`MAX_EXPORT_DIMENSION`].
pub fn validate_export_size(width: u32, height: u32) -> Result<(), InputError> {
    let in_range = |v: u32| (1..=MAX_EXPORT_DIMENSION).contains(&v);
    if in_range(width) && in_range(height) {
        Ok(())
    } else {
        Err(InputError::ExportSize { width, height })
    }
}

/// Validate the natural size of an uploaded image.
///
/// # Errors
///
/// Returns [`InputError::SourceTooLarge`] if either side exceeds
/// [`MAX_SOURCE_DIMENSION`].
pub fn validate_source_size(width: u32, height: u32) -> Result<(), InputError> {
    if width > MAX_SOURCE_DIMENSION || height > MAX_SOURCE_DIMENSION {
        return Err(InputError::SourceTooLarge { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_card_ids() {
        assert!(validate_card_id("3f1c2b9a0d4e4f5a8b7c6d5e4f3a2b1c").is_ok());
        assert!(validate_card_id("local-3f1c2b9a0d4e4f5a8b7c6d5e4f3a2b1c").is_ok());
        assert!(validate_card_id("card_1").is_ok());
        assert!(validate_card_id(&"a".repeat(MAX_CARD_ID_LEN)).is_ok());
    }

    #[test]
    fn test_card_id_too_long() {
        let long = "a".repeat(MAX_CARD_ID_LEN + 1);
        assert_eq!(validate_card_id(&long), Err(InputError::CardIdTooLong));
    }

    #[test]
    fn test_card_id_invalid_chars() {
        for id in ["", "../etc", "a b", "a/b", "a.b", "caf\u{e9}"] {
            assert_eq!(
                validate_card_id(id),
                Err(InputError::CardIdInvalidChars),
                "{id:?}"
            );
        }
    }

    #[test]
    fn test_export_size_bounds() {
        assert!(validate_export_size(1260, 1950).is_ok());
        assert!(validate_export_size(1, MAX_EXPORT_DIMENSION).is_ok());
        assert!(validate_export_size(0, 100).is_err());
        assert!(validate_export_size(100, MAX_EXPORT_DIMENSION + 1).is_err());
    }

    #[test]
    fn test_source_size_limit() {
        assert!(validate_source_size(4000, 3000).is_ok());
        assert_eq!(
            validate_source_size(MAX_SOURCE_DIMENSION + 1, 10),
            Err(InputError::SourceTooLarge {
                width: MAX_SOURCE_DIMENSION + 1,
                height: 10
            })
        );
    }
}
