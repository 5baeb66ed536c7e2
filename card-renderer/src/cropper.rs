//! Photo cropper: a crop session bound to its decoded source image.

use card_core::{CropError, CropSession, CropState, CroppedPhoto};

use crate::error::RenderResult;
use crate::geometry::{compute_cropped_image, CropOptions};
use crate::image::SourceImage;

/// Aspect ratio of the card photo slot.
pub const PHOTO_ASPECT_RATIO: f64 = 1.0;

/// Owns at most one pending crop session and its source image.
///
/// The only caller of [`compute_cropped_image`]. Opening a new image replaces
/// whatever session was pending.
#[derive(Debug)]
pub struct PhotoCropper {
    session: CropSession,
    source: Option<SourceImage>,
    aspect_ratio: f64,
    options: CropOptions,
}

impl Default for PhotoCropper {
    fn default() -> Self {
        Self::new(PHOTO_ASPECT_RATIO)
    }
}

impl PhotoCropper {
    /// Create a cropper producing rectangles of the given aspect ratio.
    #[must_use]
    pub fn new(aspect_ratio: f64) -> Self {
        Self::with_options(aspect_ratio, CropOptions::default())
    }

    /// Create a cropper with explicit encoding options.
    #[must_use]
    pub fn with_options(aspect_ratio: f64, options: CropOptions) -> Self {
        Self {
            session: CropSession::new(),
            source: None,
            aspect_ratio,
            options,
        }
    }

    /// Start a session for a decoded image, discarding any pending one.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be started for this image.
    pub fn open(&mut self, source: SourceImage) -> RenderResult<()> {
        self.session.load(
            source.natural_width(),
            source.natural_height(),
            self.aspect_ratio,
        )?;
        tracing::debug!(
            width = source.natural_width(),
            height = source.natural_height(),
            "Crop session opened"
        );
        self.source = Some(source);
        Ok(())
    }

    /// Decode an upload and start a session for it.
    ///
    /// # Errors
    ///
    /// Returns an error for non-image MIME types or undecodable bytes. A
    /// pending session is left untouched in that case.
    pub fn open_upload(&mut self, mime: &str, data: &[u8]) -> RenderResult<()> {
        let source = SourceImage::from_upload(mime, data)?;
        self.open(source)
    }

    /// Current session, for reading state.
    #[must_use]
    pub fn session(&self) -> &CropSession {
        &self.session
    }

    /// Current session, for forwarding gestures.
    pub fn session_mut(&mut self) -> &mut CropSession {
        &mut self.session
    }

    /// Whether a session is pending.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.session.state() == CropState::Previewing
    }

    /// Produce the cropped photo and close the session.
    ///
    /// On failure the session stays open so the user can retry or cancel.
    ///
    /// # Errors
    ///
    /// Returns an error if no image is open, no crop has been computed yet,
    /// or rendering fails.
    pub fn confirm(&mut self) -> RenderResult<CroppedPhoto> {
        let source = self.source.as_ref().ok_or(CropError::NoImage)?;
        let mut pending = self.session.clone();
        let request = pending.confirm()?;
        let photo = compute_cropped_image(source, &request.crop, &request.transform, &self.options)?;

        self.session = pending;
        self.source = None;
        Ok(photo)
    }

    /// Discard the pending session without side effects.
    pub fn cancel(&mut self) {
        self.session.cancel();
        self.source = None;
    }
}
