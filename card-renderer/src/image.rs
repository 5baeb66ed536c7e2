//! Source image loading.
//!
//! Decodes uploads and `data:` URLs into premultiplied RGBA pixmaps ready for
//! the geometry engine.

use std::io::Cursor;

use base64::Engine;
use tiny_skia::{IntSize, Pixmap};

use crate::error::{RenderError, RenderResult};

/// Image formats recognized on upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// GIF (first frame only).
    Gif,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/webp" => Self::WebP,
            "image/gif" => Self::Gif,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        // GIF: GIF8
        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }

    /// Canonical MIME type.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
            Self::Unknown => "application/octet-stream",
        }
    }
}

/// Whether a MIME type is accepted by the file input.
#[must_use]
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_lowercase().starts_with("image/")
}

/// What an upload's header says, read without decoding any pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadInfo {
    /// Format detected from the content.
    pub format: ImageFormat,
    /// Declared width in pixels.
    pub width: u32,
    /// Declared height in pixels.
    pub height: u32,
}

/// Check an upload's MIME type and read its dimensions from the header.
///
/// Lets callers reject oversized images before any pixel buffer exists.
///
/// # Errors
///
/// Returns [`RenderError::UnsupportedMediaType`] for non-image MIME types and
/// [`RenderError::Decode`] when the content contradicts a known declared
/// format or has no readable header.
pub fn probe_upload(mime: &str, data: &[u8]) -> RenderResult<UploadInfo> {
    if !is_image_mime(mime) {
        return Err(RenderError::UnsupportedMediaType(mime.to_string()));
    }
    let format = ImageFormat::from_magic_bytes(data);
    let declared = ImageFormat::from_mime(mime);
    if declared != ImageFormat::Unknown && format != ImageFormat::Unknown && declared != format {
        return Err(RenderError::Decode(format!(
            "declared {} but content is {}",
            declared.mime(),
            format.mime()
        )));
    }

    let (width, height) = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| RenderError::Decode(e.to_string()))?
        .into_dimensions()
        .map_err(|e| RenderError::Decode(e.to_string()))?;
    Ok(UploadInfo {
        format,
        width,
        height,
    })
}

/// A decoded photo in premultiplied RGBA.
///
/// Lives only for the duration of a crop session.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixmap: Pixmap,
}

impl SourceImage {
    /// Decode a file picked by the user.
    ///
    /// # Errors
    ///
    /// Same as [`probe_upload`], plus [`RenderError::Decode`] if the pixel
    /// data does not decode.
    pub fn from_upload(mime: &str, data: &[u8]) -> RenderResult<Self> {
        probe_upload(mime, data)?;
        Self::from_bytes(data)
    }

    /// Decode raw image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Decode`] if the image cannot be decoded.
    pub fn from_bytes(data: &[u8]) -> RenderResult<Self> {
        let img = image::load_from_memory(data)
            .map_err(|e| RenderError::Decode(e.to_string()))?;
        Self::from_rgba(&img.to_rgba8())
    }

    /// Decode a `data:` URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed, not an image, or does not
    /// decode.
    pub fn from_data_url(uri: &str) -> RenderResult<Self> {
        let (mime, bytes) = parse_data_url(uri)?;
        Self::from_upload(&mime, &bytes)
    }

    /// Wrap an already decoded straight-alpha RGBA buffer.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Decode`] for empty images and
    /// [`RenderError::RenderingUnavailable`] if no pixmap can be allocated.
    pub fn from_rgba(img: &image::RgbaImage) -> RenderResult<Self> {
        let (width, height) = img.dimensions();
        let size = IntSize::from_wh(width, height)
            .ok_or_else(|| RenderError::Decode(format!("image has no pixels ({width}x{height})")))?;

        let mut data = img.as_raw().clone();
        for px in data.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            for c in &mut px[..3] {
                // Round-to-nearest c * a / 255; result always fits in a u8.
                #[allow(clippy::cast_possible_truncation)]
                {
                    *c = ((u16::from(*c) * a + 127) / 255) as u8;
                }
            }
        }

        let pixmap = Pixmap::from_vec(data, size).ok_or_else(|| {
            RenderError::RenderingUnavailable(format!("cannot allocate {width}x{height} surface"))
        })?;
        Ok(Self { pixmap })
    }

    /// Natural width in pixels.
    #[must_use]
    pub fn natural_width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Natural height in pixels.
    #[must_use]
    pub fn natural_height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Premultiplied pixels.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

/// Split a base64 `data:` URL into MIME type and bytes.
///
/// # Errors
///
/// Returns [`RenderError::Decode`] if the URL is malformed or not base64.
pub fn parse_data_url(uri: &str) -> RenderResult<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Decode("Not a data URI".to_string()))?;

    let (metadata, encoded) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Decode("Invalid data URI: missing comma".to_string()))?;

    if !metadata.split(';').any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(RenderError::Decode(
            "Only base64 data URIs are supported".to_string(),
        ));
    }
    let mime = metadata.split(';').next().unwrap_or_default().to_string();

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| RenderError::Decode(format!("Failed to decode base64: {e}")))?;
    Ok((mime, bytes))
}

/// Build a base64 `data:` URL.
#[must_use]
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Convert a premultiplied pixmap back to straight-alpha RGBA.
#[must_use]
pub fn pixmap_to_rgba(pixmap: &Pixmap) -> image::RgbaImage {
    let mut img = image::RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}
