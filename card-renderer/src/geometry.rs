//! Crop geometry.
//!
//! Produces the cropped photo from a source image, a crop rectangle in source
//! pixels and a rotation/flip transform. Drawing follows 2D canvas semantics:
//!
//! ```text
//! fill background
//! translate(w/2, h/2) · rotate(θ) · scale(±1, ±1) · translate(-w/2, -h/2)
//! draw source[crop] at (0, 0)
//! ```
//!
//! Parts of the crop lying outside the source keep the background color.

use card_core::{CropRect, CropTransform, CroppedPhoto};
use image::ImageEncoder;
use tiny_skia::{Color, FilterQuality, IntRect, Pixmap, PixmapPaint, Transform};

use crate::error::{RenderError, RenderResult};
use crate::image::{to_data_url, SourceImage};

/// Background painted behind the rotated photo.
pub const DEFAULT_CROP_BACKGROUND: Color = Color::WHITE;

/// Default JPEG quality (0.92 on a 0..1 scale).
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Encoding of the cropped photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropEncoding {
    /// Lossy JPEG, quality 1-100.
    Jpeg {
        /// Encoder quality.
        quality: u8,
    },
    /// Lossless PNG.
    Png,
}

impl Default for CropEncoding {
    fn default() -> Self {
        Self::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl CropEncoding {
    /// MIME type of the encoded output.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Options for [`compute_cropped_image`].
#[derive(Debug, Clone, Copy)]
pub struct CropOptions {
    /// Output encoding.
    pub encoding: CropEncoding,
    /// Fill behind the photo. Coerced to opaque.
    pub background: Color,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            encoding: CropEncoding::default(),
            background: DEFAULT_CROP_BACKGROUND,
        }
    }
}

/// Render the crop into a raw premultiplied pixmap of exactly
/// `round(crop.width) × round(crop.height)` pixels.
///
/// # Errors
///
/// Returns [`RenderError::InvalidCrop`] for an empty or non-finite crop and
/// [`RenderError::RenderingUnavailable`] if the surface cannot be allocated.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn render_crop(
    source: &SourceImage,
    crop: &CropRect,
    transform: &CropTransform,
    background: Color,
) -> RenderResult<Pixmap> {
    if !(crop.width > 0.0 && crop.height > 0.0) || crop.is_degenerate() {
        return Err(RenderError::InvalidCrop(format!(
            "{}x{}",
            crop.width, crop.height
        )));
    }
    if !(crop.x.is_finite() && crop.y.is_finite()) {
        return Err(RenderError::InvalidCrop(format!(
            "origin ({}, {}) is not finite",
            crop.x, crop.y
        )));
    }

    // Any positive crop yields at least one pixel.
    let out_w = crop.width.round().max(1.0);
    let out_h = crop.height.round().max(1.0);
    if out_w > f64::from(u32::MAX) || out_h > f64::from(u32::MAX) {
        return Err(RenderError::InvalidCrop(format!(
            "{}x{} is too large to draw",
            crop.width, crop.height
        )));
    }
    let (out_w, out_h) = (out_w as u32, out_h as u32);

    let mut pixmap = Pixmap::new(out_w, out_h).ok_or_else(|| {
        RenderError::RenderingUnavailable(format!("cannot allocate {out_w}x{out_h} surface"))
    })?;
    let mut background = background;
    background.set_alpha(1.0);
    pixmap.fill(background);

    // Source pixels covered by the crop, clipped to the image.
    let src = source.pixmap();
    let x0 = crop.x.floor().max(0.0);
    let y0 = crop.y.floor().max(0.0);
    let x1 = (crop.x + crop.width).ceil().min(f64::from(src.width()));
    let y1 = (crop.y + crop.height).ceil().min(f64::from(src.height()));
    let visible = IntRect::from_ltrb(x0 as i32, y0 as i32, x1 as i32, y1 as i32)
        .and_then(|rect| src.clone_rect(rect));

    let Some(region) = visible else {
        tracing::debug!(
            x = crop.x,
            y = crop.y,
            width = crop.width,
            height = crop.height,
            "Crop lies entirely outside the source; background only"
        );
        return Ok(pixmap);
    };

    let ctm = canvas_transform(f64::from(out_w), f64::from(out_h), transform)
        .pre_translate((x0 - crop.x) as f32, (y0 - crop.y) as f32);

    let quality = if (transform.normalized().rotation_degrees % 90.0).abs() < f64::EPSILON {
        FilterQuality::Nearest
    } else {
        FilterQuality::Bilinear
    };
    let paint = PixmapPaint {
        quality,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, region.as_ref(), &paint, ctm, None);

    Ok(pixmap)
}

/// Crop, rotate and flip the source, then encode it as a data URL.
///
/// The output is a pure function of its inputs.
///
/// # Errors
///
/// Propagates [`render_crop`] errors and returns [`RenderError::Encode`] if
/// encoding fails.
pub fn compute_cropped_image(
    source: &SourceImage,
    crop: &CropRect,
    transform: &CropTransform,
    options: &CropOptions,
) -> RenderResult<CroppedPhoto> {
    let pixmap = render_crop(source, crop, transform, options.background)?;
    let bytes = encode(&pixmap, options.encoding)?;
    let data_url = to_data_url(options.encoding.mime(), &bytes);

    tracing::debug!(
        width = pixmap.width(),
        height = pixmap.height(),
        bytes = bytes.len(),
        mime = options.encoding.mime(),
        "Cropped photo encoded"
    );

    CroppedPhoto::from_data_url(data_url)
        .ok_or_else(|| RenderError::Encode("encoder produced an invalid data URL".to_string()))
}

/// Encode a pixmap with the given encoding.
///
/// # Errors
///
/// Returns [`RenderError::Encode`] if the encoder fails.
pub fn encode(pixmap: &Pixmap, encoding: CropEncoding) -> RenderResult<Vec<u8>> {
    match encoding {
        CropEncoding::Png => pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}"))),
        CropEncoding::Jpeg { quality } => {
            let (width, height) = (pixmap.width(), pixmap.height());
            let mut rgb = Vec::with_capacity(pixmap.data().len() / 4 * 3);
            for px in pixmap.pixels() {
                let c = px.demultiply();
                rgb.extend_from_slice(&[c.red(), c.green(), c.blue()]);
            }

            let mut buf = std::io::Cursor::new(Vec::new());
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
                .write_image(&rgb, width, height, image::ColorType::Rgb8.into())
                .map_err(|e| RenderError::Encode(format!("JPEG encoding failed: {e}")))?;
            Ok(buf.into_inner())
        }
    }
}

/// `translate(c) · rotate(θ) · scale(±1) · translate(-c)` about the output
/// center.
#[allow(clippy::cast_possible_truncation)]
fn canvas_transform(width: f64, height: f64, transform: &CropTransform) -> Transform {
    let (cx, cy) = ((width / 2.0) as f32, (height / 2.0) as f32);
    let (sin, cos) = transform.radians().sin_cos();
    let (sin, cos) = (sin as f32, cos as f32);
    let sx = if transform.flip_horizontal { -1.0 } else { 1.0 };
    let sy = if transform.flip_vertical { -1.0 } else { 1.0 };

    Transform::from_translate(cx, cy)
        .pre_concat(Transform::from_row(cos, sin, -sin, cos, 0.0, 0.0))
        .pre_scale(sx, sy)
        .pre_translate(-cx, -cy)
}
