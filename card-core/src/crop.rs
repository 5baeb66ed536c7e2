//! Crop interaction surface.
//!
//! Turns continuous gestures (drag, wheel/pinch zoom, rotation slider, flips)
//! into a [`CropRect`] in source-pixel coordinates. Gestures only mark the
//! session dirty; the rectangle is recomputed at most once per rendered frame
//! through [`CropSession::on_frame`].
//!
//! ```text
//! Idle ──load──▶ Previewing ──confirm──▶ Confirmed ──▶ Idle
//!                    │
//!                    └──────cancel─────▶ Cancelled ──▶ Idle
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CropError;

/// Smallest zoom factor (crop covers the largest fitting rectangle).
pub const MIN_ZOOM: f64 = 1.0;
/// Largest zoom factor.
pub const MAX_ZOOM: f64 = 3.0;

/// A region of the untransformed source image, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl CropRect {
    /// Create a crop rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle has no usable area.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0) || !self.width.is_finite() || !self.height.is_finite()
    }

    /// Whether the rectangle lies inside a `width × height` source.
    #[must_use]
    pub fn within(&self, width: f64, height: f64) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.width <= width
            && self.y + self.height <= height
    }

    /// Scale every component, e.g. to pre-scale for a fixed output size.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }
}

/// Rotation and mirroring applied when drawing the crop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CropTransform {
    /// Rotation in degrees, clockwise.
    #[serde(default)]
    pub rotation_degrees: f64,
    /// Mirror along the vertical axis.
    #[serde(default)]
    pub flip_horizontal: bool,
    /// Mirror along the horizontal axis.
    #[serde(default)]
    pub flip_vertical: bool,
}

impl CropTransform {
    /// Rotation only.
    #[must_use]
    pub const fn rotated(rotation_degrees: f64) -> Self {
        Self {
            rotation_degrees,
            flip_horizontal: false,
            flip_vertical: false,
        }
    }

    /// Same transform with the rotation wrapped into `[0, 360)`.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            rotation_degrees: normalize_degrees(self.rotation_degrees),
            ..self
        }
    }

    /// Rotation in radians.
    #[must_use]
    pub fn radians(&self) -> f64 {
        self.rotation_degrees.to_radians()
    }
}

/// What the session hands to the geometry engine on confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRequest {
    /// Crop in source pixels.
    pub crop: CropRect,
    /// Rotation and flips.
    pub transform: CropTransform,
}

/// Lifecycle state of a crop session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropState {
    /// No image loaded.
    Idle,
    /// Image loaded; gestures are live.
    Previewing,
    /// The last session ended with a confirmed crop.
    Confirmed,
    /// The last session was cancelled.
    Cancelled,
}

/// Coalesces gesture ticks so work happens at most once per frame.
#[derive(Debug, Clone, Default)]
pub struct FrameThrottle {
    dirty: bool,
    runs: u64,
}

impl FrameThrottle {
    /// Record that something changed.
    pub fn mark(&mut self) {
        self.dirty = true;
    }

    /// Called once per frame. Returns `true` if pending work should run now.
    pub fn take(&mut self) -> bool {
        if self.dirty {
            self.dirty = false;
            self.runs += 1;
            true
        } else {
            false
        }
    }

    /// Whether work is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.dirty
    }

    /// How many frames actually ran work.
    #[must_use]
    pub fn runs(&self) -> u64 {
        self.runs
    }

    fn reset(&mut self) {
        self.dirty = false;
    }
}

/// Transient state of one crop session.
#[derive(Debug, Clone)]
pub struct CropSession {
    state: CropState,
    natural: (f64, f64),
    aspect_ratio: f64,
    display: (f64, f64),
    center: (f64, f64),
    zoom: f64,
    rotation: f64,
    flip_horizontal: bool,
    flip_vertical: bool,
    crop: Option<CropRect>,
    throttle: FrameThrottle,
}

impl Default for CropSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CropSession {
    /// Create an idle session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: CropState::Idle,
            natural: (0.0, 0.0),
            aspect_ratio: 1.0,
            display: (0.0, 0.0),
            center: (0.0, 0.0),
            zoom: MIN_ZOOM,
            rotation: 0.0,
            flip_horizontal: false,
            flip_vertical: false,
            crop: None,
            throttle: FrameThrottle::default(),
        }
    }

    /// Start previewing an image of the given natural size.
    ///
    /// Any previous transient state is discarded. The first crop rectangle is
    /// computed on the next [`CropSession::on_frame`].
    ///
    /// # Errors
    ///
    /// Returns [`CropError::InvalidInput`] for empty images or a non-positive
    /// aspect ratio.
    pub fn load(
        &mut self,
        natural_width: u32,
        natural_height: u32,
        aspect_ratio: f64,
    ) -> Result<(), CropError> {
        if natural_width == 0 || natural_height == 0 {
            return Err(CropError::InvalidInput(format!(
                "image has no pixels ({natural_width}x{natural_height})"
            )));
        }
        if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
            return Err(CropError::InvalidInput(format!(
                "aspect ratio must be positive, got {aspect_ratio}"
            )));
        }
        if self.state == CropState::Previewing {
            tracing::debug!("Replacing pending crop session");
        }

        let (w, h) = (f64::from(natural_width), f64::from(natural_height));
        *self = Self::new();
        self.state = CropState::Previewing;
        self.natural = (w, h);
        self.aspect_ratio = aspect_ratio;
        self.display = (w, h);
        self.center = (w / 2.0, h / 2.0);
        self.throttle.mark();
        Ok(())
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> CropState {
        self.state
    }

    /// Current zoom factor.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Current rotation in `[0, 360)`.
    #[must_use]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Last computed crop rectangle.
    #[must_use]
    pub fn crop_rect(&self) -> Option<CropRect> {
        self.crop
    }

    /// Current transform.
    #[must_use]
    pub fn transform(&self) -> CropTransform {
        CropTransform {
            rotation_degrees: self.rotation,
            flip_horizontal: self.flip_horizontal,
            flip_vertical: self.flip_vertical,
        }
    }

    /// Frame throttle statistics.
    #[must_use]
    pub fn throttle(&self) -> &FrameThrottle {
        &self.throttle
    }

    /// Set the on-screen size of the preview container.
    pub fn set_display_size(&mut self, width: f64, height: f64) {
        if !self.is_previewing() || !(width > 0.0 && height > 0.0) {
            return;
        }
        self.display = (width, height);
        self.throttle.mark();
    }

    /// Pan by a pointer delta in display pixels.
    pub fn drag(&mut self, dx: f64, dy: f64) {
        if !self.is_previewing() || !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        // Undo the preview rotation so the delta lands in source space.
        let (sin, cos) = (-self.rotation.to_radians()).sin_cos();
        let mut sx = dx * cos - dy * sin;
        let mut sy = dx * sin + dy * cos;
        if self.flip_horizontal {
            sx = -sx;
        }
        if self.flip_vertical {
            sy = -sy;
        }
        let px_per_source = self.fit_scale() * self.zoom;
        self.center.0 -= sx / px_per_source;
        self.center.1 -= sy / px_per_source;
        self.throttle.mark();
    }

    /// Change zoom by a wheel or pinch delta.
    pub fn zoom_by(&mut self, delta: f64) {
        self.set_zoom(self.zoom + delta);
    }

    /// Set zoom, clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn set_zoom(&mut self, zoom: f64) {
        if !self.is_previewing() || !zoom.is_finite() {
            return;
        }
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.throttle.mark();
    }

    /// Rotate by a delta in degrees; wraps continuously.
    pub fn rotate_by(&mut self, degrees: f64) {
        self.set_rotation(self.rotation + degrees);
    }

    /// Set rotation in degrees; wraps into `[0, 360)`.
    pub fn set_rotation(&mut self, degrees: f64) {
        if !self.is_previewing() || !degrees.is_finite() {
            return;
        }
        self.rotation = normalize_degrees(degrees);
        self.throttle.mark();
    }

    /// Toggle horizontal mirroring.
    pub fn toggle_flip_horizontal(&mut self) {
        if self.is_previewing() {
            self.flip_horizontal = !self.flip_horizontal;
            self.throttle.mark();
        }
    }

    /// Toggle vertical mirroring.
    pub fn toggle_flip_vertical(&mut self) {
        if self.is_previewing() {
            self.flip_vertical = !self.flip_vertical;
            self.throttle.mark();
        }
    }

    /// Paint-cycle hook. Recomputes the crop rectangle if anything changed
    /// since the previous frame and returns the new value.
    pub fn on_frame(&mut self) -> Option<CropRect> {
        if !self.is_previewing() || !self.throttle.take() {
            return None;
        }
        let rect = self.compute_rect();
        tracing::debug!(
            x = rect.x,
            y = rect.y,
            width = rect.width,
            height = rect.height,
            zoom = self.zoom,
            rotation = self.rotation,
            "Crop area recomputed"
        );
        self.crop = Some(rect);
        Some(rect)
    }

    /// Confirm the crop and return to idle.
    ///
    /// # Errors
    ///
    /// Returns [`CropError::NoImage`] if nothing is being previewed and
    /// [`CropError::NotReady`] until a non-degenerate rectangle has been
    /// computed at least once. The session is left untouched on error.
    pub fn confirm(&mut self) -> Result<CropRequest, CropError> {
        if !self.is_previewing() {
            return Err(CropError::NoImage);
        }
        let crop = self
            .crop
            .filter(|c| !c.is_degenerate())
            .ok_or(CropError::NotReady)?;
        let request = CropRequest {
            crop,
            transform: self.transform().normalized(),
        };
        *self = Self::new();
        self.state = CropState::Confirmed;
        self.finish();
        Ok(request)
    }

    /// Discard all transient state and return to idle.
    pub fn cancel(&mut self) {
        *self = Self::new();
        self.state = CropState::Cancelled;
        self.finish();
    }

    fn finish(&mut self) {
        tracing::debug!(outcome = ?self.state, "Crop session finished");
        self.throttle.reset();
        self.state = CropState::Idle;
    }

    fn is_previewing(&self) -> bool {
        self.state == CropState::Previewing
    }

    /// Display pixels per source pixel at zoom 1 (contain fit).
    fn fit_scale(&self) -> f64 {
        let (w, h) = self.natural;
        let (dw, dh) = self.display;
        (dw / w).min(dh / h).max(f64::EPSILON)
    }

    fn compute_rect(&mut self) -> CropRect {
        let (w, h) = self.natural;

        // Largest rectangle of the requested aspect inside the source.
        let (mut cw, mut ch) = if w / h > self.aspect_ratio {
            (h * self.aspect_ratio, h)
        } else {
            (w, w / self.aspect_ratio)
        };
        cw = (cw / self.zoom).round().clamp(1.0, w);
        ch = (ch / self.zoom).round().clamp(1.0, h);

        self.center.0 = self.center.0.clamp(cw / 2.0, w - cw / 2.0);
        self.center.1 = self.center.1.clamp(ch / 2.0, h - ch / 2.0);

        let x = (self.center.0 - cw / 2.0).round().clamp(0.0, w - cw);
        let y = (self.center.1 - ch / 2.0).round().clamp(0.0, h - ch);
        CropRect::new(x, y, cw, ch)
    }
}

fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn previewing(w: u32, h: u32) -> CropSession {
        let mut session = CropSession::new();
        session.load(w, h, 1.0).expect("load");
        session
    }

    #[test]
    fn test_confirm_requires_computed_rect() {
        let mut session = previewing(2000, 1500);
        assert_eq!(session.confirm(), Err(CropError::NotReady));
        assert_eq!(session.state(), CropState::Previewing);

        session.on_frame().expect("first frame computes");
        let request = session.confirm().expect("confirm");
        assert_eq!(request.crop, CropRect::new(250.0, 0.0, 1500.0, 1500.0));
        assert_eq!(session.state(), CropState::Idle);
    }

    #[test]
    fn test_confirm_without_image() {
        let mut session = CropSession::new();
        assert_eq!(session.confirm(), Err(CropError::NoImage));
    }

    #[test]
    fn test_load_rejects_bad_input() {
        let mut session = CropSession::new();
        assert!(session.load(0, 10, 1.0).is_err());
        assert!(session.load(10, 10, 0.0).is_err());
        assert!(session.load(10, 10, f64::NAN).is_err());
        assert_eq!(session.state(), CropState::Idle);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut session = previewing(1000, 1000);
        session.set_zoom(0.0);
        assert!((session.zoom() - MIN_ZOOM).abs() < f64::EPSILON);
        session.zoom_by(-5.0);
        assert!((session.zoom() - MIN_ZOOM).abs() < f64::EPSILON);
        session.set_zoom(10.0);
        assert!((session.zoom() - MAX_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_shrinks_crop() {
        let mut session = previewing(1200, 900);
        session.on_frame();
        session.set_zoom(2.0);
        let rect = session.on_frame().expect("recomputed");
        assert!((rect.width - 450.0).abs() < f64::EPSILON);
        assert!((rect.height - 450.0).abs() < f64::EPSILON);
        assert!(rect.within(1200.0, 900.0));
    }

    #[test]
    fn test_rotation_wraps() {
        let mut session = previewing(100, 100);
        session.set_rotation(370.0);
        assert!((session.rotation() - 10.0).abs() < 1e-9);
        session.rotate_by(-20.0);
        assert!((session.rotation() - 350.0).abs() < 1e-9);
        session.set_rotation(-1e-18);
        assert!(session.rotation() < 360.0);
    }

    #[test]
    fn test_gestures_coalesce_per_frame() {
        let mut session = previewing(2000, 1500);
        session.on_frame();
        let before = session.throttle().runs();

        session.set_zoom(2.0);
        for _ in 0..50 {
            session.drag(1.0, 1.0);
        }
        assert!(session.on_frame().is_some());
        assert!(session.on_frame().is_none());
        assert_eq!(session.throttle().runs(), before + 1);
    }

    #[test]
    fn test_drag_stays_in_bounds() {
        let mut session = previewing(2000, 1500);
        session.set_zoom(3.0);
        session.drag(-1e7, -1e7);
        let rect = session.on_frame().expect("rect");
        assert!(rect.within(2000.0, 1500.0), "{rect:?}");
        assert!((rect.x + rect.width - 2000.0).abs() < 1.0);
        assert!((rect.y + rect.height - 1500.0).abs() < 1.0);
    }

    #[test]
    fn test_drag_direction_follows_rotation() {
        let mut session = previewing(2000, 2000);
        session.set_zoom(2.0);
        session.on_frame();
        let start = session.crop_rect().expect("rect");

        // Dragging the image left moves the crop window right.
        session.drag(-100.0, 0.0);
        let moved = session.on_frame().expect("rect");
        assert!(moved.x > start.x);
        assert!((moved.y - start.y).abs() < 1.0);

        // At 90° a horizontal screen drag pans vertically in source space.
        session.set_rotation(90.0);
        session.on_frame();
        let before = session.crop_rect().expect("rect");
        session.drag(-100.0, 0.0);
        let after = session.on_frame().expect("rect");
        assert!((after.x - before.x).abs() < 1.0);
        assert!((after.y - before.y).abs() > 10.0);
    }

    #[test]
    fn test_cancel_discards_state() {
        let mut session = previewing(800, 600);
        session.set_zoom(2.0);
        session.on_frame();
        session.cancel();
        assert_eq!(session.state(), CropState::Idle);
        assert!(session.crop_rect().is_none());
        assert!((session.zoom() - MIN_ZOOM).abs() < f64::EPSILON);
        assert_eq!(session.confirm(), Err(CropError::NoImage));
    }

    #[test]
    fn test_gestures_ignored_when_idle() {
        let mut session = CropSession::new();
        session.drag(10.0, 10.0);
        session.set_zoom(2.0);
        assert!(session.on_frame().is_none());
        assert!((session.zoom() - MIN_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reload_replaces_pending_session() {
        let mut session = previewing(800, 600);
        session.set_zoom(3.0);
        session.on_frame();
        session.load(400, 400, 1.0).expect("reload");
        assert!(session.crop_rect().is_none());
        let rect = session.on_frame().expect("rect");
        assert_eq!(rect, CropRect::new(0.0, 0.0, 400.0, 400.0));
    }

    #[test]
    fn test_confirm_carries_transform() {
        let mut session = previewing(500, 500);
        session.set_rotation(-45.0);
        session.toggle_flip_horizontal();
        session.on_frame();
        let request = session.confirm().expect("confirm");
        assert!((request.transform.rotation_degrees - 315.0).abs() < 1e-9);
        assert!(request.transform.flip_horizontal);
        assert!(!request.transform.flip_vertical);
    }

    #[test]
    fn test_rect_helpers() {
        let rect = CropRect::new(10.0, 10.0, 0.0, 5.0);
        assert!(rect.is_degenerate());
        let rect = CropRect::new(10.0, 20.0, 30.0, 40.0).scaled(2.0);
        assert_eq!(rect, CropRect::new(20.0, 40.0, 60.0, 80.0));
        assert!(rect.within(80.0, 120.0));
        assert!(!rect.within(79.0, 120.0));
    }
}
