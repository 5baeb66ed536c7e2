//! The on-screen card node and its inline style.
//!
//! Export temporarily forces the node to the design reference size. The
//! override is scoped: [`ScopedStyle`] puts every touched property back when it
//! is dropped, on success and on error.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use card_core::CardModel;

use crate::compose::{compose_card, CardLayout, CARD_HEIGHT, CARD_WIDTH};

/// Inline style properties of a node, `name → value`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle(BTreeMap<String, String>);

impl InlineStyle {
    /// Empty style.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Set a property, returning the previous value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.to_string(), value.into())
    }

    /// Remove a property, returning the previous value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    /// A property as CSS pixels, if it is a plain `<n>px` or bare number.
    #[must_use]
    pub fn px(&self, name: &str) -> Option<f32> {
        let value = self.get(name)?.trim();
        let number = value.strip_suffix("px").unwrap_or(value).trim();
        number.parse::<f32>().ok().filter(|v| v.is_finite() && *v > 0.0)
    }
}

/// Display characteristics of the screen showing the node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Physical pixels per CSS pixel.
    pub device_pixel_ratio: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            device_pixel_ratio: 1.0,
        }
    }
}

/// The rendered card as it sits in the page.
#[derive(Debug, Clone)]
pub struct CardNode {
    /// Composed content.
    pub layout: CardLayout,
    /// Inline style; width, height and max-width size the node on screen.
    pub style: InlineStyle,
    /// Screen the node is displayed on.
    pub viewport: Viewport,
}

impl CardNode {
    /// Compose a node for a card at its design size.
    #[must_use]
    pub fn new(model: &CardModel) -> Self {
        Self::from_layout(compose_card(model))
    }

    /// Wrap an existing layout.
    #[must_use]
    pub fn from_layout(layout: CardLayout) -> Self {
        Self {
            layout,
            style: InlineStyle::new(),
            viewport: Viewport::default(),
        }
    }

    /// Set the viewport.
    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Size of the node's box in CSS pixels.
    ///
    /// Width and height come from the inline style, defaulting to the design
    /// size; `max-width` caps the width and scales the height with it.
    #[must_use]
    pub fn box_size(&self) -> (f32, f32) {
        let width = self.style.px("width").unwrap_or(CARD_WIDTH);
        let height = self
            .style
            .px("height")
            .unwrap_or(width * CARD_HEIGHT / CARD_WIDTH);
        match self.style.px("max-width") {
            Some(max) if width > max => (max, height * max / width),
            _ => (width, height),
        }
    }

    /// Uniform scale from a CSS `transform: scale(k)`, if any.
    #[must_use]
    pub fn transform_scale(&self) -> f32 {
        self.style
            .get("transform")
            .and_then(|t| t.trim().strip_prefix("scale(")?.strip_suffix(')')?.trim().parse::<f32>().ok())
            .filter(|k| k.is_finite() && *k > 0.0)
            .unwrap_or(1.0)
    }

    /// Pixel size the node occupies on its screen.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn screen_pixels(&self) -> (u32, u32) {
        let (w, h) = self.box_size();
        let k = self.transform_scale() * self.viewport.device_pixel_ratio;
        ((w * k).round().max(1.0) as u32, (h * k).round().max(1.0) as u32)
    }
}

/// Properties forced during export.
pub const EXPORT_OVERRIDES: [(&str, &str); 4] = [
    ("width", "420px"),
    ("height", "650px"),
    ("transform", "none"),
    ("max-width", "none"),
];

/// Scoped inline style override.
///
/// Records the original value of each overridden property and restores it on
/// drop. Properties that were unset are removed again.
pub struct ScopedStyle<'a> {
    style: &'a mut InlineStyle,
    saved: Vec<(String, Option<String>)>,
}

impl<'a> ScopedStyle<'a> {
    /// Apply `overrides` to `style`.
    pub fn apply(style: &'a mut InlineStyle, overrides: &[(&str, &str)]) -> Self {
        let mut saved: Vec<(String, Option<String>)> = Vec::with_capacity(overrides.len());
        for (name, value) in overrides {
            let previous = style.set(name, *value);
            // Keep only the first original if a property is listed twice.
            if !saved.iter().any(|(n, _)| n == name) {
                saved.push(((*name).to_string(), previous));
            }
        }
        Self { style, saved }
    }

    /// Force the design reference size for capture.
    pub fn for_export(style: &'a mut InlineStyle) -> Self {
        Self::apply(style, &EXPORT_OVERRIDES)
    }
}

impl Deref for ScopedStyle<'_> {
    type Target = InlineStyle;

    fn deref(&self) -> &Self::Target {
        self.style
    }
}

impl DerefMut for ScopedStyle<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.style
    }
}

impl Drop for ScopedStyle<'_> {
    fn drop(&mut self) {
        for (name, original) in self.saved.drain(..).rev() {
            match original {
                Some(value) => {
                    self.style.set(&name, value);
                }
                None => {
                    self.style.remove(&name);
                }
            }
        }
        tracing::trace!("Export style overrides restored");
    }
}
