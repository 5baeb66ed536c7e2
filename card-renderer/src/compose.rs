//! Card composition.
//!
//! Maps a [`CardModel`] to a fixed-size layout of drawing primitives in a
//! 420×650 design space, then serializes it to SVG for rasterization.
//!
//! ```text
//! ┌──────────────────────────┐  0
//! │          ( photo )       │  58..202
//! │           Name           │  238
//! │           Role           │  266
//! │    bio, wrapped, ≤ 3     │  292..
//! │ LANGUAGES                │  344..
//! │ [rust] [go] [python]     │
//! │ TOOLS                    │
//! │ [docker]                 │
//! │   github · linkedin ...  │  622
//! └──────────────────────────┘  650
//! ```

use std::collections::HashMap;
use std::fmt::Write;

use base64::Engine;
use card_core::{CardModel, Category};

/// Design reference width in CSS pixels.
pub const CARD_WIDTH: f32 = 420.0;
/// Design reference height in CSS pixels.
pub const CARD_HEIGHT: f32 = 650.0;

/// Shown in place of badges when nothing is selected.
pub const EMPTY_TECH_PLACEHOLDER: &str = "No technologies selected";

const FONT_FAMILY: &str = "Inter, Helvetica, Arial, sans-serif";
const TEXT_COLOR: &str = "#ffffff";

const PHOTO_CX: f32 = CARD_WIDTH / 2.0;
const PHOTO_CY: f32 = 130.0;
const PHOTO_RADIUS: f32 = 72.0;

const NAME_Y: f32 = 238.0;
const ROLE_Y: f32 = 266.0;
const BIO_Y: f32 = 292.0;
const BIO_LINE_HEIGHT: f32 = 18.0;
const BIO_MAX_LINES: usize = 3;
const BIO_SIZE: f32 = 13.0;

const CONTENT_LEFT: f32 = 30.0;
const CONTENT_RIGHT: f32 = CARD_WIDTH - 30.0;
const TECH_TOP: f32 = 344.0;
const TECH_BOTTOM: f32 = 600.0;
const HEADING_SIZE: f32 = 11.0;
const BADGE_HEIGHT: f32 = 22.0;
const BADGE_TEXT_SIZE: f32 = 12.0;
const BADGE_ICON: f32 = 12.0;
const BADGE_PAD: f32 = 8.0;
const BADGE_GAP: f32 = 6.0;

const SOCIALS_Y: f32 = 622.0;
const SOCIALS_SIZE: f32 = 11.0;

/// An image the rasterizer must resolve before capture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetRef {
    /// A `data:` URL carried inline (the cropped photo).
    Inline(String),
    /// A relative asset path (catalog icons).
    Path(String),
}

impl AssetRef {
    /// The reference as written in the card.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inline(s) | Self::Path(s) => s,
        }
    }

    /// Short name for logs and errors; inline data is not echoed.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Inline(_) => "inline photo",
            Self::Path(s) => s,
        }
    }
}

/// Text alignment relative to the anchor x.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Left aligned.
    Start,
    /// Centered.
    Middle,
}

impl Anchor {
    fn as_svg(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
        }
    }
}

/// A single drawing operation in design space.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Filled (optionally rounded) rectangle.
    Rect {
        /// Left edge.
        x: f32,
        /// Top edge.
        y: f32,
        /// Width.
        width: f32,
        /// Height.
        height: f32,
        /// Corner radius.
        radius: f32,
        /// Fill color.
        fill: String,
        /// Fill opacity.
        opacity: f32,
    },
    /// Filled circle with an optional stroke.
    Circle {
        /// Center x.
        cx: f32,
        /// Center y.
        cy: f32,
        /// Radius.
        r: f32,
        /// Fill color, `none` for stroke only.
        fill: String,
        /// Fill opacity.
        opacity: f32,
        /// Stroke color and width.
        stroke: Option<(String, f32)>,
    },
    /// Filled path.
    Path {
        /// SVG path data.
        d: String,
        /// Fill color.
        fill: String,
        /// Fill opacity.
        opacity: f32,
    },
    /// Single line of text.
    Text {
        /// Anchor x.
        x: f32,
        /// Baseline y.
        y: f32,
        /// Font size.
        size: f32,
        /// Font weight.
        weight: u16,
        /// Fill color.
        fill: String,
        /// Fill opacity.
        opacity: f32,
        /// Alignment.
        anchor: Anchor,
        /// Text content (unescaped).
        content: String,
    },
    /// Image drawn into a box, optionally clipped to a circle.
    Image {
        /// Left edge.
        x: f32,
        /// Top edge.
        y: f32,
        /// Width.
        width: f32,
        /// Height.
        height: f32,
        /// Image source.
        asset: AssetRef,
        /// Clip to the inscribed circle.
        circular: bool,
        /// Color dot drawn when the asset is unavailable.
        fallback: Option<String>,
    },
}

/// Bytes fetched for each [`AssetRef`] of a layout.
#[derive(Debug, Clone, Default)]
pub struct ResolvedAssets(HashMap<AssetRef, Vec<u8>>);

impl ResolvedAssets {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the bytes for an asset.
    pub fn insert(&mut self, asset: AssetRef, bytes: Vec<u8>) {
        self.0.insert(asset, bytes);
    }

    /// Bytes for an asset, if resolved.
    #[must_use]
    pub fn get(&self, asset: &AssetRef) -> Option<&[u8]> {
        self.0.get(asset).map(Vec::as_slice)
    }

    /// Resolved assets with their bytes.
    pub fn iter(&self) -> impl Iterator<Item = (&AssetRef, &[u8])> {
        self.0.iter().map(|(asset, bytes)| (asset, bytes.as_slice()))
    }

    /// Number of resolved assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Output of [`compose_card`].
#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    /// Background gradient stops, top-left to bottom-right.
    pub gradient: (String, String),
    /// Primitives in paint order.
    pub primitives: Vec<Primitive>,
}

impl CardLayout {
    /// Every distinct asset referenced by the layout, in paint order.
    #[must_use]
    pub fn assets(&self) -> Vec<&AssetRef> {
        let mut out: Vec<&AssetRef> = Vec::new();
        for p in &self.primitives {
            if let Primitive::Image { asset, .. } = p {
                if !out.contains(&asset) {
                    out.push(asset);
                }
            }
        }
        out
    }

    /// Whether a text primitive with exactly this content exists.
    #[must_use]
    pub fn contains_text(&self, needle: &str) -> bool {
        self.primitives
            .iter()
            .any(|p| matches!(p, Primitive::Text { content, .. } if content == needle))
    }

    /// Serialize to SVG, drawn into a `box_width × box_height` box.
    ///
    /// The design space is always mapped onto the box through the viewBox.
    /// Images missing from `assets` are replaced by their fallback.
    #[must_use]
    pub fn to_svg(
        &self,
        box_width: f32,
        box_height: f32,
        assets: &ResolvedAssets,
        transparent: bool,
    ) -> String {
        let mut svg = String::with_capacity(8192);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{box_width}\" height=\"{box_height}\" viewBox=\"0 0 {CARD_WIDTH} {CARD_HEIGHT}\" preserveAspectRatio=\"none\">",
        );

        let (from, to) = &self.gradient;
        let _ = write!(
            svg,
            "<defs><linearGradient id=\"bg\" x1=\"0\" y1=\"0\" x2=\"1\" y2=\"1\"><stop offset=\"0\" stop-color=\"{}\"/><stop offset=\"1\" stop-color=\"{}\"/></linearGradient></defs>",
            escape_xml(from),
            escape_xml(to),
        );
        if !transparent {
            let _ = write!(
                svg,
                "<rect width=\"{CARD_WIDTH}\" height=\"{CARD_HEIGHT}\" fill=\"url(#bg)\"/>"
            );
        }

        for (idx, primitive) in self.primitives.iter().enumerate() {
            render_primitive_svg(&mut svg, idx, primitive, assets);
        }

        svg.push_str("</svg>");
        svg
    }
}

/// Build the layout for a card.
#[must_use]
pub fn compose_card(model: &CardModel) -> CardLayout {
    let mut primitives = Vec::with_capacity(64);

    push_photo(&mut primitives, model);
    push_identity(&mut primitives, model);
    push_tech(&mut primitives, model);
    push_socials(&mut primitives, model);

    CardLayout {
        gradient: model.gradient(),
        primitives,
    }
}

fn push_photo(out: &mut Vec<Primitive>, model: &CardModel) {
    if let Some(photo) = &model.photo {
        out.push(Primitive::Image {
            x: PHOTO_CX - PHOTO_RADIUS,
            y: PHOTO_CY - PHOTO_RADIUS,
            width: PHOTO_RADIUS * 2.0,
            height: PHOTO_RADIUS * 2.0,
            asset: AssetRef::Inline(photo.data_url().to_string()),
            circular: true,
            fallback: None,
        });
    } else {
        out.push(Primitive::Circle {
            cx: PHOTO_CX,
            cy: PHOTO_CY,
            r: PHOTO_RADIUS,
            fill: TEXT_COLOR.into(),
            opacity: 0.15,
            stroke: None,
        });
        // Silhouette: head and shoulders.
        out.push(Primitive::Circle {
            cx: PHOTO_CX,
            cy: PHOTO_CY - 20.0,
            r: 26.0,
            fill: TEXT_COLOR.into(),
            opacity: 0.6,
            stroke: None,
        });
        out.push(Primitive::Path {
            d: format!(
                "M{},{} a48,40 0 0 1 96,0 Z",
                PHOTO_CX - 48.0,
                PHOTO_CY + 58.0
            ),
            fill: TEXT_COLOR.into(),
            opacity: 0.6,
        });
    }
    out.push(Primitive::Circle {
        cx: PHOTO_CX,
        cy: PHOTO_CY,
        r: PHOTO_RADIUS,
        fill: "none".into(),
        opacity: 1.0,
        stroke: Some((TEXT_COLOR.into(), 4.0)),
    });
}

fn push_identity(out: &mut Vec<Primitive>, model: &CardModel) {
    let text = |y, size, weight, opacity, content: &str| Primitive::Text {
        x: PHOTO_CX,
        y,
        size,
        weight,
        fill: TEXT_COLOR.into(),
        opacity,
        anchor: Anchor::Middle,
        content: content.to_string(),
    };

    out.push(text(NAME_Y, 28.0, 700, 1.0, model.name.trim()));
    if !model.role.trim().is_empty() {
        out.push(text(ROLE_Y, 16.0, 500, 0.85, model.role.trim()));
    }

    let max_chars = chars_that_fit(CONTENT_RIGHT - CONTENT_LEFT, BIO_SIZE);
    let mut y = BIO_Y;
    for line in wrap_text(model.bio.trim(), max_chars)
        .into_iter()
        .take(BIO_MAX_LINES)
    {
        out.push(text(y, BIO_SIZE, 400, 0.8, &line));
        y += BIO_LINE_HEIGHT;
    }
}

fn push_tech(out: &mut Vec<Primitive>, model: &CardModel) {
    if model.tech.is_empty() {
        out.push(Primitive::Text {
            x: PHOTO_CX,
            y: TECH_TOP + 60.0,
            size: 14.0,
            weight: 400,
            fill: TEXT_COLOR.into(),
            opacity: 0.6,
            anchor: Anchor::Middle,
            content: EMPTY_TECH_PLACEHOLDER.to_string(),
        });
        return;
    }

    let mut y = TECH_TOP;
    let mut dropped = 0usize;
    for (category, techs) in model.tech.groups() {
        if y + HEADING_SIZE + BADGE_HEIGHT > TECH_BOTTOM {
            dropped += techs.len();
            continue;
        }
        out.push(category_heading(category, y + HEADING_SIZE));
        y += HEADING_SIZE + 6.0;

        let mut x = CONTENT_LEFT;
        for tech in techs {
            let width = badge_width(&tech.name);
            if x + width > CONTENT_RIGHT && x > CONTENT_LEFT {
                x = CONTENT_LEFT;
                y += BADGE_HEIGHT + BADGE_GAP;
            }
            if y + BADGE_HEIGHT > TECH_BOTTOM {
                dropped += 1;
                continue;
            }
            push_badge(out, category, tech, x, y, width);
            x += width + BADGE_GAP;
        }
        y += BADGE_HEIGHT + 12.0;
    }
    if dropped > 0 {
        tracing::debug!(dropped, "Badges overflow the card and were clipped");
    }
}

fn category_heading(category: Category, baseline: f32) -> Primitive {
    Primitive::Text {
        x: CONTENT_LEFT,
        y: baseline,
        size: HEADING_SIZE,
        weight: 700,
        fill: category.accent().into(),
        opacity: 1.0,
        anchor: Anchor::Start,
        content: category.label().to_uppercase(),
    }
}

fn push_badge(
    out: &mut Vec<Primitive>,
    category: Category,
    tech: &card_core::TechRef,
    x: f32,
    y: f32,
    width: f32,
) {
    out.push(Primitive::Rect {
        x,
        y,
        width,
        height: BADGE_HEIGHT,
        radius: BADGE_HEIGHT / 2.0,
        fill: category.accent().into(),
        opacity: 0.25,
    });
    let icon_y = y + (BADGE_HEIGHT - BADGE_ICON) / 2.0;
    match tech.icon {
        Some(icon) => out.push(Primitive::Image {
            x: x + BADGE_PAD,
            y: icon_y,
            width: BADGE_ICON,
            height: BADGE_ICON,
            asset: AssetRef::Path(icon.src.to_string()),
            circular: false,
            fallback: Some(icon.color.to_string()),
        }),
        None => out.push(Primitive::Circle {
            cx: x + BADGE_PAD + BADGE_ICON / 2.0,
            cy: y + BADGE_HEIGHT / 2.0,
            r: BADGE_ICON / 3.0,
            fill: category.accent().into(),
            opacity: 1.0,
            stroke: None,
        }),
    }
    out.push(Primitive::Text {
        x: x + BADGE_PAD + BADGE_ICON + 5.0,
        y: y + BADGE_HEIGHT / 2.0 + BADGE_TEXT_SIZE * 0.35,
        size: BADGE_TEXT_SIZE,
        weight: 500,
        fill: TEXT_COLOR.into(),
        opacity: 1.0,
        anchor: Anchor::Start,
        content: tech.name.clone(),
    });
}

fn push_socials(out: &mut Vec<Primitive>, model: &CardModel) {
    let entries = model.socials.entries();
    if entries.is_empty() {
        return;
    }
    let line = entries
        .iter()
        .map(|(label, value)| format!("{label}: {value}"))
        .collect::<Vec<_>>()
        .join("  ·  ");
    let max_chars = chars_that_fit(CONTENT_RIGHT - CONTENT_LEFT, SOCIALS_SIZE);
    out.push(Primitive::Text {
        x: PHOTO_CX,
        y: SOCIALS_Y,
        size: SOCIALS_SIZE,
        weight: 400,
        fill: TEXT_COLOR.into(),
        opacity: 0.75,
        anchor: Anchor::Middle,
        content: truncate(&line, max_chars),
    });
}

/// Approximate advance of a string at a font size.
#[allow(clippy::cast_precision_loss)]
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.56
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn chars_that_fit(width: f32, size: f32) -> usize {
    (width / (size * 0.56)).floor().max(1.0) as usize
}

fn badge_width(name: &str) -> f32 {
    (BADGE_PAD * 2.0 + BADGE_ICON + 5.0 + text_width(name, BADGE_TEXT_SIZE))
        .min(CONTENT_RIGHT - CONTENT_LEFT)
}

/// Greedy word wrap. Words longer than a line are hard-split.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let len = line.chars().count();
        if len > 0 && len + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.extend(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn render_primitive_svg(svg: &mut String, idx: usize, primitive: &Primitive, assets: &ResolvedAssets) {
    match primitive {
        Primitive::Rect {
            x,
            y,
            width,
            height,
            radius,
            fill,
            opacity,
        } => {
            let _ = write!(
                svg,
                "<rect x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" rx=\"{radius}\" fill=\"{}\" fill-opacity=\"{opacity}\"/>",
                escape_xml(fill),
            );
        }
        Primitive::Circle {
            cx,
            cy,
            r,
            fill,
            opacity,
            stroke,
        } => {
            let _ = write!(
                svg,
                "<circle cx=\"{cx}\" cy=\"{cy}\" r=\"{r}\" fill=\"{}\" fill-opacity=\"{opacity}\"",
                escape_xml(fill),
            );
            if let Some((color, width)) = stroke {
                let _ = write!(
                    svg,
                    " stroke=\"{}\" stroke-width=\"{width}\"",
                    escape_xml(color)
                );
            }
            svg.push_str("/>");
        }
        Primitive::Path { d, fill, opacity } => {
            let _ = write!(
                svg,
                "<path d=\"{}\" fill=\"{}\" fill-opacity=\"{opacity}\"/>",
                escape_xml(d),
                escape_xml(fill),
            );
        }
        Primitive::Text {
            x,
            y,
            size,
            weight,
            fill,
            opacity,
            anchor,
            content,
        } => {
            let _ = write!(
                svg,
                "<text x=\"{x}\" y=\"{y}\" font-size=\"{size}\" font-weight=\"{weight}\" fill=\"{}\" fill-opacity=\"{opacity}\" text-anchor=\"{}\" font-family=\"{FONT_FAMILY}\">{}</text>",
                escape_xml(fill),
                anchor.as_svg(),
                escape_xml(content),
            );
        }
        Primitive::Image {
            x,
            y,
            width,
            height,
            asset,
            circular,
            fallback,
        } => {
            let Some(href) = assets.get(asset).map(embed_href) else {
                if let Some(color) = fallback {
                    let _ = write!(
                        svg,
                        "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\"/>",
                        x + width / 2.0,
                        y + height / 2.0,
                        width.min(*height) / 3.0,
                        escape_xml(color),
                    );
                }
                return;
            };
            let clip = if *circular {
                let _ = write!(
                    svg,
                    "<clipPath id=\"clip{idx}\"><circle cx=\"{}\" cy=\"{}\" r=\"{}\"/></clipPath>",
                    x + width / 2.0,
                    y + height / 2.0,
                    width.min(*height) / 2.0,
                );
                format!(" clip-path=\"url(#clip{idx})\"")
            } else {
                String::new()
            };
            let _ = write!(
                svg,
                "<image x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" preserveAspectRatio=\"xMidYMid slice\" href=\"{}\"{clip}/>",
                escape_xml(&href),
            );
        }
    }
}

/// Re-encode resolved bytes as a data URL the SVG parser can load.
fn embed_href(bytes: &[u8]) -> String {
    let mime = match image::guess_format(bytes) {
        Ok(format) => format.to_mime_type(),
        Err(_) => "image/svg+xml",
    };
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use card_core::CroppedPhoto;

    fn model() -> CardModel {
        let mut model = CardModel::new();
        model.name = "Ada".into();
        model.role = "Engineer".into();
        model
    }

    #[test]
    fn test_empty_tech_shows_placeholder() {
        let layout = compose_card(&model());
        assert!(layout.contains_text(EMPTY_TECH_PLACEHOLDER));
    }

    #[test]
    fn test_selected_tech_hides_placeholder() {
        let mut m = model();
        m.add_tech_by_id("rust").expect("rust");
        let layout = compose_card(&m);
        assert!(!layout.contains_text(EMPTY_TECH_PLACEHOLDER));
        assert!(layout.contains_text("Rust"));
        assert!(layout.contains_text("LANGUAGES"));
        assert!(layout
            .assets()
            .iter()
            .any(|a| matches!(a, AssetRef::Path(p) if p.ends_with("rust.svg"))));
    }

    #[test]
    fn test_missing_photo_uses_silhouette() {
        let layout = compose_card(&model());
        assert!(layout.assets().is_empty());
        assert!(layout
            .primitives
            .iter()
            .any(|p| matches!(p, Primitive::Path { .. })));
    }

    #[test]
    fn test_photo_is_circular_asset() {
        let mut m = model();
        m.photo = CroppedPhoto::from_data_url("data:image/jpeg;base64,/9j/4AAQ");
        let layout = compose_card(&m);
        let photo = layout
            .primitives
            .iter()
            .find(|p| matches!(p, Primitive::Image { .. }))
            .expect("photo primitive");
        assert!(matches!(photo, Primitive::Image { circular: true, asset: AssetRef::Inline(_), .. }));
    }

    #[test]
    fn test_theme_only_changes_gradient() {
        let mut a = model();
        a.add_tech_by_id("go").expect("go");
        let mut b = a.clone();
        b.set_custom_theme("#000000", "#ffffff").expect("theme");

        let (la, lb) = (compose_card(&a), compose_card(&b));
        assert_eq!(la.primitives, lb.primitives);
        assert_ne!(la.gradient, lb.gradient);
    }

    #[test]
    fn test_bio_wraps_within_line_limit() {
        let mut m = model();
        m.bio = "word ".repeat(20);
        let layout = compose_card(&m);
        let bio_lines = layout
            .primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Text { size, .. } if (*size - BIO_SIZE).abs() < f32::EPSILON))
            .count();
        assert!(bio_lines >= 2);
        assert!(bio_lines <= BIO_MAX_LINES);
    }

    #[test]
    fn test_full_selection_stays_inside_card() {
        let mut m = model();
        for id in [
            "javascript", "typescript", "python", "rust", "kotlin",
            "react", "nextjs", "tailwind", "angular", "svelte",
            "tensorflow", "pytorch", "huggingface", "langchain", "scikit",
            "kubernetes", "postgres", "firebase", "docker", "vscode",
        ] {
            m.add_tech_by_id(id).expect("catalog id");
        }
        let layout = compose_card(&m);
        for p in &layout.primitives {
            if let Primitive::Rect { x, y, width, height, .. } = p {
                assert!(*x >= 0.0 && x + width <= CARD_WIDTH);
                assert!(*y >= 0.0 && y + height <= TECH_BOTTOM);
            }
        }
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrap_text("   ", 10).is_empty());
    }

    #[test]
    fn test_svg_escapes_text() {
        let mut m = model();
        m.name = "<Ada & Co>".into();
        let svg = compose_card(&m).to_svg(CARD_WIDTH, CARD_HEIGHT, &ResolvedAssets::new(), false);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("&lt;Ada &amp; Co&gt;"));
        assert!(svg.contains("viewBox=\"0 0 420 650\""));
    }

    #[test]
    fn test_unresolved_icon_falls_back_to_dot() {
        let mut m = model();
        m.add_tech_by_id("rust").expect("rust");
        let svg = compose_card(&m).to_svg(CARD_WIDTH, CARD_HEIGHT, &ResolvedAssets::new(), false);
        assert!(!svg.contains("<image"));
    }

    #[test]
    fn test_transparent_skips_background() {
        let layout = compose_card(&model());
        let opaque = layout.to_svg(CARD_WIDTH, CARD_HEIGHT, &ResolvedAssets::new(), false);
        let clear = layout.to_svg(CARD_WIDTH, CARD_HEIGHT, &ResolvedAssets::new(), true);
        assert!(opaque.contains("fill=\"url(#bg)\""));
        assert!(!clear.contains("fill=\"url(#bg)\""));
    }
}
