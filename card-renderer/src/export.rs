//! Card export to PNG at an exact pixel size.
//!
//! Renders a [`CardNode`] through an SVG intermediate and the resvg/tiny-skia
//! pipeline. The output size depends only on the requested target, never on
//! the node's on-screen size or the display's pixel ratio.

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tiny_skia::{Color, Pixmap, Transform};

use crate::compose::{AssetRef, ResolvedAssets};
use crate::error::{RenderError, RenderResult};
use crate::image::{parse_data_url, to_data_url};
use crate::node::{CardNode, ScopedStyle};

/// Default time allowed for resolving a card's images.
pub const DEFAULT_ASSET_TIMEOUT: Duration = Duration::from_secs(10);

/// Default export size: 3× the design reference.
pub const DEFAULT_EXPORT_SIZE: (u32, u32) = (1260, 1950);

/// Fetches the bytes behind an [`AssetRef`].
#[async_trait]
pub trait AssetResolver: Send + Sync {
    /// Resolve an asset.
    ///
    /// `Ok(None)` means this resolver does not serve that kind of asset and
    /// the card draws its fallback.
    ///
    /// # Errors
    ///
    /// Returns an error if a served asset cannot be loaded; the capture is
    /// aborted.
    async fn resolve(&self, asset: &AssetRef) -> RenderResult<Option<Vec<u8>>>;
}

/// Resolves inline `data:` URLs only.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineAssetResolver;

#[async_trait]
impl AssetResolver for InlineAssetResolver {
    async fn resolve(&self, asset: &AssetRef) -> RenderResult<Option<Vec<u8>>> {
        match asset {
            AssetRef::Inline(uri) => decode_inline(uri).map(Some),
            AssetRef::Path(_) => Ok(None),
        }
    }
}

/// Resolves inline data plus relative paths under a directory.
///
/// A referenced file that is missing or outside the root fails the capture.
#[derive(Debug, Clone)]
pub struct DirAssetResolver {
    root: PathBuf,
}

impl DirAssetResolver {
    /// Serve assets from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        // No escaping the asset root.
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl AssetResolver for DirAssetResolver {
    async fn resolve(&self, asset: &AssetRef) -> RenderResult<Option<Vec<u8>>> {
        match asset {
            AssetRef::Inline(uri) => decode_inline(uri).map(Some),
            AssetRef::Path(relative) => {
                let Some(path) = self.path_for(relative) else {
                    tracing::warn!("Rejected asset path outside root: {relative}");
                    return Err(RenderError::Capture(format!(
                        "asset path {relative} is outside the asset root"
                    )));
                };
                tokio::fs::read(&path).await.map(Some).map_err(|e| {
                    RenderError::Capture(format!("Failed to read {}: {e}", path.display()))
                })
            }
        }
    }
}

fn decode_inline(uri: &str) -> RenderResult<Vec<u8>> {
    let (_, bytes) =
        parse_data_url(uri).map_err(|e| RenderError::Capture(format!("Inline image: {e}")))?;
    Ok(bytes)
}

/// Configuration for card export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Time allowed for resolving every image of the card.
    pub asset_timeout: Duration,
    /// Leave the background transparent instead of painting the card.
    pub transparent_background: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            asset_timeout: DEFAULT_ASSET_TIMEOUT,
            transparent_background: false,
        }
    }
}

/// A captured card.
#[derive(Debug, Clone)]
pub struct ExportedCard {
    /// PNG bytes.
    pub png: Vec<u8>,
    /// Width in pixels.
    pub pixel_width: u32,
    /// Height in pixels.
    pub pixel_height: u32,
}

impl ExportedCard {
    /// The PNG as a `data:` URL.
    #[must_use]
    pub fn png_data_url(&self) -> String {
        to_data_url("image/png", &self.png)
    }
}

/// Exports card nodes to PNG.
///
/// At most one export runs at a time per exporter.
pub struct CardExporter {
    config: ExportConfig,
    resolver: Arc<dyn AssetResolver>,
    in_flight: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for CardExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardExporter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CardExporter {
    /// Create an exporter.
    #[must_use]
    pub fn new(config: ExportConfig, resolver: Arc<dyn AssetResolver>) -> Self {
        Self {
            config,
            resolver,
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Exporter with default configuration resolving inline images only.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default(), Arc::new(InlineAssetResolver))
    }

    /// Exporter configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Capture `node` as a `target_width × target_height` PNG.
    ///
    /// The node is forced to the design size for the duration of the capture
    /// and its inline style is restored afterwards, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::CaptureTimeout`] if images do not resolve in
    /// time, [`RenderError::Capture`] if resolution or encoding fails and
    /// [`RenderError::RenderingUnavailable`] if no surface can be allocated.
    pub async fn export_card(
        &self,
        node: &mut CardNode,
        target_width: u32,
        target_height: u32,
    ) -> RenderResult<ExportedCard> {
        if target_width == 0 || target_height == 0 {
            return Err(RenderError::Capture(format!(
                "target size {target_width}x{target_height} has no pixels"
            )));
        }
        let _single = self.in_flight.lock().await;
        tracing::debug!(
            screen_px = ?node.screen_pixels(),
            export_px = ?(target_width, target_height),
            "Capturing card"
        );

        let CardNode { layout, style, .. } = node;
        let guard = ScopedStyle::for_export(style);
        let box_size = forced_box(&guard);

        let assets = self.resolve_assets(layout.assets()).await?;
        let transparent = self.config.transparent_background;
        let svg = layout.to_svg(box_size.0, box_size.1, &assets, transparent);
        let background = if transparent {
            Color::TRANSPARENT
        } else {
            Color::WHITE
        };

        let png = tokio::task::spawn_blocking(move || -> RenderResult<Vec<u8>> {
            for (asset, bytes) in assets.iter() {
                check_loadable(asset, bytes)?;
            }
            let pixmap = rasterize_svg(&svg, target_width, target_height, background)?;
            pixmap
                .encode_png()
                .map_err(|e| RenderError::Capture(format!("PNG encoding failed: {e}")))
        })
        .await
        .map_err(|e| RenderError::Capture(format!("capture task failed: {e}")))??;
        drop(guard);

        tracing::info!(
            width = target_width,
            height = target_height,
            bytes = png.len(),
            "Card exported"
        );
        Ok(ExportedCard {
            png,
            pixel_width: target_width,
            pixel_height: target_height,
        })
    }

    async fn resolve_assets(&self, wanted: Vec<&AssetRef>) -> RenderResult<ResolvedAssets> {
        let timeout = self.config.asset_timeout;
        let fetch = async {
            let mut resolved = ResolvedAssets::new();
            for asset in wanted {
                if let Some(bytes) = self.resolver.resolve(asset).await? {
                    resolved.insert(asset.clone(), bytes);
                }
            }
            Ok::<_, RenderError>(resolved)
        };

        match tokio::time::timeout(timeout, fetch).await {
            Ok(Ok(resolved)) => Ok(resolved),
            Ok(Err(e @ (RenderError::Capture(_) | RenderError::CaptureTimeout(_)))) => {
                tracing::warn!("Card asset resolution failed: {e}");
                Err(e)
            }
            Ok(Err(other)) => {
                tracing::warn!("Card asset resolution failed: {other}");
                Err(RenderError::Capture(other.to_string()))
            }
            Err(_) => {
                tracing::warn!("Card asset resolution timed out after {timeout:?}");
                Err(RenderError::CaptureTimeout(timeout))
            }
        }
    }
}

/// Fail unless the rasterizer can actually load `bytes`.
///
/// resvg skips images it cannot decode, so this runs before rendering.
fn check_loadable(asset: &AssetRef, bytes: &[u8]) -> RenderResult<()> {
    let loaded = if image::guess_format(bytes).is_ok() {
        image::load_from_memory(bytes).map(drop).map_err(|e| e.to_string())
    } else {
        usvg::Tree::from_data(bytes, &usvg::Options::default())
            .map(drop)
            .map_err(|e| e.to_string())
    };
    loaded.map_err(|e| {
        tracing::warn!("Card asset {} cannot be loaded: {e}", asset.label());
        RenderError::Capture(format!("{} is not a loadable image: {e}", asset.label()))
    })
}

fn forced_box(style: &crate::node::InlineStyle) -> (f32, f32) {
    (
        style.px("width").unwrap_or(crate::compose::CARD_WIDTH),
        style.px("height").unwrap_or(crate::compose::CARD_HEIGHT),
    )
}

fn font_db() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "Loaded system fonts");
            Arc::new(db)
        })
        .clone()
}

/// Rasterize an SVG into a pixmap of exactly `width × height`.
#[allow(clippy::cast_precision_loss)]
fn rasterize_svg(svg: &str, width: u32, height: u32, background: Color) -> RenderResult<Pixmap> {
    let opt = usvg::Options {
        fontdb: font_db(),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(svg, &opt)
        .map_err(|e| RenderError::Capture(format!("SVG parsing failed: {e}")))?;

    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        RenderError::RenderingUnavailable(format!("cannot allocate {width}x{height} surface"))
    })?;
    pixmap.fill(background);

    let size = tree.size();
    let scale = Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, scale, &mut pixmap.as_mut());

    Ok(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{compose_card, CARD_HEIGHT, CARD_WIDTH};
    use card_core::CardModel;

    #[test]
    fn test_dir_resolver_rejects_escapes() {
        let resolver = DirAssetResolver::new("/srv/icons");
        assert!(resolver.path_for("../etc/passwd").is_none());
        assert!(resolver.path_for("/etc/passwd").is_none());
        assert_eq!(
            resolver.path_for("icons/rust.svg"),
            Some(PathBuf::from("/srv/icons/icons/rust.svg"))
        );
    }

    #[test]
    fn test_rasterize_exact_size() {
        let layout = compose_card(&CardModel::new());
        let svg = layout.to_svg(CARD_WIDTH, CARD_HEIGHT, &ResolvedAssets::new(), false);
        let pixmap = rasterize_svg(&svg, 840, 1300, Color::WHITE).expect("raster");
        assert_eq!((pixmap.width(), pixmap.height()), (840, 1300));
        assert!(pixmap.pixels().iter().all(|p| p.alpha() == 255));
    }

    #[test]
    fn test_check_loadable() {
        let icon = AssetRef::Path("icons/rust.svg".into());
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"/>"#;
        assert!(check_loadable(&icon, svg).is_ok());
        assert!(matches!(
            check_loadable(&icon, b"404 page not found"),
            Err(RenderError::Capture(_))
        ));

        let mut png = std::io::Cursor::new(Vec::new());
        image::RgbaImage::new(2, 2)
            .write_to(&mut png, image::ImageFormat::Png)
            .expect("encode");
        let photo = AssetRef::Inline(String::new());
        assert!(check_loadable(&photo, png.get_ref()).is_ok());

        // A PNG signature followed by junk is still not loadable.
        let truncated = &png.get_ref()[..12];
        assert!(matches!(
            check_loadable(&photo, truncated),
            Err(RenderError::Capture(msg)) if msg.starts_with("inline photo")
        ));
    }

    #[tokio::test]
    async fn test_inline_resolver_skips_paths() {
        let resolver = InlineAssetResolver;
        let path = AssetRef::Path("icons/rust.svg".into());
        assert!(resolver.resolve(&path).await.expect("resolve").is_none());

        let inline = AssetRef::Inline(to_data_url("image/png", &[1, 2, 3]));
        assert_eq!(
            resolver.resolve(&inline).await.expect("resolve"),
            Some(vec![1, 2, 3])
        );
    }

    #[tokio::test]
    async fn test_zero_target_is_rejected() {
        let exporter = CardExporter::with_defaults();
        let mut node = CardNode::new(&CardModel::new());
        let err = exporter
            .export_card(&mut node, 0, 100)
            .await
            .expect_err("empty target");
        assert!(matches!(err, RenderError::Capture(_)));
    }
}
