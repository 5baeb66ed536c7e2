//! # Tech Card Renderer
//!
//! Pixel pipeline for the Tech Card Builder, built on tiny-skia and resvg.
//!
//! ## Pipeline
//!
//! ```text
//! upload ──▶ SourceImage ──▶ PhotoCropper ──▶ geometry ──▶ CroppedPhoto
//!                                                              │
//! CardModel ◀──────────────────────────────────────────────────┘
//!     │
//!     ▼
//! compose ──▶ CardLayout ──▶ CardNode ──▶ CardExporter ──▶ PNG (exact size)
//!                                            │
//!                                      AssetResolver
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod compose;
pub mod cropper;
pub mod error;
pub mod export;
pub mod geometry;
pub mod image;
pub mod node;

pub use compose::{compose_card, AssetRef, CardLayout, Primitive, CARD_HEIGHT, CARD_WIDTH};
pub use cropper::PhotoCropper;
pub use error::{RenderError, RenderResult};
pub use export::{
    AssetResolver, CardExporter, DirAssetResolver, ExportConfig, ExportedCard,
    InlineAssetResolver,
};
pub use geometry::{compute_cropped_image, render_crop, CropEncoding, CropOptions};
pub use image::{probe_upload, SourceImage, UploadInfo};
pub use node::{CardNode, InlineStyle, ScopedStyle, Viewport};
