//! # Tech Card Core
//!
//! Core logic for the Tech Card Builder: the card model, the crop interaction
//! surface, the step wizard and the persistence adapter. Image decoding and
//! rasterization live in `card-renderer`; this crate has no pixel dependencies.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 card-core                   │
//! ├─────────────────────────────────────────────┤
//! │  Card Model      │  Crop Session            │
//! │  - Tech stack    │  - Pan / zoom / rotate   │
//! │  - Theme         │  - Frame throttling      │
//! │  - Socials       │  - CropRect in source px │
//! ├─────────────────────────────────────────────┤
//! │  Wizard          │  Persistence             │
//! │  - Step rules    │  - Remote document store │
//! │  - Profanity     │  - Local fallback store  │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod card;
pub mod catalog;
pub mod crop;
pub mod document;
pub mod error;
pub mod profanity;
pub mod share;
pub mod store;
pub mod wizard;

pub use card::{
    CardModel, CroppedPhoto, Socials, TechSelection, Theme, MAX_BIO_LEN, MAX_NAME_LEN,
    MAX_ROLE_LEN, MAX_TECH_PER_CATEGORY,
};
pub use catalog::{Category, IconRef, TechRef};
pub use crop::{CropRect, CropRequest, CropSession, CropState, CropTransform, FrameThrottle};
pub use document::{CardDocument, StoredTech};
pub use error::{CardError, CardResult, CropError, ValidationError};
pub use store::{
    CardRepository, DocumentStore, FallbackStore, LoadError, MemoryDocumentStore, SaveOutcome,
    StoreError,
};
pub use wizard::{validate_card, validate_step, CardWizard, Step};

/// Card core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
