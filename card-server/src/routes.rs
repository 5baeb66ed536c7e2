//! Card API handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use card_core::share::{card_url, download_filename, ShareLinks};
use card_core::{
    validate_card, validate_step, CardDocument, CardModel, CropRect, CropTransform, CroppedPhoto,
    SaveOutcome, Step,
};
use card_renderer::image::parse_data_url;
use card_renderer::{
    compute_cropped_image, probe_upload, CardNode, CropEncoding, CropOptions, SourceImage,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::validation::{validate_card_id, validate_export_size, validate_source_size};
use crate::AppState;

/// Encoding requested for a cropped photo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoEncoding {
    /// JPEG at the default quality.
    #[default]
    Jpeg,
    /// Lossless PNG.
    Png,
}

impl From<PhotoEncoding> for CropEncoding {
    fn from(encoding: PhotoEncoding) -> Self {
        match encoding {
            PhotoEncoding::Jpeg => CropEncoding::default(),
            PhotoEncoding::Png => CropEncoding::Png,
        }
    }
}

/// `POST /api/crop` body.
#[derive(Debug, Deserialize)]
pub struct CropPayload {
    /// Uploaded image as a base64 data URL.
    pub photo: String,
    /// Declared MIME type. Defaults to the one embedded in the data URL.
    #[serde(default)]
    pub mime: Option<String>,
    /// Crop in source pixels.
    pub crop: CropRect,
    /// Rotation and flips.
    #[serde(default)]
    pub transform: CropTransform,
    /// Output encoding.
    #[serde(default)]
    pub encoding: PhotoEncoding,
}

/// `POST /api/crop` response.
#[derive(Debug, Serialize)]
pub struct CropResponse {
    /// Cropped photo as a data URL.
    pub photo: CroppedPhoto,
}

/// Crop, rotate and flip an uploaded photo.
///
/// Decoding and drawing are CPU bound and run on the blocking pool.
///
/// # Errors
///
/// Returns `415` for non-image uploads and `400` for undecodable or oversized
/// images and unusable crops. Size is checked from the header, before
/// decoding.
#[tracing::instrument(name = "crop_photo", skip(payload))]
pub async fn crop_photo(
    payload: Result<Json<CropPayload>, JsonRejection>,
) -> Result<Json<CropResponse>, ApiError> {
    let Json(payload) = payload?;
    let options = CropOptions {
        encoding: payload.encoding.into(),
        ..CropOptions::default()
    };

    let photo = tokio::task::spawn_blocking(move || -> Result<CroppedPhoto, ApiError> {
        let (embedded_mime, bytes) = parse_data_url(&payload.photo)?;
        let mime = payload.mime.as_deref().unwrap_or(&embedded_mime);
        let info = probe_upload(mime, &bytes)?;
        validate_source_size(info.width, info.height)?;
        tracing::debug!(
            format = ?info.format,
            width = info.width,
            height = info.height,
            "Decoding upload"
        );
        let source = SourceImage::from_bytes(&bytes)?;
        Ok(compute_cropped_image(
            &source,
            &payload.crop,
            &payload.transform,
            &options,
        )?)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("crop task failed: {e}")))??;

    Ok(Json(CropResponse { photo }))
}

/// `POST /api/cards/validate` body.
#[derive(Debug, Deserialize)]
pub struct ValidatePayload {
    /// Step being left.
    pub step: Step,
    /// Current card.
    pub card: CardModel,
}

/// `POST /api/cards/validate` response.
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    /// Whether the step may be left.
    pub ok: bool,
    /// Message to show next to the step, when not ok.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Check whether a wizard step may be left.
///
/// # Errors
///
/// Returns `400` only for malformed bodies; rule failures answer `ok: false`.
#[tracing::instrument(name = "validate_step", skip(payload))]
pub async fn validate_card_step(
    payload: Result<Json<ValidatePayload>, JsonRejection>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let Json(payload) = payload?;
    let response = match validate_step(payload.step, &payload.card) {
        Ok(()) => ValidateResponse {
            ok: true,
            error: None,
        },
        Err(e) => ValidateResponse {
            ok: false,
            error: Some(e.message),
        },
    };
    Ok(Json(response))
}

/// `POST /api/cards/export` body.
#[derive(Debug, Deserialize)]
pub struct ExportPayload {
    /// Card to render.
    pub card: CardModel,
    /// Output width. Defaults to the configured export width.
    #[serde(default)]
    pub width: Option<u32>,
    /// Output height. Defaults to the configured export height.
    #[serde(default)]
    pub height: Option<u32>,
}

/// Render a card to a PNG of exactly the requested size.
///
/// # Errors
///
/// Returns `400` for out-of-range sizes or an invalid card, `500` when a
/// referenced image fails to load and `504` when images do not load in time.
#[tracing::instrument(name = "export_card", skip(state, payload))]
pub async fn export_card(
    State(state): State<AppState>,
    payload: Result<Json<ExportPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let (default_width, default_height) = state.config.export_size();
    let width = payload.width.unwrap_or(default_width);
    let height = payload.height.unwrap_or(default_height);
    validate_export_size(width, height)?;

    let model = payload.card.with_catalog_icons();
    let mut node = CardNode::new(&model);
    let exported = state.exporter.export_card(&mut node, width, height).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        download_filename(&model.name)
    );
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| ApiError::Internal(format!("invalid download filename: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        exported.png,
    ))
}

/// `POST /api/cards` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    /// Card to save.
    pub card: CardModel,
    /// Whether an image was exported before saving.
    #[serde(default)]
    pub image_generated: bool,
}

/// `POST /api/cards` response.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    /// Id, fallback flag and warning.
    #[serde(flatten)]
    pub outcome: SaveOutcome,
    /// Canonical card URL.
    pub url: String,
    /// Share targets.
    pub share: ShareLinks,
}

/// Validate and save a card.
///
/// A remote store failure still answers `201` with a `local-` id and a
/// warning.
///
/// # Errors
///
/// Returns `422` with the first failing wizard rule, or `500` when neither
/// store accepted the card.
#[tracing::instrument(name = "save_card", skip(state, payload))]
pub async fn save_card(
    State(state): State<AppState>,
    payload: Result<Json<SavePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<SaveResponse>), ApiError> {
    let Json(payload) = payload?;
    validate_card(&payload.card)?;

    let outcome = state
        .repository
        .save(&payload.card, payload.image_generated)
        .await?;

    let origin = state.config.public_origin();
    let response = SaveResponse {
        url: card_url(&origin, &outcome.id),
        share: ShareLinks::new(&origin, &outcome.id),
        outcome,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Fetch a saved card.
///
/// # Errors
///
/// Returns `404` for unknown ids and `502` when the store cannot be read.
#[tracing::instrument(name = "get_card", skip(state))]
pub async fn get_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CardDocument>, ApiError> {
    validate_card_id(&id)?;
    let document = state.repository.load(&id).await?;
    Ok(Json(document))
}

/// Share links for a saved card.
///
/// # Errors
///
/// Same as [`get_card`].
#[tracing::instrument(name = "share_card", skip(state))]
pub async fn share_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ShareLinks>, ApiError> {
    validate_card_id(&id)?;
    state.repository.load(&id).await?;
    Ok(Json(ShareLinks::new(&state.config.public_origin(), &id)))
}
