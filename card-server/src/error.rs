//! HTTP error mapping.
//!
//! Every failure leaves the server as `{"error": <code>, "message": <text>}`
//! with a status chosen by the failure kind.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use card_core::{LoadError, StoreError, ValidationError};
use card_renderer::RenderError;
use serde::Serialize;
use thiserror::Error;

use crate::validation::InputError;

/// Errors returned by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request body.
    #[error("{0}")]
    BadRequest(String),
    /// The card fails a wizard rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// An id or size is out of range.
    #[error(transparent)]
    Input(#[from] InputError),
    /// Cropping or export failed.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// Reading a card failed.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// Saving a card failed on both stores.
    #[error("Failed to save card: {0}")]
    Save(#[from] StoreError),
    /// Unexpected server fault.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub error: &'static str,
    /// Human readable message.
    pub message: String,
}

impl ApiError {
    /// HTTP status and error code for this error.
    #[must_use]
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            Self::Input(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            Self::Render(e) => match e {
                RenderError::UnsupportedMediaType(_) => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_media_type")
                }
                RenderError::Decode(_) => (StatusCode::BAD_REQUEST, "invalid_image"),
                RenderError::InvalidCrop(_) | RenderError::Crop(_) => {
                    (StatusCode::BAD_REQUEST, "invalid_crop")
                }
                RenderError::CaptureTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "capture_timeout"),
                RenderError::RenderingUnavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "rendering_unavailable")
                }
                RenderError::Capture(_) | RenderError::Encode(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "render_error")
                }
            },
            Self::Load(LoadError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Load(LoadError::Store(_)) => (StatusCode::BAD_GATEWAY, "load_error"),
            Self::Save(_) => (StatusCode::INTERNAL_SERVER_ERROR, "save_error"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::warn!(error = code, "Request failed: {self}");
        } else {
            tracing::debug!(error = code, "Request rejected: {self}");
        }

        let body = ErrorBody {
            error: code,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::BadRequest("x".into()), 400, "bad_request"),
            (
                ApiError::Validation(ValidationError::new("Please enter your name")),
                422,
                "validation_error",
            ),
            (
                ApiError::Input(InputError::CardIdTooLong),
                400,
                "invalid_input",
            ),
            (
                ApiError::Render(RenderError::UnsupportedMediaType("text/plain".into())),
                415,
                "unsupported_media_type",
            ),
            (
                ApiError::Render(RenderError::CaptureTimeout(Duration::from_secs(1))),
                504,
                "capture_timeout",
            ),
            (
                ApiError::Load(LoadError::NotFound("abc".into())),
                404,
                "not_found",
            ),
            (
                ApiError::Load(LoadError::Store(StoreError::Unavailable("down".into()))),
                502,
                "load_error",
            ),
            (
                ApiError::Save(StoreError::Serialization("bad".into())),
                500,
                "save_error",
            ),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (StatusCode::from_u16(status).expect("status"), code));
        }
    }

    #[test]
    fn test_validation_message_is_passed_through() {
        let err = ApiError::from(ValidationError::new("Please enter your name"));
        assert_eq!(err.to_string(), "Please enter your name");
    }

    #[test]
    fn test_error_body_serialization() {
        let body = ErrorBody {
            error: "not_found",
            message: "Card not found: abc".into(),
        };
        let json = serde_json::to_value(&body).expect("should serialize");
        assert_eq!(json["error"], "not_found");
        assert_eq!(json["message"], "Card not found: abc");
    }
}
