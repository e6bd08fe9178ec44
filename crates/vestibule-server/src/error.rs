// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error-to-response mapping for the HTTP surface.
//!
//! Validation errors render as `422` with a `detail` object the client can
//! use to highlight offending fields; auth maps to `401`, missing resources
//! to `404`, and everything else to an opaque `500`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use vestibule_core::VestibuleError;

/// Wrapper that renders `VestibuleError` as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub VestibuleError);

impl From<VestibuleError> for ApiError {
    fn from(err: VestibuleError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            VestibuleError::MissingFields { state, fields } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "detail": {
                        "error": "missing_fields",
                        "state": state,
                        "fields": fields,
                    }
                })),
            )
                .into_response(),
            VestibuleError::UploadRejected(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "detail": { "error": "upload_rejected", "message": message }
                })),
            )
                .into_response(),
            VestibuleError::InvalidInput(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "detail": { "error": "invalid_input", "message": message }
                })),
            )
                .into_response(),
            VestibuleError::Auth(message) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "detail": { "error": "auth", "message": message }
                })),
            )
                .into_response(),
            VestibuleError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "detail": { "error": "not_found", "message": message }
                })),
            )
                .into_response(),
            other => {
                tracing::error!(error = %other, "internal error serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "detail": { "error": "internal" }
                    })),
                )
                    .into_response()
            }
        }
    }
}

/// A `422` validation rejection that is not tied to a conversation step,
/// e.g. a malformed email on the OTP request or an empty request description.
pub fn validation_error(error: &str, fields: &[&str]) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "detail": { "error": error, "fields": fields }
        })),
    )
        .into_response()
}
