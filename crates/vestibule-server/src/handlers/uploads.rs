// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upload presign: phase one of the two-phase attachment workflow.
//!
//! The byte transfer itself goes straight to the storage backend at the
//! returned `upload_url`; this service only admits or rejects the declared
//! file.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use vestibule_core::upload::sanitize_file_name;

use crate::error::ApiError;
use crate::state::AppState;

/// Body for `POST /api/uploads/presign`.
#[derive(Debug, Deserialize)]
pub struct PresignRequest {
    pub file_name: String,
    pub content_type: String,
    pub content_length: u64,
    /// Present when the upload belongs to a conversation rather than an
    /// authenticated request.
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Response for a granted presign.
#[derive(Debug, Serialize)]
pub struct PresignResponse {
    pub upload_url: String,
    pub file_url: String,
    pub key: String,
}

/// POST /api/uploads/presign
///
/// Validates declared type and size against the configured policy; the
/// actual transferred bytes are the storage backend's problem.
pub async fn presign(
    State(state): State<AppState>,
    Json(body): Json<PresignRequest>,
) -> Result<Json<PresignResponse>, ApiError> {
    state
        .upload_policy()
        .validate(&body.content_type, body.content_length)?;

    let key = format!(
        "uploads/{}/{}",
        uuid::Uuid::new_v4(),
        sanitize_file_name(&body.file_name)
    );
    let upload_url = format!(
        "{}/{key}",
        state.config.uploads.upload_base_url.trim_end_matches('/')
    );
    let file_url = format!(
        "{}/{key}",
        state.config.uploads.public_base_url.trim_end_matches('/')
    );

    tracing::debug!(
        key,
        conversation_id = body.conversation_id.as_deref().unwrap_or("-"),
        "presign granted"
    );
    Ok(Json(PresignResponse {
        upload_url,
        file_url,
        key,
    }))
}
