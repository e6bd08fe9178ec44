// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request ticket creation and reads for authenticated clients.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use vestibule_core::types::{Attachment, RequestTicket, RequestType};
use vestibule_core::VestibuleError;
use vestibule_storage::database::now_timestamp;
use vestibule_storage::queries::{projects, requests};

use crate::auth::AuthedAccount;
use crate::error::{validation_error, ApiError};
use crate::state::AppState;

/// Body for `POST /api/requests`.
#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    pub project_id: String,
    pub request_type: RequestType,
    pub description: String,
    pub impact: String,
    pub urgency: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// POST /api/requests
///
/// Creates one immutable ticket. The target project must belong to the
/// authenticated account and the description must be non-empty.
pub async fn create_request(
    State(state): State<AppState>,
    Extension(account): Extension<AuthedAccount>,
    Json(body): Json<CreateRequestBody>,
) -> Result<Response, ApiError> {
    if body.description.trim().is_empty() {
        return Ok(validation_error("missing_fields", &["description"]));
    }

    projects::get_project(&state.db, &account.account_id, &body.project_id)
        .await?
        .ok_or_else(|| VestibuleError::NotFound(format!("project {}", body.project_id)))?;

    let request = RequestTicket {
        id: uuid::Uuid::new_v4().to_string(),
        project_id: body.project_id,
        request_type: body.request_type,
        description: body.description,
        impact: body.impact,
        urgency: body.urgency,
        attachments: body.attachments,
        created_at: now_timestamp(),
    };
    requests::insert_request(&state.db, &account.account_id, &request).await?;

    tracing::info!(request_id = %request.id, account_id = %account.account_id, "request created");
    Ok(Json(json!({ "id": request.id })).into_response())
}

/// Query for `GET /api/requests`.
#[derive(Debug, Deserialize)]
pub struct ListRequestsQuery {
    pub project_id: String,
}

/// GET /api/requests?project_id={id}
///
/// Lists the account's tickets for one of its projects, oldest first.
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(account): Extension<AuthedAccount>,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Response, ApiError> {
    projects::get_project(&state.db, &account.account_id, &query.project_id)
        .await?
        .ok_or_else(|| VestibuleError::NotFound(format!("project {}", query.project_id)))?;

    let requests =
        requests::list_requests(&state.db, &account.account_id, &query.project_id).await?;
    Ok(Json(json!({ "requests": requests })).into_response())
}

/// GET /api/requests/{id}
pub async fn get_request(
    State(state): State<AppState>,
    Extension(account): Extension<AuthedAccount>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let request = requests::get_request(&state.db, &account.account_id, &id)
        .await?
        .ok_or_else(|| VestibuleError::NotFound(format!("request {id}")))?;
    Ok(Json(request).into_response())
}
