// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Project listing for authenticated clients.

use axum::{extract::State, Extension, Json};
use serde::Serialize;
use vestibule_core::types::Project;
use vestibule_storage::queries::projects;

use crate::auth::AuthedAccount;
use crate::error::ApiError;
use crate::state::AppState;

/// Response body for `GET /api/projects`.
#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
}

/// GET /api/projects
///
/// Lists the projects owned by the bearer token's account.
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(account): Extension<AuthedAccount>,
) -> Result<Json<ProjectListResponse>, ApiError> {
    let projects = projects::list_projects(&state.db, &account.account_id).await?;
    Ok(Json(ProjectListResponse { projects }))
}
