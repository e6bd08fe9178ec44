// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OTP challenge issuance and verification.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use vestibule_core::{fields, VestibuleError};
use vestibule_storage::database::now_timestamp;
use vestibule_storage::models::{Account, AuthChallenge, AuthToken};
use vestibule_storage::queries::auth as auth_queries;

use crate::auth::check_captcha;
use crate::error::{validation_error, ApiError};
use crate::state::AppState;

/// Body for `POST /api/auth/request-otp`.
#[derive(Debug, Deserialize)]
pub struct RequestOtpBody {
    pub email: String,
}

/// Body for `POST /api/auth/verify-otp`.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpBody {
    pub challenge_id: String,
    pub code: String,
}

/// POST /api/auth/request-otp
///
/// Creates a challenge for the email and returns its id. The code is
/// delivered out of band; `auth.debug_echo_code` echoes it in the response
/// for development setups only.
pub async fn request_otp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RequestOtpBody>,
) -> Result<Response, ApiError> {
    check_captcha(&state, &headers)?;

    let email = body.email.trim().to_ascii_lowercase();
    if !fields::validate_email(&email) {
        return Ok(validation_error("invalid_email", &["email"]));
    }

    let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32));
    let challenge = AuthChallenge {
        id: uuid::Uuid::new_v4().to_string(),
        email,
        code,
        consumed: false,
        created_at: now_timestamp(),
    };
    auth_queries::create_challenge(&state.db, &challenge).await?;

    tracing::info!(challenge_id = %challenge.id, "otp challenge issued");
    let mut response = json!({ "challenge_id": challenge.id });
    if state.config.auth.debug_echo_code {
        response["dev_code"] = json!(challenge.code);
    }
    Ok(Json(response).into_response())
}

/// POST /api/auth/verify-otp
///
/// Consumes the challenge exactly once. On a match, resolves (or creates)
/// the account for the challenge email and issues a bearer token scoped to
/// it. Mismatch and reuse both fail and leave the challenge unusable.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpBody>,
) -> Result<Response, ApiError> {
    let email = auth_queries::consume_challenge(&state.db, &body.challenge_id, &body.code)
        .await?
        .ok_or_else(|| VestibuleError::Auth("invalid or consumed challenge".to_string()))?;

    let account = auth_queries::upsert_account(
        &state.db,
        &Account {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.clone(),
            created_at: now_timestamp(),
        },
    )
    .await?;

    let token = AuthToken {
        token: uuid::Uuid::new_v4().to_string(),
        account_id: account.id.clone(),
        email,
        created_at: now_timestamp(),
    };
    auth_queries::insert_token(&state.db, &token).await?;

    tracing::info!(account_id = %account.id, "otp verified, token issued");
    Ok(Json(json!({
        "token": token.token,
        "account_id": account.id,
    }))
    .into_response())
}
