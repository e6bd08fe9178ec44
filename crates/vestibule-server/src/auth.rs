// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token middleware and the anti-automation header check.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use vestibule_core::VestibuleError;

use crate::error::ApiError;
use crate::state::AppState;

/// Identity resolved from a bearer token, inserted into request extensions
/// for the authenticated handlers.
#[derive(Debug, Clone)]
pub struct AuthedAccount {
    pub account_id: String,
    pub email: String,
}

/// Middleware guarding the project and request endpoints.
///
/// Requires `Authorization: Bearer <token>` where the token exists in the
/// store and is younger than `auth.token_ttl_secs`. Expiry is evaluated at
/// lookup time; there is no refresh, callers re-run the OTP flow.
pub async fn bearer_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| VestibuleError::Auth("missing bearer token".to_string()))?;

    let stored = vestibule_storage::queries::auth::get_token(&state.db, token)
        .await?
        .ok_or_else(|| VestibuleError::Auth("unknown token".to_string()))?;

    let issued = chrono::DateTime::parse_from_rfc3339(&stored.created_at)
        .map_err(|_| VestibuleError::Auth("malformed token record".to_string()))?;
    let age = chrono::Utc::now().signed_duration_since(issued);
    if age.num_seconds() < 0 || age.num_seconds() as u64 > state.config.auth.token_ttl_secs {
        return Err(VestibuleError::Auth("token expired".to_string()).into());
    }

    request.extensions_mut().insert(AuthedAccount {
        account_id: stored.account_id,
        email: stored.email,
    });
    Ok(next.run(request).await)
}

/// Validate the `X-Captcha-Token` header on sensitive unauthenticated calls.
///
/// A no-op unless `server.captcha_token` is configured.
pub fn check_captcha(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = &state.config.server.captcha_token else {
        return Ok(());
    };
    let supplied = headers
        .get("x-captcha-token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if supplied == expected {
        Ok(())
    } else {
        Err(VestibuleError::Auth("captcha token missing or invalid".to_string()).into())
    }
}
