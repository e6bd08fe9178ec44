// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state.

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use vestibule_core::VestibuleError;

use crate::auth::bearer_auth;
use crate::handlers;
use crate::state::AppState;

/// Build the application router.
///
/// Conversation, auth, and presign routes are public (the captcha header
/// check happens inside the sensitive handlers); project and request routes
/// sit behind the bearer middleware.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route(
            "/api/conversations",
            post(handlers::conversations::create_conversation),
        )
        .route(
            "/api/conversations/{id}",
            get(handlers::conversations::get_conversation),
        )
        .route(
            "/api/conversations/{id}/message",
            post(handlers::conversations::post_message),
        )
        .route(
            "/api/conversations/{id}/end-and-send",
            post(handlers::conversations::end_and_send),
        )
        .route("/api/auth/request-otp", post(handlers::auth::request_otp))
        .route("/api/auth/verify-otp", post(handlers::auth::verify_otp))
        .route("/api/uploads/presign", post(handlers::uploads::presign))
        .with_state(state.clone());

    let authed_routes = Router::new()
        .route("/api/projects", get(handlers::projects::list_projects))
        .route(
            "/api/requests",
            post(handlers::requests::create_request).get(handlers::requests::list_requests),
        )
        .route("/api/requests/{id}", get(handlers::requests::get_request))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            bearer_auth,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(authed_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped.
pub async fn start_server(host: &str, port: u16, state: AppState) -> Result<(), VestibuleError> {
    let app = build_router(state);

    let addr = format!("{host}:{port}");
    let listener =
        tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| VestibuleError::Transport {
                message: format!("failed to bind to {addr}: {e}"),
                source: Some(Box::new(e)),
            })?;

    tracing::info!("listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| VestibuleError::Transport {
            message: format!("server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
