// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end route tests against an in-process router with a temp database.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use vestibule_config::VestibuleConfig;
use vestibule_server::{build_router, AppState};
use vestibule_storage::Database;

async fn setup() -> (Router, AppState, tempfile::TempDir) {
    setup_with(|_| {}).await
}

async fn setup_with(customize: impl FnOnce(&mut VestibuleConfig)) -> (Router, AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

    let mut config = VestibuleConfig::default();
    config.auth.debug_echo_code = true;
    customize(&mut config);

    let state = AppState::new(db, config);
    (build_router(state.clone()), state, dir)
}

async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    call_with_headers(router, method, uri, body, &[]).await
}

async fn call_with_headers(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_conversation(router: &Router) -> String {
    let (status, body) = call(
        router,
        "POST",
        "/api/conversations",
        Some(json!({ "channel": "web" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "WELCOME");
    body["id"].as_str().unwrap().to_string()
}

async fn post_message(router: &Router, id: &str, fields: Value) -> (StatusCode, Value) {
    call(
        router,
        "POST",
        &format!("/api/conversations/{id}/message"),
        Some(json!({ "sender_type": "contact", "body": "answer", "fields": fields })),
    )
    .await
}

#[tokio::test]
async fn health_is_public() {
    let (router, _state, _dir) = setup().await;
    let (status, body) = call(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn conversation_walks_the_full_step_sequence() {
    let (router, _state, _dir) = setup().await;
    let id = create_conversation(&router).await;

    let steps: Vec<(Value, &str)> = vec![
        (json!({}), "MODE_SELECT"),
        (json!({ "mode": "prospect" }), "IDENTITY"),
        (
            json!({ "full_name": "Jane Doe", "email": "jane@x.com", "phone": "" }),
            "BUSINESS_CONTEXT",
        ),
        (json!({ "business_name": "Acme" }), "NEEDS"),
        (json!({ "needs_summary": "New site" }), "SCHEDULING"),
        (
            json!({ "preferred_times": "Tue 2-4pm", "timezone": "America/Chicago" }),
            "SUMMARY",
        ),
        (json!({ "summary": "ready" }), "SUBMIT"),
    ];

    for (fields, expected_state) in steps {
        let (status, body) = post_message(&router, &id, fields).await;
        assert_eq!(status, StatusCode::OK, "body: {body}");
        assert_eq!(body["state"], expected_state);
    }

    let (status, body) = call(&router, "GET", &format!("/api/conversations/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "SUBMIT");
    assert_eq!(body["normalized_fields"]["full_name"], "Jane Doe");
    assert_eq!(body["messages"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn invalid_mutation_is_rejected_and_state_unchanged() {
    let (router, _state, _dir) = setup().await;
    let id = create_conversation(&router).await;

    post_message(&router, &id, json!({})).await;
    post_message(&router, &id, json!({ "mode": "prospect" })).await;

    // Missing email at IDENTITY.
    let (status, body) = post_message(&router, &id, json!({ "full_name": "Jane Doe" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"]["error"], "missing_fields");
    assert_eq!(body["detail"]["state"], "IDENTITY");
    assert_eq!(body["detail"]["fields"], json!(["email"]));

    let (_, fetched) = call(&router, "GET", &format!("/api/conversations/{id}"), None).await;
    assert_eq!(fetched["state"], "IDENTITY");
    // The rejected delta never reached the bag or the transcript.
    assert!(fetched["normalized_fields"].get("full_name").is_none());
    assert_eq!(fetched["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn concurrent_mutations_on_one_conversation_serialize() {
    let (router, _state, _dir) = setup().await;
    let id = create_conversation(&router).await;

    // Two simultaneous WELCOME advances. The per-conversation lock orders
    // them: one lands on MODE_SELECT, the loser re-validates against
    // MODE_SELECT with an empty delta and is rejected.
    let (first, second) = tokio::join!(
        post_message(&router, &id, json!({})),
        post_message(&router, &id, json!({})),
    );

    let statuses = [first.0, second.0];
    assert!(statuses.contains(&StatusCode::OK), "statuses: {statuses:?}");
    assert!(
        statuses.contains(&StatusCode::UNPROCESSABLE_ENTITY),
        "statuses: {statuses:?}"
    );

    let (_, fetched) = call(&router, "GET", &format!("/api/conversations/{id}"), None).await;
    assert_eq!(fetched["state"], "MODE_SELECT");
    assert_eq!(fetched["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn mutation_lock_entries_are_evicted_after_use() {
    let (router, state, _dir) = setup().await;
    let id = create_conversation(&router).await;

    post_message(&router, &id, json!({})).await;
    // Rejected mutations release their entry too.
    post_message(&router, &id, json!({})).await;
    assert!(state.conversation_locks.is_empty());
}

#[tokio::test]
async fn skip_scheduling_jumps_from_needs_to_summary() {
    let (router, _state, _dir) = setup().await;
    let id = create_conversation(&router).await;

    post_message(&router, &id, json!({})).await;
    post_message(&router, &id, json!({ "mode": "client" })).await;
    post_message(
        &router,
        &id,
        json!({ "full_name": "Jane Doe", "email": "jane@x.com" }),
    )
    .await;
    post_message(&router, &id, json!({ "business_name": "Acme" })).await;

    let (status, body) = post_message(
        &router,
        &id,
        json!({ "needs_summary": "Fix checkout", "skip_scheduling": "true" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "SUMMARY");
}

#[tokio::test]
async fn end_and_send_forces_submit_with_default_summary() {
    let (router, _state, _dir) = setup().await;
    let id = create_conversation(&router).await;

    post_message(&router, &id, json!({})).await;
    post_message(&router, &id, json!({ "mode": "prospect" })).await;
    post_message(
        &router,
        &id,
        json!({ "full_name": "Jane Doe", "email": "jane@x.com" }),
    )
    .await;

    let (status, body) = call(
        &router,
        "POST",
        &format!("/api/conversations/{id}/end-and-send"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "SUBMIT");

    let (_, fetched) = call(&router, "GET", &format!("/api/conversations/{id}"), None).await;
    assert_eq!(fetched["state"], "SUBMIT");
    let summary = fetched["normalized_fields"]["summary"].as_str().unwrap();
    assert!(summary.contains("Name: Jane Doe"));
    assert!(summary.contains("Email: jane@x.com"));
}

#[tokio::test]
async fn unknown_conversation_is_404() {
    let (router, _state, _dir) = setup().await;
    let (status, body) = call(&router, "GET", "/api/conversations/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"]["error"], "not_found");
}

#[tokio::test]
async fn otp_flow_issues_token_and_rejects_replay() {
    let (router, _state, _dir) = setup().await;

    let (status, body) = call(
        &router,
        "POST",
        "/api/auth/request-otp",
        Some(json!({ "email": "client@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let challenge_id = body["challenge_id"].as_str().unwrap().to_string();
    let code = body["dev_code"].as_str().unwrap().to_string();

    // Wrong code fails and does not consume.
    let (status, _) = call(
        &router,
        "POST",
        "/api/auth/verify-otp",
        Some(json!({ "challenge_id": challenge_id, "code": "000000x" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &router,
        "POST",
        "/api/auth/verify-otp",
        Some(json!({ "challenge_id": challenge_id, "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());

    // Replay after success fails.
    let (status, _) = call(
        &router,
        "POST",
        "/api/auth/verify-otp",
        Some(json!({ "challenge_id": challenge_id, "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_email_is_rejected_on_request_otp() {
    let (router, _state, _dir) = setup().await;
    let (status, body) = call(
        &router,
        "POST",
        "/api/auth/request-otp",
        Some(json!({ "email": "not-an-email" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"]["error"], "invalid_email");
}

#[tokio::test]
async fn projects_and_requests_require_bearer_and_are_account_scoped() {
    let (router, state, _dir) = setup().await;

    // No token.
    let (status, _) = call(&router, "GET", "/api/projects", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Authenticate.
    let (_, body) = call(
        &router,
        "POST",
        "/api/auth/request-otp",
        Some(json!({ "email": "client@example.com" })),
    )
    .await;
    let challenge_id = body["challenge_id"].as_str().unwrap();
    let code = body["dev_code"].as_str().unwrap();
    let (_, body) = call(
        &router,
        "POST",
        "/api/auth/verify-otp",
        Some(json!({ "challenge_id": challenge_id, "code": code })),
    )
    .await;
    let token = body["token"].as_str().unwrap().to_string();
    let account_id = body["account_id"].as_str().unwrap().to_string();
    let bearer = format!("Bearer {token}");

    // Seed a project for this account.
    vestibule_storage::queries::projects::insert_project(
        &state.db,
        &account_id,
        &vestibule_core::types::Project {
            id: "p1".to_string(),
            name: "Site redesign".to_string(),
            status: "active".to_string(),
            start_date: None,
            end_date: None,
        },
    )
    .await
    .unwrap();

    let (status, body) = call_with_headers(
        &router,
        "GET",
        "/api/projects",
        None,
        &[("authorization", &bearer)],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["projects"].as_array().unwrap().len(), 1);

    // Create a request against the project.
    let (status, body) = call_with_headers(
        &router,
        "POST",
        "/api/requests",
        Some(json!({
            "project_id": "p1",
            "request_type": "bug",
            "description": "Checkout button 404s",
            "impact": "High",
            "urgency": "Urgent",
            "attachments": [],
        })),
        &[("authorization", &bearer)],
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    let request_id = body["id"].as_str().unwrap().to_string();

    // The ticket reads back, listed under its project and by id.
    let (status, body) = call_with_headers(
        &router,
        "GET",
        "/api/requests?project_id=p1",
        None,
        &[("authorization", &bearer)],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["requests"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], request_id.as_str());

    let (status, body) = call_with_headers(
        &router,
        "GET",
        &format!("/api/requests/{request_id}"),
        None,
        &[("authorization", &bearer)],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Checkout button 404s");

    // Reads are account-scoped and authenticated.
    let (status, _) = call(&router, "GET", &format!("/api/requests/{request_id}"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call_with_headers(
        &router,
        "GET",
        "/api/requests?project_id=not-mine",
        None,
        &[("authorization", &bearer)],
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Unknown project is 404.
    let (status, _) = call_with_headers(
        &router,
        "POST",
        "/api/requests",
        Some(json!({
            "project_id": "not-mine",
            "request_type": "change",
            "description": "x",
            "impact": "Low",
            "urgency": "Normal",
        })),
        &[("authorization", &bearer)],
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Empty description is a validation error.
    let (status, body) = call_with_headers(
        &router,
        "POST",
        "/api/requests",
        Some(json!({
            "project_id": "p1",
            "request_type": "new",
            "description": "   ",
            "impact": "Low",
            "urgency": "Normal",
        })),
        &[("authorization", &bearer)],
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"]["fields"], json!(["description"]));
}

#[tokio::test]
async fn presign_validates_type_and_size() {
    let (router, _state, _dir) = setup().await;

    let (status, body) = call(
        &router,
        "POST",
        "/api/uploads/presign",
        Some(json!({
            "file_name": "shot.png",
            "content_type": "image/png",
            "content_length": 1024,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["upload_url"].as_str().unwrap().ends_with("/shot.png"));
    assert!(body["key"].as_str().unwrap().starts_with("uploads/"));

    let (status, body) = call(
        &router,
        "POST",
        "/api/uploads/presign",
        Some(json!({
            "file_name": "payload.zip",
            "content_type": "application/zip",
            "content_length": 1024,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"]["error"], "upload_rejected");

    let (status, _) = call(
        &router,
        "POST",
        "/api/uploads/presign",
        Some(json!({
            "file_name": "huge.pdf",
            "content_type": "application/pdf",
            "content_length": 10_485_761u64,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn captcha_header_is_enforced_when_configured() {
    let (router, _state, _dir) =
        setup_with(|config| config.server.captcha_token = Some("expected".to_string())).await;

    let (status, _) = call(&router, "POST", "/api/conversations", Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call_with_headers(
        &router,
        "POST",
        "/api/conversations",
        Some(json!({})),
        &[("x-captcha-token", "expected")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn handoff_webhook_fires_exactly_once() {
    let mock_server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .and(wiremock::matchers::path("/intake"))
        .respond_with(wiremock::ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let webhook = format!("{}/intake", mock_server.uri());
    let (router, _state, _dir) =
        setup_with(move |config| config.handoff.webhook_url = Some(webhook)).await;

    let id = create_conversation(&router).await;
    post_message(&router, &id, json!({})).await;
    post_message(&router, &id, json!({ "mode": "prospect" })).await;

    // First termination claims the handoff; the repeat does not.
    call(
        &router,
        "POST",
        &format!("/api/conversations/{id}/end-and-send"),
        Some(json!({ "summary": "done" })),
    )
    .await;
    call(
        &router,
        "POST",
        &format!("/api/conversations/{id}/end-and-send"),
        Some(json!({ "summary": "done again" })),
    )
    .await;

    // Delivery happens on a background task.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    mock_server.verify().await;
}
