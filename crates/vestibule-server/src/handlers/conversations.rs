// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation lifecycle: create, fetch, mutate, end-and-send.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use vestibule_core::fields::{self, keys};
use vestibule_core::types::{merge_fields, Conversation, FieldBag, Message, SenderType};
use vestibule_core::{machine, ConversationState, VestibuleError};
use vestibule_storage::database::now_timestamp;
use vestibule_storage::queries::{conversations, messages};

use crate::auth::check_captcha;
use crate::error::ApiError;
use crate::handoff::trigger_handoff;
use crate::state::AppState;

/// Body for `POST /api/conversations`.
#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

/// Authoritative conversation view returned by create and fetch.
#[derive(Debug, Serialize)]
pub struct ConversationView {
    pub id: String,
    pub account_id: String,
    pub channel: String,
    pub subject: Option<String>,
    pub state: ConversationState,
    pub normalized_fields: FieldBag,
    pub created_at: String,
    pub updated_at: String,
    pub messages: Vec<Message>,
}

/// Body for `POST /api/conversations/{id}/message`.
#[derive(Debug, Deserialize)]
pub struct MutationRequest {
    pub sender_type: SenderType,
    pub body: String,
    #[serde(default)]
    pub fields: Option<FieldBag>,
}

/// Body for `POST /api/conversations/{id}/end-and-send`.
#[derive(Debug, Deserialize)]
pub struct EndAndSendRequest {
    #[serde(default)]
    pub summary: Option<String>,
}

/// POST /api/conversations
///
/// Creates a conversation in `WELCOME` with an empty field bag.
pub async fn create_conversation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateConversationRequest>,
) -> Result<Response, ApiError> {
    check_captcha(&state, &headers)?;

    let now = now_timestamp();
    let conversation = Conversation {
        id: uuid::Uuid::new_v4().to_string(),
        account_id: body
            .account_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        channel: body.channel.unwrap_or_else(|| "web".to_string()),
        subject: body.subject,
        state: ConversationState::Welcome,
        normalized_fields: FieldBag::new(),
        created_at: now.clone(),
        updated_at: now,
    };
    conversations::create_conversation(&state.db, &conversation).await?;

    tracing::info!(conversation_id = %conversation.id, "conversation created");
    Ok(Json(json!({
        "id": conversation.id,
        "state": conversation.state,
        "normalized_fields": conversation.normalized_fields,
    }))
    .into_response())
}

/// GET /api/conversations/{id}
///
/// Returns the authoritative state, field bag, and transcript. Clients
/// overwrite their local copy with this unconditionally.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationView>, ApiError> {
    let conversation = conversations::get_conversation(&state.db, &id)
        .await?
        .ok_or_else(|| VestibuleError::NotFound(format!("conversation {id}")))?;
    let messages = messages::list_messages(&state.db, &id).await?;

    Ok(Json(ConversationView {
        id: conversation.id,
        account_id: conversation.account_id,
        channel: conversation.channel,
        subject: conversation.subject,
        state: conversation.state,
        normalized_fields: conversation.normalized_fields,
        created_at: conversation.created_at,
        updated_at: conversation.updated_at,
        messages,
    }))
}

/// POST /api/conversations/{id}/message
///
/// The mutation call: validates the submitted fields against the current
/// step, merges them, advances state, and appends the message. On rejection
/// the conversation row is untouched and the error names the state and the
/// missing fields.
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MutationRequest>,
) -> Result<Response, ApiError> {
    let _guard = state.lock_for(&id).await;

    let mut conversation = conversations::get_conversation(&state.db, &id)
        .await?
        .ok_or_else(|| VestibuleError::NotFound(format!("conversation {id}")))?;

    let submitted = body.fields.clone().unwrap_or_default();
    let next = machine::advance(conversation.state, &submitted)?;

    merge_fields(&mut conversation.normalized_fields, &submitted);
    conversations::update_conversation(&state.db, &id, next, &conversation.normalized_fields)
        .await?;

    let message = Message {
        id: uuid::Uuid::new_v4().to_string(),
        conversation_id: id.clone(),
        sender_type: body.sender_type,
        body: body.body,
        fields: body.fields,
        created_at: now_timestamp(),
    };
    messages::insert_message(&state.db, &message).await?;

    if next == ConversationState::Submit {
        let summary = conversation
            .normalized_fields
            .get(keys::SUMMARY)
            .cloned()
            .unwrap_or_else(|| fields::build_summary(&conversation.normalized_fields));
        trigger_handoff(&state, &id, summary).await;
    }

    tracing::debug!(conversation_id = %id, state = %next, "mutation accepted");
    Ok(Json(json!({ "ok": true, "state": next })).into_response())
}

/// POST /api/conversations/{id}/end-and-send
///
/// Forces the terminal transition from any non-terminal state, using the
/// supplied summary or the canonical projection of the current bag. This is
/// the only permitted non-adjacent transition.
pub async fn end_and_send(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<EndAndSendRequest>,
) -> Result<Response, ApiError> {
    let _guard = state.lock_for(&id).await;

    let mut conversation = conversations::get_conversation(&state.db, &id)
        .await?
        .ok_or_else(|| VestibuleError::NotFound(format!("conversation {id}")))?;

    let summary = body
        .summary
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| fields::build_summary(&conversation.normalized_fields));
    conversation
        .normalized_fields
        .insert(keys::SUMMARY.to_string(), summary.clone());

    conversations::update_conversation(
        &state.db,
        &id,
        ConversationState::Submit,
        &conversation.normalized_fields,
    )
    .await?;

    let message = Message {
        id: uuid::Uuid::new_v4().to_string(),
        conversation_id: id.clone(),
        sender_type: SenderType::System,
        body: summary.clone(),
        fields: None,
        created_at: now_timestamp(),
    };
    messages::insert_message(&state.db, &message).await?;

    trigger_handoff(&state, &id, summary).await;

    tracing::info!(conversation_id = %id, "conversation ended and sent");
    Ok(Json(json!({ "ok": true, "state": ConversationState::Submit })).into_response())
}
