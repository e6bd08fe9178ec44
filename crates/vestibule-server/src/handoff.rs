// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Submit handoff: one webhook notification per submitted conversation.

use serde_json::json;
use tracing::{debug, warn};

use crate::state::AppState;

/// Notify the configured webhook that a conversation reached `SUBMIT`.
///
/// The claim is a conditional update on the conversation row, so exactly one
/// caller wins even when a mutation and an end action race. Delivery runs in
/// the background and never fails the triggering request; a lost webhook is
/// logged and not retried.
pub async fn trigger_handoff(state: &AppState, conversation_id: &str, summary: String) {
    let claimed =
        match vestibule_storage::queries::conversations::claim_handoff(&state.db, conversation_id)
            .await
        {
            Ok(claimed) => claimed,
            Err(e) => {
                warn!(conversation_id, error = %e, "handoff claim failed");
                return;
            }
        };
    if !claimed {
        debug!(conversation_id, "handoff already claimed");
        return;
    }

    let Some(webhook_url) = state.config.handoff.webhook_url.clone() else {
        debug!(conversation_id, "no handoff webhook configured");
        return;
    };

    let http = state.http.clone();
    let conversation_id = conversation_id.to_string();
    tokio::spawn(async move {
        let body = json!({
            "conversation_id": conversation_id,
            "summary": summary,
        });
        match http.post(&webhook_url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(conversation_id, "handoff delivered");
            }
            Ok(response) => {
                warn!(
                    conversation_id,
                    status = %response.status(),
                    "handoff webhook returned non-success"
                );
            }
            Err(e) => {
                warn!(conversation_id, error = %e, "handoff webhook delivery failed");
            }
        }
    });
}
