// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation CRUD and the handoff claim.

use rusqlite::params;
use rusqlite::types::Type;
use vestibule_core::types::FieldBag;
use vestibule_core::VestibuleError;

use crate::database::Database;
use crate::models::Conversation;

fn row_to_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    let state: String = row.get(4)?;
    let state = state
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    let fields_json: String = row.get(5)?;
    let normalized_fields: FieldBag = serde_json::from_str(&fields_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
    Ok(Conversation {
        id: row.get(0)?,
        account_id: row.get(1)?,
        channel: row.get(2)?,
        subject: row.get(3)?,
        state,
        normalized_fields,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

const CONVERSATION_COLUMNS: &str =
    "id, account_id, channel, subject, state, normalized_fields, created_at, updated_at";

/// Create a new conversation.
pub async fn create_conversation(
    db: &Database,
    conversation: &Conversation,
) -> Result<(), VestibuleError> {
    let conversation = conversation.clone();
    let fields_json =
        serde_json::to_string(&conversation.normalized_fields).map_err(|e| {
            VestibuleError::Storage {
                source: Box::new(e),
            }
        })?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversations
                     (id, account_id, channel, subject, state, normalized_fields, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    conversation.id,
                    conversation.account_id,
                    conversation.channel,
                    conversation.subject,
                    conversation.state.to_string(),
                    fields_json,
                    conversation.created_at,
                    conversation.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a conversation by ID.
pub async fn get_conversation(
    db: &Database,
    id: &str,
) -> Result<Option<Conversation>, VestibuleError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id], row_to_conversation);
            match result {
                Ok(conversation) => Ok(Some(conversation)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Persist a conversation's state and field bag after a transition, bumping
/// `updated_at`.
pub async fn update_conversation(
    db: &Database,
    id: &str,
    state: vestibule_core::ConversationState,
    normalized_fields: &FieldBag,
) -> Result<(), VestibuleError> {
    let id = id.to_string();
    let state = state.to_string();
    let fields_json =
        serde_json::to_string(normalized_fields).map_err(|e| VestibuleError::Storage {
            source: Box::new(e),
        })?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversations
                 SET state = ?1, normalized_fields = ?2,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?3",
                params![state, fields_json, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Claim the submission handoff for a conversation.
///
/// Returns `true` for exactly one caller per conversation: the claim is a
/// conditional update guarded on the claim column still being NULL, so
/// concurrent submitters race on a single row write.
pub async fn claim_handoff(db: &Database, id: &str) -> Result<bool, VestibuleError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let rows = conn.execute(
                "UPDATE conversations
                 SET handoff_claimed_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND handoff_claimed_at IS NULL",
                params![id],
            )?;
            Ok(rows == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
