// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transcript message operations. The transcript is append-only.

use rusqlite::params;
use rusqlite::types::Type;
use vestibule_core::types::FieldBag;
use vestibule_core::VestibuleError;

use crate::database::Database;
use crate::models::Message;

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let sender: String = row.get(2)?;
    let sender_type = sender
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    let fields_json: Option<String> = row.get(4)?;
    let fields: Option<FieldBag> = match fields_json {
        Some(json) => Some(serde_json::from_str(&json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e))
        })?),
        None => None,
    };
    Ok(Message {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender_type,
        body: row.get(3)?,
        fields,
        created_at: row.get(5)?,
    })
}

/// Append a message to a conversation's transcript.
pub async fn insert_message(db: &Database, message: &Message) -> Result<(), VestibuleError> {
    let message = message.clone();
    let fields_json = match &message.fields {
        Some(fields) => Some(serde_json::to_string(fields).map_err(|e| {
            VestibuleError::Storage {
                source: Box::new(e),
            }
        })?),
        None => None,
    };
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, conversation_id, sender_type, body, fields, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    message.id,
                    message.conversation_id,
                    message.sender_type.to_string(),
                    message.body,
                    fields_json,
                    message.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List a conversation's messages in append order.
pub async fn list_messages(
    db: &Database,
    conversation_id: &str,
) -> Result<Vec<Message>, VestibuleError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, conversation_id, sender_type, body, fields, created_at
                 FROM messages WHERE conversation_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt.query_map(params![conversation_id], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
