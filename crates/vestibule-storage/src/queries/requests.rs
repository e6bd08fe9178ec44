// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request ticket operations. Tickets are immutable once inserted.

use rusqlite::params;
use rusqlite::types::Type;
use vestibule_core::types::Attachment;
use vestibule_core::VestibuleError;

use crate::database::Database;
use crate::models::RequestTicket;

fn row_to_request(row: &rusqlite::Row<'_>) -> rusqlite::Result<RequestTicket> {
    let request_type: String = row.get(2)?;
    let request_type = request_type
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    let attachments_json: String = row.get(6)?;
    let attachments: Vec<Attachment> = serde_json::from_str(&attachments_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;
    Ok(RequestTicket {
        id: row.get(0)?,
        project_id: row.get(1)?,
        request_type,
        description: row.get(3)?,
        impact: row.get(4)?,
        urgency: row.get(5)?,
        attachments,
        created_at: row.get(7)?,
    })
}

const REQUEST_COLUMNS: &str =
    "id, project_id, request_type, description, impact, urgency, attachments, created_at";

/// Insert a new request ticket for an account.
pub async fn insert_request(
    db: &Database,
    account_id: &str,
    request: &RequestTicket,
) -> Result<(), VestibuleError> {
    let account_id = account_id.to_string();
    let request = request.clone();
    let attachments_json =
        serde_json::to_string(&request.attachments).map_err(|e| VestibuleError::Storage {
            source: Box::new(e),
        })?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO requests
                     (id, project_id, account_id, request_type, description, impact, urgency, attachments, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    request.id,
                    request.project_id,
                    account_id,
                    request.request_type.to_string(),
                    request.description,
                    request.impact,
                    request.urgency,
                    attachments_json,
                    request.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List an account's tickets for one project, oldest first.
pub async fn list_requests(
    db: &Database,
    account_id: &str,
    project_id: &str,
) -> Result<Vec<RequestTicket>, VestibuleError> {
    let account_id = account_id.to_string();
    let project_id = project_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {REQUEST_COLUMNS} FROM requests
                 WHERE account_id = ?1 AND project_id = ?2
                 ORDER BY created_at ASC, rowid ASC"
            ))?;
            let rows = stmt.query_map(params![account_id, project_id], row_to_request)?;
            let mut requests = Vec::new();
            for row in rows {
                requests.push(row?);
            }
            Ok(requests)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a ticket by id, only if it belongs to `account_id`.
pub async fn get_request(
    db: &Database,
    account_id: &str,
    request_id: &str,
) -> Result<Option<RequestTicket>, VestibuleError> {
    let account_id = account_id.to_string();
    let request_id = request_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!(
                    "SELECT {REQUEST_COLUMNS} FROM requests
                     WHERE id = ?1 AND account_id = ?2"
                ),
                params![request_id, account_id],
                row_to_request,
            );
            match result {
                Ok(request) => Ok(Some(request)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}
