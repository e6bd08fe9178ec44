// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OTP challenge, account, and bearer token operations.

use rusqlite::params;
use vestibule_core::VestibuleError;

use crate::database::Database;
use crate::models::{Account, AuthChallenge, AuthToken};

/// Store a new OTP challenge.
pub async fn create_challenge(
    db: &Database,
    challenge: &AuthChallenge,
) -> Result<(), VestibuleError> {
    let challenge = challenge.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO auth_challenges (id, email, code, consumed, created_at)
                 VALUES (?1, ?2, ?3, 0, ?4)",
                params![
                    challenge.id,
                    challenge.email,
                    challenge.code,
                    challenge.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Consume a challenge if the code matches and it has not been used.
///
/// The consume is a conditional update guarded on `consumed = 0`, so a
/// challenge verifies at most once even under concurrent attempts. Returns
/// the challenge email on success, `None` on wrong code, unknown id, or
/// reuse.
pub async fn consume_challenge(
    db: &Database,
    challenge_id: &str,
    code: &str,
) -> Result<Option<String>, VestibuleError> {
    let challenge_id = challenge_id.to_string();
    let code = code.to_string();
    db.connection()
        .call(move |conn| {
            let rows = conn.execute(
                "UPDATE auth_challenges SET consumed = 1
                 WHERE id = ?1 AND code = ?2 AND consumed = 0",
                params![challenge_id, code],
            )?;
            if rows != 1 {
                return Ok(None);
            }
            let email: String = conn.query_row(
                "SELECT email FROM auth_challenges WHERE id = ?1",
                params![challenge_id],
                |row| row.get(0),
            )?;
            Ok(Some(email))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert the account if its email is new, then return the stored row.
///
/// The caller supplies a candidate row with a fresh id; if the email already
/// exists the existing row wins and is returned instead.
pub async fn upsert_account(
    db: &Database,
    candidate: &Account,
) -> Result<Account, VestibuleError> {
    let candidate = candidate.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO accounts (id, email, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(email) DO NOTHING",
                params![candidate.id, candidate.email, candidate.created_at],
            )?;
            conn.query_row(
                "SELECT id, email, created_at FROM accounts WHERE email = ?1",
                params![candidate.email],
                |row| {
                    Ok(Account {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Store an issued bearer token.
pub async fn insert_token(db: &Database, token: &AuthToken) -> Result<(), VestibuleError> {
    let token = token.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO auth_tokens (token, account_id, email, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![token.token, token.account_id, token.email, token.created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a bearer token.
pub async fn get_token(db: &Database, token: &str) -> Result<Option<AuthToken>, VestibuleError> {
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT token, account_id, email, created_at FROM auth_tokens WHERE token = ?1",
                params![token],
                |row| {
                    Ok(AuthToken {
                        token: row.get(0)?,
                        account_id: row.get(1)?,
                        email: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            );
            match result {
                Ok(token) => Ok(Some(token)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}
