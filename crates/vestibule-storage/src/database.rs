// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management.
//!
//! Wraps a single `tokio_rusqlite::Connection`. All reads and writes go
//! through `connection().call()`, which serializes closures on one background
//! thread. This is the single-writer model: never open a second connection
//! for writes.

use tracing::debug;
use vestibule_core::VestibuleError;

/// Handle to the SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` with WAL mode enabled and run
    /// pending migrations.
    pub async fn open(path: &str) -> Result<Self, VestibuleError> {
        Self::open_with_wal(path, true).await
    }

    /// Open with explicit control over WAL journaling.
    pub async fn open_with_wal(path: &str, wal_mode: bool) -> Result<Self, VestibuleError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| VestibuleError::Storage {
                source: Box::new(e),
            })?;
        }

        // Migrations run on a short-lived blocking connection; the async
        // connection below is the only one held past startup.
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), VestibuleError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(|e| VestibuleError::Storage {
                    source: Box::new(e),
                })?;
            crate::migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| VestibuleError::Storage {
            source: Box::new(e),
        })??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| map_tr_err(tokio_rusqlite::Error::Error(e)))?;

        conn.call(move |conn| {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying connection, for use by the query modules.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Flush and close the connection.
    pub async fn close(self) -> Result<(), VestibuleError> {
        self.conn.close().await.map_err(map_tr_err)
    }
}

/// Map a `tokio_rusqlite::Error` into the workspace error type.
pub fn map_tr_err(err: tokio_rusqlite::Error) -> VestibuleError {
    VestibuleError::Storage {
        source: Box::new(err),
    }
}

/// Current UTC time as an RFC 3339 timestamp with millisecond precision,
/// matching the format SQLite's `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')`
/// produces.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_runs_migrations_and_is_reopenable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let path = path.to_str().unwrap();

        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();

        // Reopen: migrations are idempotent.
        let db = Database::open(path).await.unwrap();
        let count: i64 = db
            .connection()
            .call(|conn| {
                Ok::<_, rusqlite::Error>(conn.query_row(
                    "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = 'conversations'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
        db.close().await.unwrap();
    }

    #[test]
    fn timestamp_has_millisecond_precision_and_z_suffix() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'), "got: {ts}");
        assert_eq!(ts.len(), "2026-01-01T00:00:00.000Z".len(), "got: {ts}");
    }
}
