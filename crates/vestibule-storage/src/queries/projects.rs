// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Project read operations, scoped to the owning account.
//!
//! Projects are owned by an external system; this store only mirrors them
//! for display and for validating request targets.

use rusqlite::params;
use vestibule_core::VestibuleError;

use crate::database::Database;
use crate::models::Project;

fn row_to_project(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        status: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
    })
}

/// Insert a project owned by `account_id`.
pub async fn insert_project(
    db: &Database,
    account_id: &str,
    project: &Project,
) -> Result<(), VestibuleError> {
    let account_id = account_id.to_string();
    let project = project.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO projects (id, account_id, name, status, start_date, end_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    project.id,
                    account_id,
                    project.name,
                    project.status,
                    project.start_date,
                    project.end_date,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List an account's projects, newest id last.
pub async fn list_projects(
    db: &Database,
    account_id: &str,
) -> Result<Vec<Project>, VestibuleError> {
    let account_id = account_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, status, start_date, end_date
                 FROM projects WHERE account_id = ?1 ORDER BY rowid ASC",
            )?;
            let rows = stmt.query_map(params![account_id], row_to_project)?;
            let mut projects = Vec::new();
            for row in rows {
                projects.push(row?);
            }
            Ok(projects)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a project by id, only if it belongs to `account_id`.
pub async fn get_project(
    db: &Database,
    account_id: &str,
    project_id: &str,
) -> Result<Option<Project>, VestibuleError> {
    let account_id = account_id.to_string();
    let project_id = project_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, name, status, start_date, end_date
                 FROM projects WHERE id = ?1 AND account_id = ?2",
                params![project_id, account_id],
                row_to_project,
            );
            match result {
                Ok(project) => Ok(Some(project)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Account;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        for id in ["acct-1", "acct-2"] {
            crate::queries::auth::upsert_account(
                &db,
                &Account {
                    id: id.to_string(),
                    email: format!("{id}@example.com"),
                    created_at: "2026-01-01T00:00:00.000Z".to_string(),
                },
            )
            .await
            .unwrap();
        }
        (db, dir)
    }

    fn make_project(id: &str, name: &str) -> Project {
        Project {
            id: id.to_string(),
            name: name.to_string(),
            status: "active".to_string(),
            start_date: Some("2026-01-01".to_string()),
            end_date: None,
        }
    }

    #[tokio::test]
    async fn projects_are_scoped_to_their_account() {
        let (db, _dir) = setup_db().await;
        insert_project(&db, "acct-1", &make_project("p1", "Site redesign"))
            .await
            .unwrap();
        insert_project(&db, "acct-2", &make_project("p2", "App build"))
            .await
            .unwrap();

        let mine = list_projects(&db, "acct-1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "Site redesign");

        // Cross-account lookup misses.
        assert!(get_project(&db, "acct-1", "p2").await.unwrap().is_none());
        assert!(get_project(&db, "acct-2", "p2").await.unwrap().is_some());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn empty_account_lists_no_projects() {
        let (db, _dir) = setup_db().await;
        assert!(list_projects(&db, "acct-1").await.unwrap().is_empty());
        db.close().await.unwrap();
    }
}
