//! Free-text discussion thread on a response, independent of flag status.

use rusqlite::{Connection, params};
use serde::Serialize;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct ResponseComment {
    pub id: i64,
    pub response_id: i64,
    pub body: String,
    pub created_by: i64,
    pub created_by_name: String,
    pub created_at: String,
}

/// Thread for a response, oldest first.
pub fn find_for_response(
    conn: &Connection,
    response_id: i64,
) -> Result<Vec<ResponseComment>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT rc.id, rc.response_id, rc.body, rc.created_by, rc.created_at, \
                COALESCE(u.display_name, u.username, '') AS created_by_name \
         FROM response_comments rc \
         LEFT JOIN users u ON u.id = rc.created_by \
         WHERE rc.response_id = ?1 ORDER BY rc.created_at ASC, rc.id ASC",
    )?;
    let comments = stmt
        .query_map(params![response_id], |row| {
            Ok(ResponseComment {
                id: row.get("id")?,
                response_id: row.get("response_id")?,
                body: row.get("body")?,
                created_by: row.get("created_by")?,
                created_by_name: row.get("created_by_name")?,
                created_at: row.get("created_at")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

pub fn create(
    conn: &Connection,
    response_id: i64,
    body: &str,
    created_by: i64,
) -> Result<i64, AppError> {
    if body.trim().is_empty() {
        return Err(AppError::Validation("Comment body is required".to_string()));
    }
    conn.execute(
        "INSERT INTO response_comments (response_id, body, created_by) VALUES (?1, ?2, ?3)",
        params![response_id, body.trim(), created_by],
    )?;
    Ok(conn.last_insert_rowid())
}
