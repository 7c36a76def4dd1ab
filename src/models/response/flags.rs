//! Response flags: append-only customer objections. The newest flag per
//! response is the canonical feedback shown to the supplier; older rows stay
//! as review history.

use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagStatus {
    Open,
    InProgress,
    Resolved,
    Rejected,
}

impl FlagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagStatus::Open => "open",
            FlagStatus::InProgress => "in_progress",
            FlagStatus::Resolved => "resolved",
            FlagStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "open" => Ok(FlagStatus::Open),
            "in_progress" => Ok(FlagStatus::InProgress),
            "resolved" => Ok(FlagStatus::Resolved),
            "rejected" => Ok(FlagStatus::Rejected),
            other => Err(AppError::Validation(format!("Unknown flag status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFlag {
    pub id: i64,
    pub response_id: i64,
    pub description: String,
    pub status: FlagStatus,
    pub created_by: i64,
    pub created_at: String,
    pub resolved_at: Option<String>,
    pub resolved_by: Option<i64>,
}

fn row_to_raw(row: &rusqlite::Row) -> rusqlite::Result<(ResponseFlag, String)> {
    let status_raw: String = row.get("status")?;
    Ok((
        ResponseFlag {
            id: row.get("id")?,
            response_id: row.get("response_id")?,
            description: row.get("description")?,
            status: FlagStatus::Open,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
            resolved_at: row.get("resolved_at")?,
            resolved_by: row.get("resolved_by")?,
        },
        status_raw,
    ))
}

fn cook((mut flag, status_raw): (ResponseFlag, String)) -> Result<ResponseFlag, AppError> {
    flag.status = FlagStatus::parse(&status_raw)?;
    Ok(flag)
}

const SELECT_FLAG: &str = "SELECT id, response_id, description, status, created_by, \
     created_at, resolved_at, resolved_by FROM response_flags";

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<ResponseFlag>, AppError> {
    let sql = format!("{SELECT_FLAG} WHERE id = ?1");
    let raw = conn.query_row(&sql, params![id], row_to_raw).optional()?;
    raw.map(cook).transpose()
}

/// All flags of a response, newest first.
pub fn find_for_response(conn: &Connection, response_id: i64) -> Result<Vec<ResponseFlag>, AppError> {
    let sql = format!("{SELECT_FLAG} WHERE response_id = ?1 ORDER BY created_at DESC, id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let raws = stmt
        .query_map(params![response_id], row_to_raw)?
        .collect::<Result<Vec<_>, _>>()?;
    raws.into_iter().map(cook).collect()
}

/// The canonical (most recent) flag of a response, if any.
pub fn latest_for_response(
    conn: &Connection,
    response_id: i64,
) -> Result<Option<ResponseFlag>, AppError> {
    let sql = format!("{SELECT_FLAG} WHERE response_id = ?1 ORDER BY created_at DESC, id DESC LIMIT 1");
    let raw = conn.query_row(&sql, params![response_id], row_to_raw).optional()?;
    raw.map(cook).transpose()
}

pub fn count_for_response(conn: &Connection, response_id: i64) -> Result<i64, AppError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM response_flags WHERE response_id = ?1",
        params![response_id],
        |row| row.get(0),
    )?)
}

pub fn create(
    conn: &Connection,
    response_id: i64,
    description: &str,
    created_by: i64,
) -> Result<i64, AppError> {
    if description.trim().is_empty() {
        return Err(AppError::Validation("Flag description is required".to_string()));
    }
    conn.execute(
        "INSERT INTO response_flags (response_id, description, status, created_by) \
         VALUES (?1, ?2, 'open', ?3)",
        params![response_id, description.trim(), created_by],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Step a flag's status. Moving to resolved/rejected stamps resolution;
/// moving back to open/in_progress clears it.
pub fn update_status(
    conn: &Connection,
    flag_id: i64,
    status: FlagStatus,
    user_id: i64,
) -> Result<(), AppError> {
    let changed = match status {
        FlagStatus::Resolved | FlagStatus::Rejected => conn.execute(
            "UPDATE response_flags SET status = ?1, \
                    resolved_at = strftime('%Y-%m-%dT%H:%M:%S','now'), resolved_by = ?2 \
             WHERE id = ?3",
            params![status.as_str(), user_id, flag_id],
        )?,
        FlagStatus::Open | FlagStatus::InProgress => conn.execute(
            "UPDATE response_flags SET status = ?1, resolved_at = NULL, resolved_by = NULL \
             WHERE id = ?2",
            params![status.as_str(), flag_id],
        )?,
    };
    if changed == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
