use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagInput {
    pub name: String,
    pub description: Option<String>,
}

fn row_to_tag(row: &rusqlite::Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
    })
}

pub fn find_all(conn: &Connection) -> Result<Vec<Tag>, AppError> {
    let mut stmt = conn.prepare("SELECT id, name, description FROM tags ORDER BY name")?;
    let tags = stmt
        .query_map([], row_to_tag)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Tag>, AppError> {
    Ok(conn
        .query_row(
            "SELECT id, name, description FROM tags WHERE id = ?1",
            params![id],
            row_to_tag,
        )
        .optional()?)
}

pub fn create(conn: &Connection, input: &TagInput) -> Result<i64, AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("Tag name is required".to_string()));
    }
    conn.execute(
        "INSERT INTO tags (name, description) VALUES (?1, ?2)",
        params![input.name.trim(), input.description],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update(conn: &Connection, id: i64, input: &TagInput) -> Result<(), AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("Tag name is required".to_string()));
    }
    let changed = conn.execute(
        "UPDATE tags SET name = ?1, description = ?2 WHERE id = ?3",
        params![input.name.trim(), input.description, id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub fn delete(conn: &Connection, id: i64) -> Result<(), AppError> {
    let changed = conn.execute("DELETE FROM tags WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Tags attached to a PIR (they select its question set).
pub fn find_for_pir(conn: &Connection, pir_id: i64) -> Result<Vec<Tag>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.description FROM tags t \
         JOIN pir_tags pt ON pt.tag_id = t.id \
         WHERE pt.pir_id = ?1 ORDER BY t.name",
    )?;
    let tags = stmt
        .query_map(params![pir_id], row_to_tag)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}
