//! Question-bank sections: a two-level ordered taxonomy. `parent_id` NULL
//! marks a top-level section; children order by `sort_order` within their
//! parent.

use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i64,
    pub parent_id: Option<i64>,
}

/// A top-level section with its ordered subsections.
#[derive(Debug, Clone, Serialize)]
pub struct SectionTree {
    #[serde(flatten)]
    pub section: Section,
    pub subsections: Vec<Section>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    pub parent_id: Option<i64>,
}

fn row_to_section(row: &rusqlite::Row) -> rusqlite::Result<Section> {
    Ok(Section {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        sort_order: row.get("sort_order")?,
        parent_id: row.get("parent_id")?,
    })
}

const SELECT_SECTION: &str =
    "SELECT id, name, description, sort_order, parent_id FROM question_sections";

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Section>, AppError> {
    let sql = format!("{SELECT_SECTION} WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], row_to_section).optional()?)
}

/// All sections as an ordered two-level tree.
pub fn find_tree(conn: &Connection) -> Result<Vec<SectionTree>, AppError> {
    let sql = format!("{SELECT_SECTION} ORDER BY sort_order, id");
    let mut stmt = conn.prepare(&sql)?;
    let all = stmt
        .query_map([], row_to_section)?
        .collect::<Result<Vec<_>, _>>()?;

    let (tops, subs): (Vec<_>, Vec<_>) = all.into_iter().partition(|s| s.parent_id.is_none());
    let tree = tops
        .into_iter()
        .map(|section| {
            let subsections = subs
                .iter()
                .filter(|s| s.parent_id == Some(section.id))
                .cloned()
                .collect();
            SectionTree { section, subsections }
        })
        .collect();
    Ok(tree)
}

pub fn create(conn: &Connection, input: &SectionInput) -> Result<i64, AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("Section name is required".to_string()));
    }
    if let Some(parent_id) = input.parent_id {
        let parent = find_by_id(conn, parent_id)?.ok_or(AppError::NotFound)?;
        // Two levels only: a subsection cannot itself be a parent.
        if parent.parent_id.is_some() {
            return Err(AppError::Validation(
                "Sections nest at most one level deep".to_string(),
            ));
        }
    }
    conn.execute(
        "INSERT INTO question_sections (name, description, sort_order, parent_id) \
         VALUES (?1, ?2, ?3, ?4)",
        params![input.name.trim(), input.description, input.sort_order, input.parent_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Rename and/or reorder. Re-parenting is not supported; sections keep their
/// place in the hierarchy once created.
pub fn update(
    conn: &Connection,
    id: i64,
    name: &str,
    description: Option<&str>,
    sort_order: i64,
) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Section name is required".to_string()));
    }
    let changed = conn.execute(
        "UPDATE question_sections SET name = ?1, description = ?2, sort_order = ?3 WHERE id = ?4",
        params![name.trim(), description, sort_order, id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Delete an empty section. Sections that still hold questions or
/// subsections are kept (archival is not implemented).
pub fn delete(conn: &Connection, id: i64) -> Result<(), AppError> {
    let question_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM questions WHERE section_id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    if question_count > 0 {
        return Err(AppError::Validation(format!(
            "Section still holds {question_count} question(s)"
        )));
    }
    let child_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM question_sections WHERE parent_id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    if child_count > 0 {
        return Err(AppError::Validation(format!(
            "Section still holds {child_count} subsection(s)"
        )));
    }
    let changed = conn.execute("DELETE FROM question_sections WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
