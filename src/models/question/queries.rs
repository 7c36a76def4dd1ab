use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::AppError;
use super::types::{Question, QuestionInput, QuestionOptions, QuestionType};

struct RawQuestion {
    id: i64,
    text: String,
    description: Option<String>,
    question_type: String,
    required: bool,
    options: Option<String>,
    section_id: Option<i64>,
    sort_order: i64,
}

const SELECT_QUESTION: &str = "SELECT id, text, description, question_type, required, \
     options, section_id, sort_order FROM questions";

fn row_to_raw(row: &rusqlite::Row) -> rusqlite::Result<RawQuestion> {
    Ok(RawQuestion {
        id: row.get("id")?,
        text: row.get("text")?,
        description: row.get("description")?,
        question_type: row.get("question_type")?,
        required: row.get::<_, i64>("required")? != 0,
        options: row.get("options")?,
        section_id: row.get("section_id")?,
        sort_order: row.get("sort_order")?,
    })
}

/// Parse the stored options column into the typed payload for a question type.
fn parse_options(qtype: QuestionType, raw: Option<&str>) -> Result<QuestionOptions, AppError> {
    let Some(raw) = raw else {
        return Ok(QuestionOptions::None);
    };
    let options: QuestionOptions = serde_json::from_str(raw).map_err(|e| {
        AppError::Validation(format!("Stored options are not valid for '{}': {e}", qtype.as_str()))
    })?;
    options.validate_for(qtype)?;
    Ok(options)
}

fn cook(raw: RawQuestion) -> Result<Question, AppError> {
    let question_type = QuestionType::parse(&raw.question_type)?;
    let options = parse_options(question_type, raw.options.as_deref())?;
    Ok(Question {
        id: raw.id,
        text: raw.text,
        description: raw.description,
        question_type,
        required: raw.required,
        options,
        section_id: raw.section_id,
        sort_order: raw.sort_order,
    })
}

pub fn find_all(conn: &Connection) -> Result<Vec<Question>, AppError> {
    let sql = format!("{SELECT_QUESTION} ORDER BY section_id, sort_order, id");
    let mut stmt = conn.prepare(&sql)?;
    let raws = stmt
        .query_map([], row_to_raw)?
        .collect::<Result<Vec<_>, _>>()?;
    raws.into_iter().map(cook).collect()
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Question>, AppError> {
    let sql = format!("{SELECT_QUESTION} WHERE id = ?1");
    let raw = conn
        .query_row(&sql, params![id], row_to_raw)
        .optional()?;
    raw.map(cook).transpose()
}

/// Questions selected for a PIR: tag sets intersect, ordered for numbering.
pub fn find_for_pir(conn: &Connection, pir_id: i64) -> Result<Vec<Question>, AppError> {
    let sql = format!(
        "{SELECT_QUESTION} WHERE id IN ( \
             SELECT DISTINCT qt.question_id \
             FROM question_tags qt \
             JOIN pir_tags pt ON pt.tag_id = qt.tag_id \
             WHERE pt.pir_id = ?1) \
         ORDER BY section_id, sort_order, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let raws = stmt
        .query_map(params![pir_id], row_to_raw)?
        .collect::<Result<Vec<_>, _>>()?;
    raws.into_iter().map(cook).collect()
}

fn options_to_sql(input: &QuestionInput) -> Result<Option<String>, AppError> {
    input.options.validate_for(input.question_type)?;
    if input.options.is_none() {
        Ok(None)
    } else {
        Ok(Some(serde_json::to_string(&input.options).map_err(|e| {
            AppError::Validation(format!("Options are not serializable: {e}"))
        })?))
    }
}

pub fn create(conn: &Connection, input: &QuestionInput) -> Result<i64, AppError> {
    if input.text.trim().is_empty() {
        return Err(AppError::Validation("Question text is required".to_string()));
    }
    let options = options_to_sql(input)?;

    conn.execute(
        "INSERT INTO questions (text, description, question_type, required, options, section_id, sort_order) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            input.text.trim(),
            input.description,
            input.question_type.as_str(),
            input.required as i64,
            options,
            input.section_id,
            input.sort_order,
        ],
    )?;
    let question_id = conn.last_insert_rowid();
    set_tags(conn, question_id, &input.tag_ids)?;
    Ok(question_id)
}

pub fn update(conn: &Connection, id: i64, input: &QuestionInput) -> Result<(), AppError> {
    if input.text.trim().is_empty() {
        return Err(AppError::Validation("Question text is required".to_string()));
    }
    let options = options_to_sql(input)?;

    let changed = conn.execute(
        "UPDATE questions SET text = ?1, description = ?2, question_type = ?3, required = ?4, \
                options = ?5, section_id = ?6, sort_order = ?7, \
                updated_at = strftime('%Y-%m-%dT%H:%M:%S','now') \
         WHERE id = ?8",
        params![
            input.text.trim(),
            input.description,
            input.question_type.as_str(),
            input.required as i64,
            options,
            input.section_id,
            input.sort_order,
            id,
        ],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound);
    }
    set_tags(conn, id, &input.tag_ids)?;
    Ok(())
}

pub fn delete(conn: &Connection, id: i64) -> Result<(), AppError> {
    let changed = conn.execute("DELETE FROM questions WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Replace a question's tag set.
pub fn set_tags(conn: &Connection, question_id: i64, tag_ids: &[i64]) -> Result<(), AppError> {
    conn.execute(
        "DELETE FROM question_tags WHERE question_id = ?1",
        params![question_id],
    )?;
    for tag_id in tag_ids {
        conn.execute(
            "INSERT OR IGNORE INTO question_tags (question_id, tag_id) VALUES (?1, ?2)",
            params![question_id, tag_id],
        )?;
    }
    Ok(())
}

pub fn tag_ids_of(conn: &Connection, question_id: i64) -> Result<Vec<i64>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT tag_id FROM question_tags WHERE question_id = ?1 ORDER BY tag_id",
    )?;
    let ids = stmt
        .query_map(params![question_id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}
