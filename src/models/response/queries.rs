use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use crate::errors::AppError;
use crate::models::pir::PirRequest;
use crate::models::question;
use super::types::{PirResponse, ResponseStatus};
use super::validate::validate_answer;

const SELECT_RESPONSE: &str = "SELECT id, pir_id, question_id, answer, status, submitted_at, \
     created_at, updated_at FROM pir_responses";

fn row_to_raw(row: &rusqlite::Row) -> rusqlite::Result<(PirResponse, String, String)> {
    let status_raw: String = row.get("status")?;
    let answer_raw: String = row.get("answer")?;
    Ok((
        PirResponse {
            id: row.get("id")?,
            pir_id: row.get("pir_id")?,
            question_id: row.get("question_id")?,
            answer: Value::Null, // replaced after parse
            status: ResponseStatus::Draft,
            submitted_at: row.get("submitted_at")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        },
        status_raw,
        answer_raw,
    ))
}

fn cook(
    (mut response, status_raw, answer_raw): (PirResponse, String, String),
) -> Result<PirResponse, AppError> {
    response.status = ResponseStatus::parse(&status_raw)?;
    response.answer = serde_json::from_str(&answer_raw)
        .map_err(|e| AppError::Validation(format!("Stored answer is not valid JSON: {e}")))?;
    Ok(response)
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<PirResponse>, AppError> {
    let sql = format!("{SELECT_RESPONSE} WHERE id = ?1");
    let raw = conn.query_row(&sql, params![id], row_to_raw).optional()?;
    raw.map(cook).transpose()
}

pub fn require_by_id(conn: &Connection, id: i64) -> Result<PirResponse, AppError> {
    find_by_id(conn, id)?.ok_or(AppError::NotFound)
}

pub fn find_by_pir_and_question(
    conn: &Connection,
    pir_id: i64,
    question_id: i64,
) -> Result<Option<PirResponse>, AppError> {
    let sql = format!("{SELECT_RESPONSE} WHERE pir_id = ?1 AND question_id = ?2");
    let raw = conn
        .query_row(&sql, params![pir_id, question_id], row_to_raw)
        .optional()?;
    raw.map(cook).transpose()
}

/// All responses of a PIR, in question display order.
pub fn find_for_pir(conn: &Connection, pir_id: i64) -> Result<Vec<PirResponse>, AppError> {
    let sql = format!(
        "{SELECT_RESPONSE} WHERE pir_id = ?1 \
         ORDER BY (SELECT q.sort_order FROM questions q WHERE q.id = question_id), question_id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let raws = stmt
        .query_map(params![pir_id], row_to_raw)?
        .collect::<Result<Vec<_>, _>>()?;
    raws.into_iter().map(cook).collect()
}

/// Upsert the supplier's answer for one question. Validates the payload
/// against the question's type; the row lands in (or stays at) draft status.
pub fn save_answer(
    conn: &Connection,
    pir: &PirRequest,
    question_id: i64,
    answer: &Value,
) -> Result<PirResponse, AppError> {
    pir.ensure_unlocked()?;

    let q = question::queries::find_by_id(conn, question_id)?.ok_or(AppError::NotFound)?;
    validate_answer(&q, answer)?;

    let answer_json = answer.to_string();
    conn.execute(
        "INSERT INTO pir_responses (pir_id, question_id, answer, status) \
         VALUES (?1, ?2, ?3, 'draft') \
         ON CONFLICT(pir_id, question_id) DO UPDATE SET \
             answer = excluded.answer, \
             status = 'draft', \
             updated_at = strftime('%Y-%m-%dT%H:%M:%S','now')",
        params![pir.id, question_id, answer_json],
    )?;

    find_by_pir_and_question(conn, pir.id, question_id)?.ok_or(AppError::NotFound)
}

/// Idempotent placeholder upsert for component_material_list questions:
/// child component rows need a stable parent id before any answer exists.
/// Racing or repeated invocations converge on the single row keyed by
/// (pir_id, question_id); an existing row (and its answer) is left untouched.
pub fn ensure_placeholder(
    conn: &Connection,
    pir: &PirRequest,
    question_id: i64,
) -> Result<PirResponse, AppError> {
    pir.ensure_unlocked()?;

    let q = question::queries::find_by_id(conn, question_id)?.ok_or(AppError::NotFound)?;
    if q.question_type != question::QuestionType::ComponentMaterialList {
        return Err(AppError::Validation(
            "Placeholder responses exist only for component_material_list questions".to_string(),
        ));
    }

    conn.execute(
        "INSERT INTO pir_responses (pir_id, question_id, answer, status) \
         VALUES (?1, ?2, '{}', 'draft') \
         ON CONFLICT(pir_id, question_id) DO NOTHING",
        params![pir.id, question_id],
    )?;

    find_by_pir_and_question(conn, pir.id, question_id)?.ok_or(AppError::NotFound)
}

pub fn count_for_pir(conn: &Connection, pir_id: i64) -> Result<i64, AppError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM pir_responses WHERE pir_id = ?1",
        params![pir_id],
        |row| row.get(0),
    )?)
}
