use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::session::{require_identity, require_permission};
use crate::db::DbPool;
use crate::debounce::SaveScheduler;
use crate::errors::AppError;
use crate::models::pir::{self, PirRequest};
use crate::models::response::{self, PirResponse, comments, flags};

use super::audit_soft;

/// Debounced draft-answer writes, keyed by (pir_id, question_id).
pub type AnswerScheduler = SaveScheduler<(i64, i64), Value>;

/// Resolve a response id to the response and its owning request.
pub(crate) fn response_context(
    conn: &rusqlite::Connection,
    response_id: i64,
) -> Result<(PirResponse, PirRequest), AppError> {
    let resp = response::queries::require_by_id(conn, response_id)?;
    let pir = pir::queries::require_by_id(conn, resp.pir_id)?;
    Ok((resp, pir))
}

/// GET /api/v1/pirs/{id}/responses
pub async fn list(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.view")?;
    let (_, company_id) = require_identity(&session)?;
    let pir_id = path.into_inner();
    let conn = pool.get()?;

    let pir = pir::queries::require_by_id(&conn, pir_id)?;
    pir::queries::require_party(&pir, company_id)?;
    Ok(HttpResponse::Ok().json(response::queries::find_for_pir(&conn, pir_id)?))
}

#[derive(Debug, Deserialize)]
pub struct SaveAnswerInput {
    pub answer: Value,
    /// Explicit Save: bypass the debounce window and write now.
    #[serde(default)]
    pub flush: bool,
}

/// PUT /api/v1/pirs/{id}/responses/{question_id}
///
/// Validates the answer against the question's type up front, then hands it
/// to the scheduler. Without `flush` the write lands after the debounce
/// delay and the call returns 202; with `flush` the write happens before the
/// response and the stored row is returned.
pub async fn save(
    pool: web::Data<DbPool>,
    session: Session,
    scheduler: web::Data<AnswerScheduler>,
    path: web::Path<(i64, i64)>,
    input: web::Json<SaveAnswerInput>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.respond")?;
    let (user_id, company_id) = require_identity(&session)?;
    let (pir_id, question_id) = path.into_inner();

    {
        let conn = pool.get()?;
        let pir = pir::queries::require_by_id(&conn, pir_id)?;
        pir::queries::require_supplier_party(&pir, company_id)?;
        pir.ensure_unlocked()?;

        let q = crate::models::question::queries::find_by_id(&conn, question_id)?
            .ok_or(AppError::NotFound)?;
        response::validate_answer(&q, &input.answer)?;
    }

    let key = (pir_id, question_id);
    scheduler.schedule(key, input.answer.clone());

    if !input.flush {
        return Ok(HttpResponse::Accepted().json(serde_json::json!({ "scheduled": true })));
    }

    scheduler.flush(key).await;

    let conn = pool.get()?;
    let row = response::queries::find_by_pir_and_question(&conn, pir_id, question_id)?
        .ok_or_else(|| AppError::Validation("Save failed; please retry".to_string()))?;
    audit_soft(
        &conn,
        user_id,
        "response.save",
        "response",
        row.id,
        serde_json::json!({ "pir_id": pir_id, "question_id": question_id }),
    );
    Ok(HttpResponse::Ok().json(row))
}

/// POST /api/v1/pirs/{id}/responses/{question_id}/ensure
///
/// Idempotent placeholder for component_material_list questions, so child
/// component rows have a stable parent id before any answer exists.
pub async fn ensure(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.respond")?;
    let (_, company_id) = require_identity(&session)?;
    let (pir_id, question_id) = path.into_inner();
    let conn = pool.get()?;

    let pir = pir::queries::require_by_id(&conn, pir_id)?;
    pir::queries::require_supplier_party(&pir, company_id)?;

    let row = response::queries::ensure_placeholder(&conn, &pir, question_id)?;
    Ok(HttpResponse::Ok().json(row))
}

/// GET /api/v1/responses/{id}/comments
pub async fn list_comments(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.view")?;
    let (_, company_id) = require_identity(&session)?;
    let response_id = path.into_inner();
    let conn = pool.get()?;

    let (_, pir) = response_context(&conn, response_id)?;
    pir::queries::require_party(&pir, company_id)?;
    Ok(HttpResponse::Ok().json(comments::find_for_response(&conn, response_id)?))
}

#[derive(Debug, Deserialize)]
pub struct CommentInput {
    pub body: String,
}

/// POST /api/v1/responses/{id}/comments
pub async fn create_comment(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
    input: web::Json<CommentInput>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "comments.post")?;
    let (user_id, company_id) = require_identity(&session)?;
    let response_id = path.into_inner();
    let conn = pool.get()?;

    let (_, pir) = response_context(&conn, response_id)?;
    pir::queries::require_party(&pir, company_id)?;

    let id = comments::create(&conn, response_id, &input.body, user_id)?;
    audit_soft(&conn, user_id, "comment.create", "response", response_id, serde_json::json!({}));
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

/// GET /api/v1/responses/{id}/flags - flag history, newest first
pub async fn list_flags(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.view")?;
    let (_, company_id) = require_identity(&session)?;
    let response_id = path.into_inner();
    let conn = pool.get()?;

    let (_, pir) = response_context(&conn, response_id)?;
    pir::queries::require_party(&pir, company_id)?;
    Ok(HttpResponse::Ok().json(flags::find_for_response(&conn, response_id)?))
}

#[derive(Debug, Deserialize)]
pub struct FlagStatusInput {
    pub status: flags::FlagStatus,
}

/// PUT /api/v1/flags/{id} - step a flag's status
///
/// Either party may move a flag to open/in_progress; closing it out
/// (resolved/rejected) is the reviewing customer's call.
pub async fn update_flag(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
    input: web::Json<FlagStatusInput>,
) -> Result<HttpResponse, AppError> {
    let (user_id, company_id) = require_identity(&session)?;
    let flag_id = path.into_inner();
    let conn = pool.get()?;

    let flag = flags::find_by_id(&conn, flag_id)?.ok_or(AppError::NotFound)?;
    let (_, pir) = response_context(&conn, flag.response_id)?;
    match input.status {
        flags::FlagStatus::Resolved | flags::FlagStatus::Rejected => {
            require_permission(&session, "pir.review")?;
            pir::queries::require_customer_party(&pir, company_id)?;
        }
        flags::FlagStatus::Open | flags::FlagStatus::InProgress => {
            require_permission(&session, "pir.view")?;
            pir::queries::require_party(&pir, company_id)?;
        }
    }
    pir.ensure_unlocked()?;

    flags::update_status(&conn, flag_id, input.status, user_id)?;
    audit_soft(
        &conn,
        user_id,
        "flag.update_status",
        "flag",
        flag_id,
        serde_json::json!({ "status": input.status.as_str() }),
    );
    Ok(HttpResponse::Ok().json(serde_json::json!({ "updated": true })))
}
