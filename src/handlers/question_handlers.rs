use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::auth::session::{require_identity, require_permission};
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::question::{self, QuestionInput};

use super::audit_soft;

/// GET /api/v1/questions - the whole question bank
pub async fn list(pool: web::Data<DbPool>, session: Session) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.view")?;
    let conn = pool.get()?;
    Ok(HttpResponse::Ok().json(question::queries::find_all(&conn)?))
}

/// GET /api/v1/questions/{id} - one question with its tag set
pub async fn read(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.view")?;
    let id = path.into_inner();
    let conn = pool.get()?;

    let q = question::queries::find_by_id(&conn, id)?.ok_or(AppError::NotFound)?;
    let tag_ids = question::queries::tag_ids_of(&conn, id)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "question": q, "tag_ids": tag_ids })))
}

/// POST /api/v1/questions
pub async fn create(
    pool: web::Data<DbPool>,
    session: Session,
    input: web::Json<QuestionInput>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "questions.manage")?;
    let (user_id, _) = require_identity(&session)?;
    let conn = pool.get()?;

    let id = question::queries::create(&conn, &input)?;
    audit_soft(
        &conn,
        user_id,
        "question.create",
        "question",
        id,
        serde_json::json!({ "type": input.question_type.as_str() }),
    );
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

/// PUT /api/v1/questions/{id}
pub async fn update(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
    input: web::Json<QuestionInput>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "questions.manage")?;
    let (user_id, _) = require_identity(&session)?;
    let id = path.into_inner();
    let conn = pool.get()?;

    question::queries::update(&conn, id, &input)?;
    audit_soft(
        &conn,
        user_id,
        "question.update",
        "question",
        id,
        serde_json::json!({ "type": input.question_type.as_str() }),
    );
    Ok(HttpResponse::Ok().json(serde_json::json!({ "updated": true })))
}

/// DELETE /api/v1/questions/{id}
pub async fn delete(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "questions.manage")?;
    let (user_id, _) = require_identity(&session)?;
    let id = path.into_inner();
    let conn = pool.get()?;

    question::queries::delete(&conn, id)?;
    audit_soft(&conn, user_id, "question.delete", "question", id, serde_json::json!({}));
    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": true })))
}
