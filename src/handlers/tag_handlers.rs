use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::auth::session::{require_identity, require_permission};
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::tag::{self, TagInput};

use super::audit_soft;

/// GET /api/v1/tags
pub async fn list(pool: web::Data<DbPool>, session: Session) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.view")?;
    let conn = pool.get()?;
    Ok(HttpResponse::Ok().json(tag::find_all(&conn)?))
}

/// POST /api/v1/tags
pub async fn create(
    pool: web::Data<DbPool>,
    session: Session,
    input: web::Json<TagInput>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "tags.manage")?;
    let (user_id, _) = require_identity(&session)?;
    let conn = pool.get()?;

    let id = tag::create(&conn, &input)?;
    audit_soft(&conn, user_id, "tag.create", "tag", id, serde_json::json!({ "name": input.name }));
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

/// PUT /api/v1/tags/{id}
pub async fn update(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
    input: web::Json<TagInput>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "tags.manage")?;
    let (user_id, _) = require_identity(&session)?;
    let id = path.into_inner();
    let conn = pool.get()?;

    tag::update(&conn, id, &input)?;
    audit_soft(&conn, user_id, "tag.update", "tag", id, serde_json::json!({ "name": input.name }));
    Ok(HttpResponse::Ok().json(serde_json::json!({ "updated": true })))
}

/// DELETE /api/v1/tags/{id}
pub async fn delete(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "tags.manage")?;
    let (user_id, _) = require_identity(&session)?;
    let id = path.into_inner();
    let conn = pool.get()?;

    tag::delete(&conn, id)?;
    audit_soft(&conn, user_id, "tag.delete", "tag", id, serde_json::json!({}));
    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": true })))
}
