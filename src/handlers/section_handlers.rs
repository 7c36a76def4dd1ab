use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::auth::session::{require_identity, require_permission};
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::section::{self, SectionInput};

use super::audit_soft;

/// GET /api/v1/sections - the full two-level section tree
pub async fn list(pool: web::Data<DbPool>, session: Session) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.view")?;
    let conn = pool.get()?;
    Ok(HttpResponse::Ok().json(section::find_tree(&conn)?))
}

/// POST /api/v1/sections
pub async fn create(
    pool: web::Data<DbPool>,
    session: Session,
    input: web::Json<SectionInput>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "sections.manage")?;
    let (user_id, _) = require_identity(&session)?;
    let conn = pool.get()?;

    let id = section::create(&conn, &input)?;
    audit_soft(
        &conn,
        user_id,
        "section.create",
        "section",
        id,
        serde_json::json!({ "name": input.name }),
    );
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

/// PUT /api/v1/sections/{id} - rename/reorder only
pub async fn update(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
    input: web::Json<SectionInput>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "sections.manage")?;
    let (user_id, _) = require_identity(&session)?;
    let id = path.into_inner();
    let conn = pool.get()?;

    section::update(&conn, id, &input.name, input.description.as_deref(), input.sort_order)?;
    audit_soft(
        &conn,
        user_id,
        "section.update",
        "section",
        id,
        serde_json::json!({ "name": input.name }),
    );
    Ok(HttpResponse::Ok().json(serde_json::json!({ "updated": true })))
}

/// DELETE /api/v1/sections/{id}
pub async fn delete(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "sections.manage")?;
    let (user_id, _) = require_identity(&session)?;
    let id = path.into_inner();
    let conn = pool.get()?;

    section::delete(&conn, id)?;
    audit_soft(&conn, user_id, "section.delete", "section", id, serde_json::json!({}));
    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": true })))
}
