use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::auth::session::{require_identity, require_permission};
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::numbering::build_catalog;
use crate::models::pir::{self, PirInput, PirStatus};
use crate::models::{question, response, section, tag};
use crate::notify::{Dispatcher, NotificationEvent, dispatch_soft};

use super::audit_soft;

/// POST /api/v1/pirs - customer issues a request to a supplier
pub async fn create(
    pool: web::Data<DbPool>,
    session: Session,
    input: web::Json<PirInput>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.create")?;
    let (user_id, company_id) = require_identity(&session)?;
    let conn = pool.get()?;

    let id = pir::queries::create(&conn, company_id, user_id, &input)?;
    audit_soft(
        &conn,
        user_id,
        "pir.create",
        "pir",
        id,
        serde_json::json!({ "supplier_company_id": input.supplier_company_id }),
    );
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

/// GET /api/v1/pirs - requests where the session's company is a party
pub async fn list(pool: web::Data<DbPool>, session: Session) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.view")?;
    let (_, company_id) = require_identity(&session)?;
    let conn = pool.get()?;
    Ok(HttpResponse::Ok().json(pir::queries::find_for_company(&conn, company_id)?))
}

/// GET /api/v1/pirs/{id}
pub async fn read(
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

    let tags = tag::find_for_pir(&conn, pir_id)?;
    let response_count = response::queries::count_for_pir(&conn, pir_id)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "pir": pir,
        "locked": pir.is_locked(),
        "tags": tags,
        "response_count": response_count,
    })))
}

/// POST /api/v1/pirs/{id}/submit - supplier submits (or resubmits) answers
pub async fn submit(
    pool: web::Data<DbPool>,
    session: Session,
    dispatcher: web::Data<dyn Dispatcher>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.respond")?;
    let (user_id, company_id) = require_identity(&session)?;
    let pir_id = path.into_inner();
    let conn = pool.get()?;

    let pir = pir::queries::require_by_id(&conn, pir_id)?;
    pir::queries::require_supplier_party(&pir, company_id)?;
    pir::queries::submit(&conn, &pir)?;

    audit_soft(
        &conn,
        user_id,
        "pir.submit",
        "pir",
        pir_id,
        serde_json::json!({ "from": pir.status.as_str() }),
    );
    let warning = dispatch_soft(
        dispatcher.get_ref(),
        &NotificationEvent::PirStatusUpdate {
            pir_id,
            customer_company_id: pir.customer_company_id,
            supplier_company_id: pir.supplier_company_id,
            old_status: pir.status.as_str().to_string(),
            new_status: PirStatus::Submitted.as_str().to_string(),
        },
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": PirStatus::Submitted,
        "warning": warning,
    })))
}

/// GET /api/v1/pirs/{id}/questions - the tag-selected questionnaire, numbered
pub async fn questions(
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

    let tree = section::find_tree(&conn)?;
    let selected = question::queries::find_for_pir(&conn, pir_id)?;
    let catalog = build_catalog(tree, selected);
    Ok(HttpResponse::Ok().json(catalog))
}
