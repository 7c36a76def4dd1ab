use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::session::{require_identity, require_permission};
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::pir::{self, PirStatus};
use crate::models::review::{self, ReviewDecision, ReviewTab};
use crate::notify::{Dispatcher, NotificationEvent, dispatch_soft};

use super::audit_soft;

/// POST /api/v1/pirs/{id}/review/open
pub async fn open(
    pool: web::Data<DbPool>,
    session: Session,
    dispatcher: web::Data<dyn Dispatcher>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.review")?;
    let (user_id, company_id) = require_identity(&session)?;
    let pir_id = path.into_inner();
    let conn = pool.get()?;

    let pir = pir::queries::require_by_id(&conn, pir_id)?;
    pir::queries::require_customer_party(&pir, company_id)?;

    let updated = review::open_review(&conn, &pir)?;
    audit_soft(
        &conn,
        user_id,
        "review.open",
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
            new_status: PirStatus::InReview.as_str().to_string(),
        },
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({ "pir": updated, "warning": warning })))
}

/// GET /api/v1/pirs/{id}/review?tab=all|pending|flagged|approved
pub async fn read(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.review")?;
    let (_, company_id) = require_identity(&session)?;
    let pir_id = path.into_inner();
    let conn = pool.get()?;

    let pir = pir::queries::require_by_id(&conn, pir_id)?;
    pir::queries::require_customer_party(&pir, company_id)?;

    let tab = match query.get("tab") {
        Some(raw) => ReviewTab::parse(raw)?,
        None => ReviewTab::All,
    };
    let items = review::load_items(&conn, &pir)?;
    let items = review::filter_items(items, tab, pir.prior_rounds);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "pir": pir,
        "locked": pir.is_locked(),
        "items": items,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ReviewSubmitInput {
    pub decisions: Vec<ReviewDecision>,
    /// Catalog product to link when the outcome is approval.
    pub product_id: Option<i64>,
}

/// POST /api/v1/pirs/{id}/review/submit
pub async fn submit(
    pool: web::Data<DbPool>,
    session: Session,
    dispatcher: web::Data<dyn Dispatcher>,
    path: web::Path<i64>,
    input: web::Json<ReviewSubmitInput>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.review")?;
    let (user_id, company_id) = require_identity(&session)?;
    let pir_id = path.into_inner();
    let conn = pool.get()?;

    let pir = pir::queries::require_by_id(&conn, pir_id)?;
    pir::queries::require_customer_party(&pir, company_id)?;

    let outcome = review::submit_review(&conn, &pir, &input.decisions, user_id, input.product_id)?;

    audit_soft(
        &conn,
        user_id,
        "review.submit",
        "pir",
        pir_id,
        serde_json::json!({
            "outcome": outcome.pir_status.as_str(),
            "flagged_count": outcome.flagged_count,
        }),
    );
    let warning = dispatch_soft(
        dispatcher.get_ref(),
        &NotificationEvent::ReviewCompleted {
            pir_id,
            customer_company_id: pir.customer_company_id,
            supplier_company_id: pir.supplier_company_id,
            outcome: outcome.pir_status.as_str().to_string(),
            flagged_count: outcome.flagged_count as usize,
        },
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({ "outcome": outcome, "warning": warning })))
}
