use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::auth::session::{require_identity, require_permission};
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::component::{self, Component, ComponentInput, Material, MaterialInput};
use crate::models::pir::{self, PirRequest};

use super::audit_soft;
use super::response_handlers::response_context;

#[derive(Debug, Serialize)]
struct ComponentWithMaterials {
    #[serde(flatten)]
    component: Component,
    materials: Vec<Material>,
}

/// The acting user must be on the supplier side of an unlocked request.
fn require_supplier_editor(pir: &PirRequest, company_id: i64) -> Result<(), AppError> {
    pir::queries::require_supplier_party(pir, company_id)?;
    pir.ensure_unlocked()
}

fn component_context(
    conn: &rusqlite::Connection,
    component_id: i64,
) -> Result<(Component, PirRequest), AppError> {
    let comp = component::find_component_by_id(conn, component_id)?.ok_or(AppError::NotFound)?;
    let (_, pir) = response_context(conn, comp.pir_response_id)?;
    Ok((comp, pir))
}

fn material_context(
    conn: &rusqlite::Connection,
    material_id: i64,
) -> Result<(Material, PirRequest), AppError> {
    let mat = component::find_material_by_id(conn, material_id)?.ok_or(AppError::NotFound)?;
    let (_, pir) = component_context(conn, mat.component_id)?;
    Ok((mat, pir))
}

/// GET /api/v1/responses/{id}/components - components with nested materials
pub async fn list(
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

    let mut out = Vec::new();
    for component in component::find_components(&conn, response_id)? {
        let materials = component::find_materials(&conn, component.id)?;
        out.push(ComponentWithMaterials { component, materials });
    }
    Ok(HttpResponse::Ok().json(out))
}

/// POST /api/v1/responses/{id}/components
pub async fn create(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
    input: web::Json<ComponentInput>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.respond")?;
    let (user_id, company_id) = require_identity(&session)?;
    let response_id = path.into_inner();
    let conn = pool.get()?;

    let (_, pir) = response_context(&conn, response_id)?;
    require_supplier_editor(&pir, company_id)?;

    let id = component::create_component(&conn, response_id, &input)?;
    audit_soft(
        &conn,
        user_id,
        "component.create",
        "component",
        id,
        serde_json::json!({ "response_id": response_id }),
    );
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

/// PUT /api/v1/components/{id}
pub async fn update(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
    input: web::Json<ComponentInput>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.respond")?;
    let (user_id, company_id) = require_identity(&session)?;
    let component_id = path.into_inner();
    let conn = pool.get()?;

    let (_, pir) = component_context(&conn, component_id)?;
    require_supplier_editor(&pir, company_id)?;

    component::update_component(&conn, component_id, &input)?;
    audit_soft(&conn, user_id, "component.update", "component", component_id, serde_json::json!({}));
    Ok(HttpResponse::Ok().json(serde_json::json!({ "updated": true })))
}

/// DELETE /api/v1/components/{id}
pub async fn delete(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.respond")?;
    let (user_id, company_id) = require_identity(&session)?;
    let component_id = path.into_inner();
    let conn = pool.get()?;

    let (_, pir) = component_context(&conn, component_id)?;
    require_supplier_editor(&pir, company_id)?;

    component::delete_component(&conn, component_id)?;
    audit_soft(&conn, user_id, "component.delete", "component", component_id, serde_json::json!({}));
    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": true })))
}

/// POST /api/v1/components/{id}/materials
pub async fn create_material(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
    input: web::Json<MaterialInput>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.respond")?;
    let (user_id, company_id) = require_identity(&session)?;
    let component_id = path.into_inner();
    let conn = pool.get()?;

    let (_, pir) = component_context(&conn, component_id)?;
    require_supplier_editor(&pir, company_id)?;

    let id = component::create_material(&conn, component_id, &input)?;
    audit_soft(
        &conn,
        user_id,
        "material.create",
        "material",
        id,
        serde_json::json!({ "component_id": component_id }),
    );
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

/// PUT /api/v1/materials/{id}
pub async fn update_material(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
    input: web::Json<MaterialInput>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.respond")?;
    let (user_id, company_id) = require_identity(&session)?;
    let material_id = path.into_inner();
    let conn = pool.get()?;

    let (_, pir) = material_context(&conn, material_id)?;
    require_supplier_editor(&pir, company_id)?;

    component::update_material(&conn, material_id, &input)?;
    audit_soft(&conn, user_id, "material.update", "material", material_id, serde_json::json!({}));
    Ok(HttpResponse::Ok().json(serde_json::json!({ "updated": true })))
}

/// DELETE /api/v1/materials/{id}
pub async fn delete_material(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, "pir.respond")?;
    let (user_id, company_id) = require_identity(&session)?;
    let material_id = path.into_inner();
    let conn = pool.get()?;

    let (_, pir) = material_context(&conn, material_id)?;
    require_supplier_editor(&pir, company_id)?;

    component::delete_material(&conn, material_id)?;
    audit_soft(&conn, user_id, "material.delete", "material", material_id, serde_json::json!({}));
    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": true })))
}
