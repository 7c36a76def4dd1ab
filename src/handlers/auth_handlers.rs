use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::password::verify_password;
use crate::auth::permissions::codes_for_role;
use crate::auth::session::require_identity;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::{company, user};

use super::audit_soft;

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

fn bad_credentials() -> AppError {
    AppError::Session("Invalid username or password".to_string())
}

/// POST /api/v1/auth/login
pub async fn login(
    pool: web::Data<DbPool>,
    session: Session,
    input: web::Json<LoginInput>,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;

    let user = user::find_by_username(&conn, &input.username)?.ok_or_else(bad_credentials)?;
    let valid = verify_password(&input.password, &user.password).map_err(AppError::Hash)?;
    if !valid {
        return Err(bad_credentials());
    }

    let membership = company::membership_of(&conn, user.id)?
        .ok_or_else(|| AppError::Session("User has no company membership".to_string()))?;
    let permissions = codes_for_role(&membership.role).join(",");

    session.renew();
    let store = |key: &str, value: serde_json::Value| {
        session
            .insert(key, value)
            .map_err(|e| AppError::Session(format!("Failed to store session: {e}")))
    };
    store("user_id", serde_json::json!(user.id))?;
    store("username", serde_json::json!(user.username))?;
    store("company_id", serde_json::json!(membership.company_id))?;
    store("permissions", serde_json::json!(permissions))?;

    audit_soft(&conn, user.id, "auth.login", "user", user.id, serde_json::json!({}));

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "user_id": user.id,
        "username": user.username,
        "display_name": user.display_name,
        "company_id": membership.company_id,
        "company_name": membership.company_name,
        "role": membership.role,
        "permissions": codes_for_role(&membership.role),
    })))
}

/// POST /api/v1/auth/logout
pub async fn logout(session: Session) -> Result<HttpResponse, AppError> {
    session.purge();
    Ok(HttpResponse::Ok().json(serde_json::json!({ "logged_out": true })))
}

/// GET /api/v1/auth/me
pub async fn me(pool: web::Data<DbPool>, session: Session) -> Result<HttpResponse, AppError> {
    let (user_id, company_id) = require_identity(&session)?;
    let conn = pool.get()?;

    let user = user::find_display_by_id(&conn, user_id)?.ok_or(AppError::NotFound)?;
    let membership = company::membership_of(&conn, user_id)?
        .ok_or_else(|| AppError::Session("User has no company membership".to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "user": user,
        "company_id": company_id,
        "company_name": membership.company_name,
        "role": membership.role,
        "permissions": codes_for_role(&membership.role),
    })))
}
