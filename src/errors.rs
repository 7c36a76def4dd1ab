use actix_web::{HttpResponse, ResponseError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Db(rusqlite::Error),
    Pool(r2d2::Error),
    /// Input rejected before any write; the message reaches the client verbatim.
    Validation(String),
    /// Requested status change is not in the lifecycle transition table.
    InvalidTransition { from: String, to: String },
    /// Operation is legal in some status, but not the current one.
    InvalidStatus { current: String, operation: String },
    /// The PIR reached a terminal status; it and its responses are read-only.
    Locked,
    PermissionDenied(String),
    Session(String),
    Hash(String),
    NotFound,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Pool(e) => write!(f, "Pool error: {e}"),
            AppError::Validation(msg) => write!(f, "{msg}"),
            AppError::InvalidTransition { from, to } => {
                write!(f, "Illegal status transition: {from} -> {to}")
            }
            AppError::InvalidStatus { current, operation } => {
                write!(f, "Cannot {operation} while status is '{current}'")
            }
            AppError::Locked => write!(f, "Request is approved and locked"),
            AppError::PermissionDenied(code) => write!(f, "Permission denied: {code}"),
            AppError::Session(msg) => write!(f, "Session error: {msg}"),
            AppError::Hash(msg) => write!(f, "Hash error: {msg}"),
            AppError::NotFound => write!(f, "Not found"),
        }
    }
}

fn body(error: &str, details: Option<String>) -> serde_json::Value {
    match details {
        Some(d) => serde_json::json!({ "error": error, "details": d }),
        None => serde_json::json!({ "error": error }),
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound => HttpResponse::NotFound().json(body("Not found", None)),
            AppError::Validation(msg) => {
                HttpResponse::BadRequest().json(body("Validation failed", Some(msg.clone())))
            }
            AppError::InvalidTransition { .. } | AppError::InvalidStatus { .. } => {
                HttpResponse::Conflict().json(body("Invalid status", Some(self.to_string())))
            }
            AppError::Locked => {
                HttpResponse::Conflict().json(body("Locked", Some(self.to_string())))
            }
            AppError::PermissionDenied(_) => {
                HttpResponse::Forbidden().json(body("Forbidden", Some(self.to_string())))
            }
            AppError::Session(_) => {
                HttpResponse::Unauthorized().json(body("Not authenticated", None))
            }
            _ => {
                log::error!("{self}");
                HttpResponse::InternalServerError().json(body("Internal server error", None))
            }
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Db(e)
    }
}

impl From<r2d2::Error> for AppError {
    fn from(e: r2d2::Error) -> Self {
        AppError::Pool(e)
    }
}
