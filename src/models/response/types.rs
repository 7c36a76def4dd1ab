use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Per-answer status, dependent on the owning PIR's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Draft,
    Submitted,
    Flagged,
    Approved,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Draft => "draft",
            ResponseStatus::Submitted => "submitted",
            ResponseStatus::Flagged => "flagged",
            ResponseStatus::Approved => "approved",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "draft" => Ok(ResponseStatus::Draft),
            "submitted" => Ok(ResponseStatus::Submitted),
            "flagged" => Ok(ResponseStatus::Flagged),
            "approved" => Ok(ResponseStatus::Approved),
            other => Err(AppError::Validation(format!("Unknown response status '{other}'"))),
        }
    }
}

/// One answer row; (pir_id, question_id) is unique.
#[derive(Debug, Clone, Serialize)]
pub struct PirResponse {
    pub id: i64,
    pub pir_id: i64,
    pub question_id: i64,
    pub answer: serde_json::Value,
    pub status: ResponseStatus,
    pub submitted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
