use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Lifecycle of a Product Information Request.
///
/// draft -> submitted -> in_review -> approved | flagged | rejected,
/// with flagged -> submitted (supplier resubmits) and flagged -> in_review
/// (customer reopens the round). Approved and rejected are terminal: the
/// request and all its responses become read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PirStatus {
    Draft,
    Submitted,
    InReview,
    Flagged,
    Approved,
    Rejected,
}

impl PirStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PirStatus::Draft => "draft",
            PirStatus::Submitted => "submitted",
            PirStatus::InReview => "in_review",
            PirStatus::Flagged => "flagged",
            PirStatus::Approved => "approved",
            PirStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "draft" => Ok(PirStatus::Draft),
            "submitted" => Ok(PirStatus::Submitted),
            "in_review" => Ok(PirStatus::InReview),
            "flagged" => Ok(PirStatus::Flagged),
            "approved" => Ok(PirStatus::Approved),
            "rejected" => Ok(PirStatus::Rejected),
            other => Err(AppError::Validation(format!("Unknown PIR status '{other}'"))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PirStatus::Approved | PirStatus::Rejected)
    }

    /// The transition table of the lifecycle machine.
    pub fn can_transition_to(&self, to: PirStatus) -> bool {
        use PirStatus::*;
        matches!(
            (self, to),
            (Draft, Submitted)
                | (Submitted, InReview)
                | (Flagged, InReview)
                | (Flagged, Submitted)
                | (InReview, Approved)
                | (InReview, Flagged)
                | (InReview, Rejected)
        )
    }
}

/// Fail with a descriptive error when a transition is not in the table.
pub fn ensure_transition(from: PirStatus, to: PirStatus) -> Result<(), AppError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PirRequest {
    pub id: i64,
    pub customer_company_id: i64,
    pub supplier_company_id: i64,
    pub product_id: Option<i64>,
    pub suggested_product_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub status: PirStatus,
    /// Completed review rounds that ended in `flagged`; drives the
    /// later-round filtering in the review screen.
    pub prior_rounds: i64,
    pub created_by: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl PirRequest {
    /// Once terminal (approved in particular), every mutation under the PIR
    /// is refused. Derived from status, never stored.
    pub fn is_locked(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn ensure_unlocked(&self) -> Result<(), AppError> {
        if self.is_locked() {
            Err(AppError::Locked)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PirInput {
    pub supplier_company_id: i64,
    pub product_id: Option<i64>,
    pub suggested_product_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}
