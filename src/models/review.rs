//! Customer-side review of a submitted request. The reviewer walks every
//! response, marks each approved or flagged (flag requires a note), and
//! submits the batch; the final request status is computed from the batch.

use std::collections::HashMap;

use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::pir::{PirRequest, PirStatus, ensure_transition};
use crate::models::response::{self, ResponseStatus, flags};

/// Provisional per-response state during a review pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Pending,
    Flagged,
    Approved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewTab {
    #[default]
    All,
    Pending,
    Flagged,
    Approved,
}

impl ReviewTab {
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "all" => Ok(ReviewTab::All),
            "pending" => Ok(ReviewTab::Pending),
            "flagged" => Ok(ReviewTab::Flagged),
            "approved" => Ok(ReviewTab::Approved),
            other => Err(AppError::Validation(format!("Unknown review tab '{other}'"))),
        }
    }
}

/// One response as the review screen sees it: the stored response plus the
/// derived state and the note seeded from its latest flag.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewItem {
    #[serde(flatten)]
    pub response: response::PirResponse,
    pub review_state: ReviewState,
    pub note: Option<String>,
    pub flag_count: i64,
}

/// The reviewer's verdict on one response.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewDecision {
    pub response_id: i64,
    pub state: ReviewState,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    pub pir_status: PirStatus,
    pub approved_count: i64,
    pub flagged_count: i64,
}

/// Move a submitted (or reopened flagged) request into review.
pub fn open_review(conn: &Connection, pir: &PirRequest) -> Result<PirRequest, AppError> {
    if pir.status != PirStatus::Submitted && pir.status != PirStatus::Flagged {
        return Err(AppError::InvalidStatus {
            current: pir.status.as_str().to_string(),
            operation: "open review".to_string(),
        });
    }
    super::pir::queries::update_status(conn, pir, PirStatus::InReview)?;
    super::pir::queries::require_by_id(conn, pir.id)
}

fn derive_state(
    conn: &Connection,
    resp: &response::PirResponse,
) -> Result<(ReviewState, Option<String>, i64), AppError> {
    let flag_count = flags::count_for_response(conn, resp.id)?;
    if resp.status == ResponseStatus::Approved {
        return Ok((ReviewState::Approved, None, flag_count));
    }
    if resp.status == ResponseStatus::Flagged || flag_count > 0 {
        let note = flags::latest_for_response(conn, resp.id)?.map(|f| f.description);
        return Ok((ReviewState::Flagged, note, flag_count));
    }
    Ok((ReviewState::Pending, None, flag_count))
}

/// Every response of the request with its derived initial review state.
pub fn load_items(conn: &Connection, pir: &PirRequest) -> Result<Vec<ReviewItem>, AppError> {
    let responses = response::queries::find_for_pir(conn, pir.id)?;
    let mut items = Vec::with_capacity(responses.len());
    for resp in responses {
        let (review_state, note, flag_count) = derive_state(conn, &resp)?;
        items.push(ReviewItem { response: resp, review_state, note, flag_count });
    }
    Ok(items)
}

/// Tab filtering with round semantics: in a later round the `all` view hides
/// responses already approved in an earlier round, and `pending` never shows
/// responses that already carry flag history.
pub fn filter_items(items: Vec<ReviewItem>, tab: ReviewTab, prior_rounds: i64) -> Vec<ReviewItem> {
    items
        .into_iter()
        .filter(|item| match tab {
            ReviewTab::All => !(prior_rounds > 0 && item.review_state == ReviewState::Approved),
            ReviewTab::Pending => item.review_state == ReviewState::Pending && item.flag_count == 0,
            ReviewTab::Flagged => item.review_state == ReviewState::Flagged,
            ReviewTab::Approved => item.review_state == ReviewState::Approved,
        })
        .collect()
}

/// Submit the batch. Validates everything up front, then applies the whole
/// outcome in one transaction: response status updates, one new flag row per
/// flagged decision, the final request status (approved iff zero flags this
/// round) and the product link when approving. A pending response anywhere
/// blocks submission; responses without an explicit decision keep their
/// derived state.
pub fn submit_review(
    conn: &Connection,
    pir: &PirRequest,
    decisions: &[ReviewDecision],
    reviewer_id: i64,
    product_id: Option<i64>,
) -> Result<ReviewOutcome, AppError> {
    if pir.status != PirStatus::InReview {
        return Err(AppError::InvalidStatus {
            current: pir.status.as_str().to_string(),
            operation: "submit review".to_string(),
        });
    }

    let items = load_items(conn, pir)?;
    let by_id: HashMap<i64, &ReviewItem> =
        items.iter().map(|item| (item.response.id, item)).collect();

    let mut decided: HashMap<i64, &ReviewDecision> = HashMap::new();
    for decision in decisions {
        if !by_id.contains_key(&decision.response_id) {
            return Err(AppError::Validation(format!(
                "Decision references response {} which is not part of this request",
                decision.response_id
            )));
        }
        if decision.state == ReviewState::Flagged
            && decision.note.as_deref().map(str::trim).unwrap_or("").is_empty()
        {
            return Err(AppError::Validation(
                "A flagged response requires a non-empty note".to_string(),
            ));
        }
        decided.insert(decision.response_id, decision);
    }

    // Effective state per response: explicit decision wins, otherwise the
    // derived initial state stands.
    let mut approvals: Vec<i64> = Vec::new();
    let mut flagged: Vec<(i64, Option<String>)> = Vec::new();
    let mut pending = 0i64;
    for item in &items {
        match decided.get(&item.response.id) {
            Some(decision) => match decision.state {
                ReviewState::Approved => approvals.push(item.response.id),
                ReviewState::Flagged => {
                    flagged.push((item.response.id, decision.note.clone()));
                }
                ReviewState::Pending => pending += 1,
            },
            None => match item.review_state {
                ReviewState::Approved => approvals.push(item.response.id),
                // No new flag row when the verdict is inherited history.
                ReviewState::Flagged => flagged.push((item.response.id, None)),
                ReviewState::Pending => pending += 1,
            },
        }
    }
    if pending > 0 {
        return Err(AppError::Validation(format!(
            "{pending} response(s) still pending review"
        )));
    }

    let approving = flagged.is_empty();
    let target = if approving { PirStatus::Approved } else { PirStatus::Flagged };
    ensure_transition(pir.status, target)?;

    let tx_active = !conn.is_autocommit();
    if !tx_active {
        conn.execute_batch("BEGIN IMMEDIATE")?;
    }
    let result = (|| -> Result<(), AppError> {
        for response_id in &approvals {
            conn.execute(
                "UPDATE pir_responses SET status = 'approved', \
                        updated_at = strftime('%Y-%m-%dT%H:%M:%S','now') \
                 WHERE id = ?1",
                params![response_id],
            )?;
        }
        for (response_id, note) in &flagged {
            conn.execute(
                "UPDATE pir_responses SET status = 'flagged', \
                        updated_at = strftime('%Y-%m-%dT%H:%M:%S','now') \
                 WHERE id = ?1",
                params![response_id],
            )?;
            if let Some(note) = note {
                flags::create(conn, *response_id, note, reviewer_id)?;
            }
        }
        if approving {
            conn.execute(
                "UPDATE pir_requests SET status = 'approved', \
                        product_id = COALESCE(?1, product_id), \
                        updated_at = strftime('%Y-%m-%dT%H:%M:%S','now') \
                 WHERE id = ?2",
                params![product_id, pir.id],
            )?;
        } else {
            conn.execute(
                "UPDATE pir_requests SET status = 'flagged', \
                        prior_rounds = prior_rounds + 1, \
                        updated_at = strftime('%Y-%m-%dT%H:%M:%S','now') \
                 WHERE id = ?1",
                params![pir.id],
            )?;
        }
        Ok(())
    })();
    if !tx_active {
        match &result {
            Ok(()) => conn.execute_batch("COMMIT")?,
            Err(_) => conn.execute_batch("ROLLBACK")?,
        }
    }
    result?;

    Ok(ReviewOutcome {
        pir_status: target,
        approved_count: approvals.len() as i64,
        flagged_count: flagged.len() as i64,
    })
}
