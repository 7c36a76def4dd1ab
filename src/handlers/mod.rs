pub mod auth_handlers;
pub mod component_handlers;
pub mod pir_handlers;
pub mod question_handlers;
pub mod response_handlers;
pub mod review_handlers;
pub mod section_handlers;
pub mod tag_handlers;

/// Write an audit row without letting an audit failure poison the response.
pub(crate) fn audit_soft(
    conn: &rusqlite::Connection,
    user_id: i64,
    action: &str,
    target_type: &str,
    target_id: i64,
    details: serde_json::Value,
) {
    if let Err(e) = crate::audit::log(conn, user_id, action, target_type, target_id, details) {
        log::warn!("Audit write failed for {action}: {e}");
    }
}
