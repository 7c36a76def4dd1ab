//! Notification dispatch. The core hands a typed event to a `Dispatcher`
//! after a lifecycle change; delivery is fire-and-forget. A failed dispatch
//! is logged and surfaced as a secondary warning, never rolled back into the
//! primary operation.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationEvent {
    PirStatusUpdate {
        pir_id: i64,
        customer_company_id: i64,
        supplier_company_id: i64,
        old_status: String,
        new_status: String,
    },
    ReviewCompleted {
        pir_id: i64,
        customer_company_id: i64,
        supplier_company_id: i64,
        outcome: String,
        flagged_count: usize,
    },
}

#[derive(Debug)]
pub struct NotifyError(pub String);

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Notification error: {}", self.0)
    }
}

pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, event: &NotificationEvent) -> Result<(), NotifyError>;
}

/// Default dispatcher: writes the event to the application log. Deployments
/// with a real delivery channel swap in their own `Dispatcher`.
pub struct LogDispatcher;

impl Dispatcher for LogDispatcher {
    fn dispatch(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(event).map_err(|e| NotifyError(e.to_string()))?;
        log::info!("notification: {payload}");
        Ok(())
    }
}

/// Fire-and-forget helper used by handlers. Returns a warning string for the
/// response body when delivery failed.
pub fn dispatch_soft(dispatcher: &dyn Dispatcher, event: &NotificationEvent) -> Option<String> {
    match dispatcher.dispatch(event) {
        Ok(()) => None,
        Err(e) => {
            log::warn!("{e}");
            Some(format!("Saved, but notification delivery failed: {}", e.0))
        }
    }
}
