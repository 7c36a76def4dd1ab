pub mod queries;
pub mod types;

pub use queries::*;
pub use types::{PirInput, PirRequest, PirStatus, ensure_transition};
