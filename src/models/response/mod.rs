pub mod comments;
pub mod flags;
pub mod queries;
pub mod types;
pub mod validate;

pub use queries::*;
pub use types::{PirResponse, ResponseStatus};
pub use validate::validate_answer;
