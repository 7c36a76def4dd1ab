pub mod columns;
pub mod queries;
pub mod types;

pub use columns::{HeaderCell, header_rows, max_depth};
pub use types::{LeafKind, Question, QuestionInput, QuestionOptions, QuestionType, TableColumn};
