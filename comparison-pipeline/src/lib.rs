#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod comparer;
pub mod parser;
pub mod prompts;
pub mod schema;
pub mod table;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use comparer::DocumentComparer;
pub use schema::{ChangeKind, ComparisonRecord, ComparisonResponse};
pub use table::ComparisonTable;
