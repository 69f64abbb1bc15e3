#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod store;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use store::{DocumentIngestion, StagedPair, UploadedFile};
