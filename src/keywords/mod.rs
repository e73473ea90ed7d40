//! Keyword index construction
//!
//! Every request builds a fresh index from local extraction and, when a
//! keyword service is configured, merges its keywords on top.

pub mod extract;
pub mod index;
pub mod remote;

pub use extract::extract_local;
pub use index::{KeywordIndex, KeywordIndexer};
pub use remote::{HttpKeywordSource, KeywordPayload, KeywordSource};
