//! In-memory inverted index and AND-query engine.
//!
//! [`IndexStore`] is safe to share between indexing workers and searchers;
//! [`tokenizer::tokenize`] turns document text into the term frequencies it
//! stores, and [`query`] answers conjunctive queries against it.

use serde::Serialize;

pub mod error;
pub mod index;
pub mod query;
pub mod tokenizer;

pub use error::SearchError;
pub use index::IndexStore;
pub use query::{search, search_terms, search_with_limit, Query, SearchHit};

pub type DocId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub frequency: u32,
}
