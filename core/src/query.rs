use crate::error::SearchError;
use crate::index::IndexStore;
use crate::{DocId, Posting};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

pub const MAX_QUERY_TERMS: usize = 3;
/// Number of hits returned by [`search`].
pub const DEFAULT_LIMIT: usize = 10;

lazy_static! {
    static ref AND_SEPARATOR: Regex = Regex::new(r"(?i)\s+AND\s+").expect("valid regex");
}

/// A conjunction of 1 to [`MAX_QUERY_TERMS`] lowercase terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    terms: Vec<String>,
}

impl Query {
    pub fn new<I, S>(terms: I) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms: Vec<String> = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .collect();
        if terms.is_empty() || terms.len() > MAX_QUERY_TERMS {
            return Err(SearchError::TermCount { got: terms.len() });
        }
        Ok(Self { terms })
    }

    /// Parse `cats AND dogs AND birds`. The separator is case-insensitive.
    pub fn parse(text: &str) -> Result<Self, SearchError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SearchError::TermCount { got: 0 });
        }
        Self::new(AND_SEPARATOR.split(text))
    }

    pub fn terms(&self) -> &[String] { &self.terms }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub path: String,
    pub score: u64,
}

/// Validate `terms` and run them as an AND query.
pub fn search_terms<S: AsRef<str>>(store: &IndexStore, terms: &[S]) -> Result<Vec<SearchHit>, SearchError> {
    let query = Query::new(terms)?;
    Ok(search(store, &query))
}

pub fn search(store: &IndexStore, query: &Query) -> Vec<SearchHit> {
    search_with_limit(store, query, DEFAULT_LIMIT)
}

/// Documents containing every query term, ranked by summed term frequency.
///
/// Equal scores come back in no particular order.
pub fn search_with_limit(store: &IndexStore, query: &Query, limit: usize) -> Vec<SearchHit> {
    let per_term: Vec<HashMap<DocId, u32>> = query
        .terms()
        .iter()
        .map(|term| {
            if term.is_empty() {
                HashMap::new()
            } else {
                frequency_by_doc(store.lookup_postings(term))
            }
        })
        .collect();

    let mut ranked: Vec<(DocId, u64)> = intersect(per_term).into_iter().collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1));
    tracing::debug!(terms = ?query.terms(), matches = ranked.len(), "search");

    ranked
        .into_iter()
        .take(limit)
        .filter_map(|(doc_id, score)| match store.resolve_document(doc_id) {
            Some(path) => Some(SearchHit { path, score }),
            None => {
                tracing::debug!(doc_id, "ranked document has no registered path");
                None
            }
        })
        .collect()
}

/// Collapse a postings list to doc -> frequency. A document indexed more
/// than once keeps the frequency of its last posting.
fn frequency_by_doc(postings: Vec<Posting>) -> HashMap<DocId, u32> {
    postings.into_iter().map(|p| (p.doc_id, p.frequency)).collect()
}

/// AND-intersection of per-term maps, summing frequencies of the survivors.
fn intersect(maps: Vec<HashMap<DocId, u32>>) -> HashMap<DocId, u64> {
    let mut maps = maps.into_iter();
    let mut acc: HashMap<DocId, u64> = match maps.next() {
        Some(first) => first.into_iter().map(|(d, f)| (d, u64::from(f))).collect(),
        None => return HashMap::new(),
    };
    for m in maps {
        acc.retain(|doc_id, score| match m.get(doc_id) {
            Some(&f) => {
                *score += u64::from(f);
                true
            }
            None => false,
        });
    }
    acc
}
