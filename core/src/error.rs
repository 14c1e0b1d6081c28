use crate::query::MAX_QUERY_TERMS;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SearchError {
    /// Query had no terms or more than the supported number.
    #[error("search supports 1 to {max} terms combined with AND, got {got}", max = MAX_QUERY_TERMS)]
    TermCount { got: usize },
}
