use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

/// Shortest run of word characters that counts as a term.
pub const MIN_TERM_LEN: usize = 4;

lazy_static! {
    static ref RE: Regex = Regex::new(&format!(r"[A-Za-z0-9_-]{{{MIN_TERM_LEN},}}")).expect("valid regex");
}

/// Term -> number of occurrences within one document.
pub type TermFrequencies = HashMap<String, u32>;

/// Split text into lowercase terms and count them.
///
/// A term is a maximal run of ASCII letters, digits, `_` or `-` at least
/// [`MIN_TERM_LEN`] bytes long. Everything else is dropped.
pub fn tokenize(text: &str) -> TermFrequencies {
    let mut freqs = TermFrequencies::new();
    for mat in RE.find_iter(text) {
        *freqs.entry(mat.as_str().to_ascii_lowercase()).or_insert(0) += 1;
    }
    freqs
}
