use crate::tokenizer::TermFrequencies;
use crate::{DocId, Posting};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
struct Registry {
    by_path: HashMap<String, DocId>,
    by_id: HashMap<DocId, String>,
    last_id: DocId,
}

/// Shared document registry and inverted index.
///
/// The two structures sit behind independent reader-writer locks. No method
/// holds both at once, so callers can mix registry and index operations
/// from any number of threads without lock-ordering concerns.
#[derive(Default)]
pub struct IndexStore {
    registry: RwLock<Registry>,
    inverted: RwLock<HashMap<String, Vec<Posting>>>,
}

impl IndexStore {
    pub fn new() -> Self { Self::default() }

    /// Return the id for `path`, assigning the next sequential id on first sight.
    ///
    /// Re-registering a known path changes nothing and leaves its postings in place.
    pub fn register_document(&self, path: &str) -> DocId {
        let mut reg = self.registry.write();
        if let Some(&id) = reg.by_path.get(path) {
            return id;
        }
        reg.last_id += 1;
        let id = reg.last_id;
        reg.by_path.insert(path.to_owned(), id);
        reg.by_id.insert(id, path.to_owned());
        id
    }

    pub fn resolve_document(&self, doc_id: DocId) -> Option<String> {
        self.registry.read().by_id.get(&doc_id).cloned()
    }

    pub fn document_count(&self) -> usize {
        self.registry.read().by_path.len()
    }

    /// Append one posting per term for `doc_id`.
    ///
    /// The whole batch is applied under a single write lock: readers see all
    /// of it or none of it.
    pub fn merge_postings(&self, doc_id: DocId, freqs: &TermFrequencies) {
        let mut inverted = self.inverted.write();
        for (term, &frequency) in freqs {
            inverted
                .entry(term.clone())
                .or_default()
                .push(Posting { doc_id, frequency });
        }
    }

    /// Copy of the postings for `term` in insertion order; empty when unknown.
    pub fn lookup_postings(&self, term: &str) -> Vec<Posting> {
        self.inverted.read().get(term).cloned().unwrap_or_default()
    }

    pub fn term_count(&self) -> usize {
        self.inverted.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn freqs(pairs: &[(&str, u32)]) -> TermFrequencies {
        pairs.iter().map(|(t, c)| (t.to_string(), *c)).collect()
    }

    #[test]
    fn registration_is_idempotent() {
        let store = IndexStore::new();
        let a = store.register_document("/data/a.txt");
        let b = store.register_document("/data/b.txt");
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(store.register_document("/data/a.txt"), a);
        assert_eq!(store.document_count(), 2);
        assert_eq!(store.resolve_document(b).as_deref(), Some("/data/b.txt"));
        assert_eq!(store.resolve_document(99), None);
    }

    #[test]
    fn postings_append_in_insertion_order() {
        let store = IndexStore::new();
        store.merge_postings(2, &freqs(&[("rust", 3)]));
        store.merge_postings(1, &freqs(&[("rust", 1), ("tokio", 2)]));
        store.merge_postings(2, &freqs(&[("rust", 5)]));

        let rust = store.lookup_postings("rust");
        let got: Vec<(DocId, u32)> = rust.iter().map(|p| (p.doc_id, p.frequency)).collect();
        assert_eq!(got, vec![(2, 3), (1, 1), (2, 5)]);
        assert_eq!(store.term_count(), 2);
        assert!(store.lookup_postings("missing").is_empty());
    }

    #[test]
    fn lookup_returns_a_snapshot() {
        let store = IndexStore::new();
        store.merge_postings(1, &freqs(&[("term", 1)]));
        let snapshot = store.lookup_postings("term");
        store.merge_postings(2, &freqs(&[("term", 4)]));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.lookup_postings("term").len(), 2);
    }

    #[test]
    fn concurrent_registration_hands_out_unique_ids() {
        let store = Arc::new(IndexStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    (0..100)
                        .map(|i| store.register_document(&format!("doc-{}", (t * 37 + i) % 200)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.document_count(), 200);
        let mut ids: Vec<DocId> = (0..200)
            .map(|i| store.register_document(&format!("doc-{i}")))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids, (1..=200).collect::<Vec<_>>());
    }
}
