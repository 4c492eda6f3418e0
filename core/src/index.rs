use crate::lexicon::TermId;
use serde::{Deserialize, Serialize};

pub type DocId = u32;

/// One posting: a document and the term's frequency in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
}

/// Postings lists indexed by term id.
///
/// Slot `id` exists iff `id` was assigned by the lexicon. Documents are
/// appended in arrival order, so every list is strictly increasing by doc id
/// without ever being sorted.
#[derive(Default, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: Vec<Vec<Posting>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a posting for `term_id`, growing the arena when the id is new.
    ///
    /// Ids are dense but a new id may arrive before the arena covers it, so
    /// the bounds check is mandatory.
    pub fn append(&mut self, term_id: TermId, doc_id: DocId, tf: u32) {
        let slot = term_id as usize;
        if self.postings.len() <= slot {
            self.postings.resize_with(slot + 1, Vec::new);
        }
        self.postings[slot].push(Posting { doc_id, tf });
    }

    pub fn postings(&self, term_id: TermId) -> Option<&[Posting]> {
        self.postings.get(term_id as usize).map(Vec::as_slice)
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }
}

/// Per-document token counts plus the corpus-wide average length, computed
/// once after indexing and read-only afterwards.
pub struct DocLengths {
    lengths: Vec<u32>,
    average: f64,
}

impl DocLengths {
    pub fn from_lengths(lengths: Vec<u32>) -> Self {
        let average = if lengths.is_empty() {
            0.0
        } else {
            lengths.iter().map(|&l| l as f64).sum::<f64>() / lengths.len() as f64
        };
        Self { lengths, average }
    }

    pub fn get(&self, doc_id: DocId) -> Option<u32> {
        self.lengths.get(doc_id as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.lengths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_grows_arena_for_new_ids() {
        let mut index = InvertedIndex::new();
        index.append(2, 0, 1);
        index.append(0, 0, 3);
        assert_eq!(index.num_terms(), 3);
        assert_eq!(index.postings(0).unwrap(), &[Posting { doc_id: 0, tf: 3 }]);
        assert!(index.postings(1).unwrap().is_empty());
        assert_eq!(index.postings(7), None);
    }

    #[test]
    fn postings_stay_sorted_under_arrival_order() {
        let mut index = InvertedIndex::new();
        for doc_id in 0..5 {
            index.append(0, doc_id, 1);
        }
        let list = index.postings(0).unwrap();
        assert!(list.windows(2).all(|w| w[0].doc_id < w[1].doc_id));
    }

    #[test]
    fn average_length_handles_empty_corpus() {
        let empty = DocLengths::from_lengths(Vec::new());
        assert_eq!(empty.average(), 0.0);
        assert!(empty.is_empty());

        let lengths = DocLengths::from_lengths(vec![10, 20, 30]);
        assert_eq!(lengths.average(), 20.0);
        assert_eq!(lengths.get(1), Some(20));
        assert_eq!(lengths.get(3), None);
    }
}
