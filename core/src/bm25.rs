use crate::index::{DocId, DocLengths, InvertedIndex, Posting};
use crate::lexicon::Lexicon;
use std::cmp::Ordering;
use std::collections::HashMap;

pub const K1: f64 = 1.2;
pub const B: f64 = 0.75;

/// Result cap for batch runs.
pub const BATCH_TOP_K: usize = 1000;
/// Result cap for the interactive loop and the HTTP surface.
pub const INTERACTIVE_TOP_K: usize = 10;

/// Partial BM25 score of one term in one document.
///
/// `num_docs` is the corpus size, `docs_with_term` the term's document
/// frequency. The caller sums partials across query terms.
pub fn calculate_bm25(
    tf: u32,
    num_docs: u32,
    docs_with_term: u32,
    doc_length: u32,
    avg_doc_length: f64,
) -> f64 {
    let k = K1 * ((1.0 - B) + B * doc_length as f64 / avg_doc_length);
    let tf_component = tf as f64 / (tf as f64 + k);
    let idf = ((num_docs as f64 - docs_with_term as f64 + 0.5) / (docs_with_term as f64 + 0.5)).ln();
    tf_component * idf
}

/// Fold one term's whole postings list into the per-document accumulator.
pub fn term_at_a_time(
    scores: &mut HashMap<DocId, f64>,
    postings: &[Posting],
    doc_lengths: &DocLengths,
) {
    let num_docs = doc_lengths.len() as u32;
    let docs_with_term = postings.len() as u32;
    for posting in postings {
        let doc_length = doc_lengths.get(posting.doc_id).unwrap_or(0);
        let partial = calculate_bm25(
            posting.tf,
            num_docs,
            docs_with_term,
            doc_length,
            doc_lengths.average(),
        );
        *scores.entry(posting.doc_id).or_insert(0.0) += partial;
    }
}

/// BM25 ranking, term at a time, truncated to `top_k`.
///
/// Documents untouched by every query term never appear. Ties are broken by
/// ascending internal id so runs are reproducible. An empty corpus (average
/// length undefined) yields an empty result.
pub fn rank_bm25(
    query_tokens: &[String],
    lexicon: &Lexicon,
    index: &InvertedIndex,
    doc_lengths: &DocLengths,
    top_k: usize,
) -> Vec<(DocId, f64)> {
    if doc_lengths.is_empty() {
        return Vec::new();
    }

    let mut scores: HashMap<DocId, f64> = HashMap::new();
    for token in query_tokens {
        if let Some(id) = lexicon.id_of(token) {
            if let Some(postings) = index.postings(id) {
                term_at_a_time(&mut scores, postings, doc_lengths);
            }
        }
    }

    let mut ranked: Vec<(DocId, f64)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(top_k);
    ranked
}
