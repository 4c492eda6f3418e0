use crate::index::{DocId, InvertedIndex, Posting};
use crate::lexicon::Lexicon;
use std::collections::HashSet;

/// Unordered Boolean AND over the query tokens.
///
/// Any token absent from the lexicon short-circuits to an empty result.
/// Otherwise the distinct terms' postings lists are intersected smallest
/// first with a two-pointer sorted merge. Results come back in ascending doc
/// id with the documented synthetic score `result_set_size - rank`; it is a
/// tie-break convention, not a relevance estimate.
pub fn evaluate_and(
    query_tokens: &[String],
    lexicon: &Lexicon,
    index: &InvertedIndex,
) -> Vec<(DocId, i64)> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut lists: Vec<&[Posting]> = Vec::new();
    for token in query_tokens {
        if !seen.insert(token) {
            continue;
        }
        match lexicon.id_of(token) {
            Some(id) => lists.push(index.postings(id).unwrap_or(&[])),
            None => return Vec::new(),
        }
    }
    if lists.is_empty() {
        return Vec::new();
    }

    let doc_set: Vec<DocId> = if lists.len() == 1 {
        lists[0].iter().map(|p| p.doc_id).collect()
    } else {
        // Smallest list first keeps every merge bounded by the rarest term.
        lists.sort_by_key(|list| list.len());
        let mut acc = intersect_postings(lists[0], lists[1]);
        for list in &lists[2..] {
            acc = intersect_ids(&acc, list);
        }
        acc
    };

    let size = doc_set.len() as i64;
    doc_set
        .into_iter()
        .enumerate()
        .map(|(i, doc_id)| (doc_id, size - (i as i64 + 1)))
        .collect()
}

/// First merge: both sides are raw postings lists.
fn intersect_postings(p1: &[Posting], p2: &[Posting]) -> Vec<DocId> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < p1.len() && j < p2.len() {
        if p1[i].doc_id == p2[j].doc_id {
            out.push(p1[i].doc_id);
            i += 1;
            j += 1;
        } else if p1[i].doc_id < p2[j].doc_id {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

/// Subsequent merges: the accumulator is already a plain doc-id list.
fn intersect_ids(ids: &[DocId], postings: &[Posting]) -> Vec<DocId> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < ids.len() && j < postings.len() {
        if ids[i] == postings[j].doc_id {
            out.push(ids[i]);
            i += 1;
            j += 1;
        } else if ids[i] < postings[j].doc_id {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}
