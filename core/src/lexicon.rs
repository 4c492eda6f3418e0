use std::collections::HashMap;

pub type TermId = u32;

/// Mutable term vocabulary used only while indexing.
///
/// Ids are dense, zero-based, and assigned in first-seen order, so a fixed
/// document-processing order always produces the same lexicon. `finish`
/// freezes it into the shareable read-only [`Lexicon`].
#[derive(Default)]
pub struct LexiconBuilder {
    ids: HashMap<String, TermId>,
    terms: Vec<String>,
}

impl LexiconBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a token, assigning the next id on first sight.
    pub fn get_or_insert(&mut self, token: &str) -> TermId {
        if let Some(&id) = self.ids.get(token) {
            return id;
        }
        let id = self.terms.len() as TermId;
        self.ids.insert(token.to_string(), id);
        self.terms.push(token.to_string());
        id
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn finish(self) -> Lexicon {
        Lexicon {
            ids: self.ids,
            terms: self.terms,
        }
    }
}

/// Immutable bidirectional term/id mapping.
///
/// Only the id-ordered term vector is persisted; the forward map is an exact
/// inverse and is rebuilt on load.
pub struct Lexicon {
    ids: HashMap<String, TermId>,
    terms: Vec<String>,
}

impl Lexicon {
    pub fn from_terms(terms: Vec<String>) -> Self {
        let ids = terms
            .iter()
            .enumerate()
            .map(|(id, term)| (term.clone(), id as TermId))
            .collect();
        Self { ids, terms }
    }

    pub fn id_of(&self, term: &str) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    pub fn term_of(&self, id: TermId) -> Option<&str> {
        self.terms.get(id as usize).map(String::as_str)
    }

    /// Terms in id order, for persistence.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
