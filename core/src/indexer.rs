use crate::docstore::{self, DocMeta, DocumentStore, StoredDoc};
use crate::index::{DocId, InvertedIndex};
use crate::lexicon::{Lexicon, LexiconBuilder, TermId};
use crate::tokenizer::{stem, tokenize};
use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::io::BufRead;

const DOC_OPEN: &str = "<DOC>";
const DOC_CLOSE: &str = "</DOC>";
const DOCNO_CLOSE: &str = "</DOCNO>";

/// Output of one indexing pass. The caller persists it and computes nothing
/// further; the lexicon is already frozen.
pub struct BuiltIndex {
    pub lexicon: Lexicon,
    pub index: InvertedIndex,
    pub docnos: Vec<String>,
    pub doc_lengths: Vec<u32>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Section {
    Headline,
    Text,
    Graphic,
}

impl Section {
    fn open_tag(self) -> &'static str {
        match self {
            Section::Headline => "<HEADLINE>",
            Section::Text => "<TEXT>",
            Section::Graphic => "<GRAPHIC>",
        }
    }

    fn close_tag(self) -> &'static str {
        match self {
            Section::Headline => "</HEADLINE>",
            Section::Text => "</TEXT>",
            Section::Graphic => "</GRAPHIC>",
        }
    }
}

const SECTIONS: [Section; 3] = [Section::Headline, Section::Text, Section::Graphic];

struct PendingDoc {
    docno: Option<String>,
    content: Vec<String>,
    headline_lines: Vec<String>,
    has_headline: bool,
    tokens: Vec<String>,
    section: Option<Section>,
}

impl PendingDoc {
    fn new() -> Self {
        Self {
            docno: None,
            content: vec![DOC_OPEN.to_string()],
            headline_lines: Vec::new(),
            has_headline: false,
            tokens: Vec::new(),
            section: None,
        }
    }

    fn consume_line(&mut self, line: &str) -> Result<()> {
        self.content.push(line.to_string());

        // The identifier line must directly follow the document-open marker.
        if self.docno.is_none() {
            let Some(start) = line.find("LA") else {
                bail!("record is missing its <DOCNO> line (got '{line}')");
            };
            let Some(end) = line.find(DOCNO_CLOSE) else {
                bail!("record is missing its <DOCNO> line (got '{line}')");
            };
            let docno: String = line[start..end].split_whitespace().collect();
            docstore::docno_partition(&docno)?;
            self.docno = Some(docno);
            return Ok(());
        }

        for section in SECTIONS {
            if line == section.open_tag() {
                if let Some(open) = self.section {
                    bail!(
                        "section {} opened inside unterminated {}",
                        section.open_tag(),
                        open.open_tag()
                    );
                }
                self.section = Some(section);
                if section == Section::Headline {
                    self.has_headline = true;
                }
                return Ok(());
            }
            if line == section.close_tag() {
                if self.section != Some(section) {
                    bail!("unexpected {} outside its section", section.close_tag());
                }
                self.section = None;
                return Ok(());
            }
        }

        // Only bare content lines of tagged sections are tokenized; inner tag
        // lines like <P> are stored but never indexed.
        if let Some(section) = self.section {
            if !line.contains('<') && !line.contains('>') {
                let tokens = tokenize(line);
                if section == Section::Headline {
                    self.headline_lines.push(line.trim().to_string());
                }
                self.tokens.extend(tokens);
            }
        }
        Ok(())
    }
}

/// Build the full index from a corpus stream of tagged records.
///
/// Single pass, single threaded. Malformed records are fatal for the whole
/// batch: a partially built lexicon is unusable, so there is no per-document
/// recovery.
pub fn build_index<R: BufRead>(
    reader: R,
    stemmed: bool,
    store: &mut dyn DocumentStore,
) -> Result<BuiltIndex> {
    let mut builder = LexiconBuilder::new();
    let mut index = InvertedIndex::new();
    let mut docnos: Vec<String> = Vec::new();
    let mut doc_lengths: Vec<u32> = Vec::new();
    let mut pending: Option<PendingDoc> = None;

    for line in reader.lines() {
        let line = line?;
        if pending.is_none() {
            if line == DOC_OPEN {
                pending = Some(PendingDoc::new());
            } else if !line.trim().is_empty() {
                bail!("unexpected content outside a <DOC> record: '{line}'");
            }
            continue;
        }
        if line == DOC_CLOSE {
            if let Some(mut doc) = pending.take() {
                doc.content.push(line);
                if let Some(section) = doc.section {
                    bail!(
                        "document closed with unterminated {} section",
                        section.open_tag()
                    );
                }
                let internal_id = docnos.len() as DocId;
                finalize_document(
                    doc,
                    internal_id,
                    stemmed,
                    &mut builder,
                    &mut index,
                    &mut docnos,
                    &mut doc_lengths,
                    store,
                )?;
            }
        } else if let Some(doc) = pending.as_mut() {
            doc.consume_line(&line)?;
        }
    }
    if pending.is_some() {
        bail!("corpus ended inside an unterminated <DOC> record");
    }

    tracing::info!(
        num_docs = docnos.len(),
        num_terms = builder.len(),
        stemmed,
        "corpus indexed"
    );

    Ok(BuiltIndex {
        lexicon: builder.finish(),
        index,
        docnos,
        doc_lengths,
    })
}

#[allow(clippy::too_many_arguments)]
fn finalize_document(
    doc: PendingDoc,
    internal_id: DocId,
    stemmed: bool,
    builder: &mut LexiconBuilder,
    index: &mut InvertedIndex,
    docnos: &mut Vec<String>,
    doc_lengths: &mut Vec<u32>,
    store: &mut dyn DocumentStore,
) -> Result<()> {
    let docno = doc
        .docno
        .context("record closed before its <DOCNO> line")?;
    let date = docstore::format_date(&docno)?;
    let headline = doc.has_headline.then(|| doc.headline_lines.join(" "));

    // The document's token length is counted before stemming; stemming maps
    // tokens one to one and must precede lexicon lookup.
    let length = doc.tokens.len() as u32;
    let mut counts: BTreeMap<TermId, u32> = BTreeMap::new();
    for token in doc.tokens {
        let token = if stemmed { stem(&token) } else { token };
        let term_id = builder.get_or_insert(&token);
        *counts.entry(term_id).or_insert(0) += 1;
    }
    for (term_id, tf) in counts {
        index.append(term_id, internal_id, tf);
    }

    store.put(&StoredDoc {
        meta: DocMeta {
            docno: docno.clone(),
            internal_id,
            date,
            headline,
        },
        content: doc.content,
    })?;
    docnos.push(docno);
    doc_lengths.push(length);
    Ok(())
}
