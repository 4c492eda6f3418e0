use crate::index::{DocLengths, InvertedIndex};
use crate::lexicon::Lexicon;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Human-readable index header. `stemmed` couples the index to query-time
/// analysis: a stemmed index must never be queried unstemmed.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexMeta {
    pub version: u32,
    pub num_docs: u32,
    pub stemmed: bool,
    pub created_at: String,
}

/// File layout of a built index. The same root also holds the partitioned
/// document store.
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn lexicon(&self) -> PathBuf {
        self.root.join("lexicon.bin")
    }
    fn inverted_index(&self) -> PathBuf {
        self.root.join("inverted-index.bin")
    }
    fn docnos(&self) -> PathBuf {
        self.root.join("docnos.txt")
    }
    fn doc_lengths(&self) -> PathBuf {
        self.root.join("doc-lengths.txt")
    }
    fn meta(&self) -> PathBuf {
        self.root.join("meta.json")
    }
}

/// Everything retrieval needs, loaded once and immutable for the process
/// lifetime. Safe to share across concurrent queries without locking.
pub struct SearchIndex {
    pub lexicon: Lexicon,
    pub index: InvertedIndex,
    pub docnos: Vec<String>,
    pub doc_lengths: DocLengths,
    pub meta: IndexMeta,
}

pub fn save_lexicon(paths: &IndexPaths, lexicon: &Lexicon) -> Result<()> {
    fs::create_dir_all(&paths.root)?;
    // Only the id-ordered term vector; the forward map is derived on load.
    let bytes = bincode::serialize(lexicon.terms())?;
    fs::write(paths.lexicon(), bytes)?;
    Ok(())
}

pub fn load_lexicon(paths: &IndexPaths) -> Result<Lexicon> {
    let bytes = fs::read(paths.lexicon())
        .with_context(|| format!("reading {}", paths.lexicon().display()))?;
    let terms: Vec<String> = bincode::deserialize(&bytes)?;
    Ok(Lexicon::from_terms(terms))
}

pub fn save_inverted_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    fs::create_dir_all(&paths.root)?;
    let bytes = bincode::serialize(index)?;
    fs::write(paths.inverted_index(), bytes)?;
    Ok(())
}

pub fn load_inverted_index(paths: &IndexPaths) -> Result<InvertedIndex> {
    let bytes = fs::read(paths.inverted_index())
        .with_context(|| format!("reading {}", paths.inverted_index().display()))?;
    let index = bincode::deserialize(&bytes)?;
    Ok(index)
}

/// One docno per line, in internal-id order. Downstream components use this
/// file to reverse-resolve ids.
pub fn save_docnos(paths: &IndexPaths, docnos: &[String]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(paths.docnos())?);
    for docno in docnos {
        writeln!(writer, "{docno}")?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_docnos(paths: &IndexPaths) -> Result<Vec<String>> {
    let text = fs::read_to_string(paths.docnos())
        .with_context(|| format!("reading {}", paths.docnos().display()))?;
    Ok(text.lines().map(str::to_string).collect())
}

/// One token count per line, same order as `docnos.txt`.
pub fn save_doc_lengths(paths: &IndexPaths, lengths: &[u32]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(paths.doc_lengths())?);
    for length in lengths {
        writeln!(writer, "{length}")?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_doc_lengths(paths: &IndexPaths) -> Result<DocLengths> {
    let text = fs::read_to_string(paths.doc_lengths())
        .with_context(|| format!("reading {}", paths.doc_lengths().display()))?;
    let mut lengths = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        lengths.push(line.trim().parse::<u32>().with_context(|| {
            format!("doc length line '{line}' is not an integer")
        })?);
    }
    Ok(DocLengths::from_lengths(lengths))
}

pub fn save_meta(paths: &IndexPaths, meta: &IndexMeta) -> Result<()> {
    fs::create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(meta)?;
    fs::write(paths.meta(), json)?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<IndexMeta> {
    let text = fs::read_to_string(paths.meta())
        .with_context(|| format!("reading {}", paths.meta().display()))?;
    let meta: IndexMeta = serde_json::from_str(&text)?;
    if meta.version != INDEX_FORMAT_VERSION {
        bail!(
            "index format version {} is not supported (expected {})",
            meta.version,
            INDEX_FORMAT_VERSION
        );
    }
    Ok(meta)
}

/// Load all retrieval structures from an index root.
pub fn load_index(paths: &IndexPaths) -> Result<SearchIndex> {
    let meta = load_meta(paths)?;
    let lexicon = load_lexicon(paths)?;
    let index = load_inverted_index(paths)?;
    let docnos = load_docnos(paths)?;
    let doc_lengths = load_doc_lengths(paths)?;
    if docnos.len() != doc_lengths.len() || docnos.len() != meta.num_docs as usize {
        bail!(
            "index at {} is inconsistent: {} docnos, {} doc lengths, meta says {}",
            paths.root.display(),
            docnos.len(),
            doc_lengths.len(),
            meta.num_docs
        );
    }
    Ok(SearchIndex {
        lexicon,
        index,
        docnos,
        doc_lengths,
        meta,
    })
}
