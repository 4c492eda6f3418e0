use crate::index::DocId;
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const NO_HEADLINE: &str = "NO HEADLINE";

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Metadata stored beside each document's content file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocMeta {
    pub docno: String,
    pub internal_id: DocId,
    pub date: String,
    pub headline: Option<String>,
}

/// A document as held by the store: metadata plus the verbatim record lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDoc {
    pub meta: DocMeta,
    pub content: Vec<String>,
}

/// Validate a docno (`LA` + 6 digits + suffix) and return its embedded
/// `(year, month, day)` digit pairs.
pub fn docno_partition(docno: &str) -> Result<(&str, &str, &str)> {
    if docno.len() < 13
        || !docno.starts_with("LA")
        || !docno.as_bytes()[2..8].iter().all(u8::is_ascii_digit)
    {
        bail!("'{docno}' is not a valid docno (expected LAmmddyy-nnnn)");
    }
    Ok((&docno[6..8], &docno[2..4], &docno[4..6]))
}

/// Format the date encoded in a docno, e.g. `LA010190-0001` -> "January 1, 1990".
pub fn format_date(docno: &str) -> Result<String> {
    let (year, month, day) = docno_partition(docno)?;
    let month: usize = month.parse()?;
    let day: u32 = day.parse()?;
    let name = match month {
        1..=12 => MONTH_NAMES[month - 1],
        _ => bail!("'{docno}' encodes month {month}, outside 01-12"),
    };
    Ok(format!("{name} {day}, 19{year}"))
}

/// Where indexed documents live: written once during the build, read by the
/// summarizer and the document-fetch surfaces. Retrieval code never touches
/// raw paths.
pub trait DocumentStore {
    fn put(&mut self, doc: &StoredDoc) -> Result<()>;
    fn get_by_docno(&self, docno: &str) -> Result<Option<StoredDoc>>;
}

/// Resolve an internal id through the id-ordered docno table, then the store.
pub fn fetch_by_id(
    store: &dyn DocumentStore,
    docnos: &[String],
    id: DocId,
) -> Result<Option<StoredDoc>> {
    match docnos.get(id as usize) {
        Some(docno) => store.get_by_docno(docno),
        None => Ok(None),
    }
}

/// On-disk store partitioned by the docno's year/month/day so no single
/// directory grows with the corpus.
///
/// Layout: `<root>/<yy>/<mm>/<dd>/<docno>.txt` plus `<docno>-metadata.txt`.
pub struct FsDocStore {
    root: PathBuf,
}

impl FsDocStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn partition_dir(&self, docno: &str) -> Result<PathBuf> {
        let (year, month, day) = docno_partition(docno)?;
        Ok(self.root.join(year).join(month).join(day))
    }
}

impl DocumentStore for FsDocStore {
    fn put(&mut self, doc: &StoredDoc) -> Result<()> {
        let dir = self.partition_dir(&doc.meta.docno)?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating partition {}", dir.display()))?;

        let mut content = doc.content.join("\n");
        content.push('\n');
        fs::write(dir.join(format!("{}.txt", doc.meta.docno)), content)?;

        let headline = doc.meta.headline.as_deref().unwrap_or(NO_HEADLINE);
        let metadata = format!(
            "docno: {}\ninternal id: {}\ndate: {}\nheadline: {}\n",
            doc.meta.docno, doc.meta.internal_id, doc.meta.date, headline
        );
        fs::write(dir.join(format!("{}-metadata.txt", doc.meta.docno)), metadata)?;
        Ok(())
    }

    fn get_by_docno(&self, docno: &str) -> Result<Option<StoredDoc>> {
        let dir = self.partition_dir(docno)?;
        let content_path = dir.join(format!("{docno}.txt"));
        let metadata_path = dir.join(format!("{docno}-metadata.txt"));
        if !content_path.exists() || !metadata_path.exists() {
            return Ok(None);
        }

        let metadata = fs::read_to_string(&metadata_path)
            .with_context(|| format!("reading {}", metadata_path.display()))?;
        let meta = parse_metadata(docno, &metadata)?;

        let content = fs::read_to_string(&content_path)
            .with_context(|| format!("reading {}", content_path.display()))?;
        let content = content.lines().map(str::to_string).collect();

        Ok(Some(StoredDoc { meta, content }))
    }
}

fn parse_metadata(docno: &str, metadata: &str) -> Result<DocMeta> {
    let mut internal_id = None;
    let mut date = None;
    let mut headline = None;
    for line in metadata.lines() {
        if let Some(rest) = line.strip_prefix("internal id: ") {
            internal_id = Some(rest.parse::<DocId>()?);
        } else if let Some(rest) = line.strip_prefix("date: ") {
            date = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix("headline: ") {
            headline = (rest != NO_HEADLINE).then(|| rest.to_string());
        }
    }
    Ok(DocMeta {
        docno: docno.to_string(),
        internal_id: internal_id
            .with_context(|| format!("metadata for {docno} has no internal id line"))?,
        date: date.with_context(|| format!("metadata for {docno} has no date line"))?,
        headline,
    })
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemDocStore {
    docs: HashMap<String, StoredDoc>,
}

impl MemDocStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl DocumentStore for MemDocStore {
    fn put(&mut self, doc: &StoredDoc) -> Result<()> {
        self.docs.insert(doc.meta.docno.clone(), doc.clone());
        Ok(())
    }

    fn get_by_docno(&self, docno: &str) -> Result<Option<StoredDoc>> {
        Ok(self.docs.get(docno).cloned())
    }
}
