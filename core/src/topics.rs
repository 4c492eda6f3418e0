use anyhow::{Context, Result};
use std::io::BufRead;

/// One entry of a batch query file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub id: u32,
    pub query: String,
}

/// Parse a batch query file: alternating lines of integer topic id and
/// free-text query.
///
/// A non-integer id line or a missing query line aborts the whole run; there
/// is no per-topic recovery. Blank lines between topics are tolerated.
pub fn parse_topics<R: BufRead>(reader: R) -> Result<Vec<Topic>> {
    let mut topics = Vec::new();
    let mut lines = reader.lines();
    while let Some(line) = lines.next() {
        let line = line?;
        // Stray whitespace around the id must not break integer parsing.
        let compact: String = line.split_whitespace().collect();
        if compact.is_empty() {
            continue;
        }
        let id: u32 = compact
            .parse()
            .with_context(|| format!("topic id line '{}' is not an integer", line.trim()))?;
        let query = lines
            .next()
            .transpose()?
            .with_context(|| format!("topic {id} has no query line"))?;
        topics.push(Topic { id, query });
    }
    Ok(topics)
}
