use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use newswire_core::bm25::{rank_bm25, BATCH_TOP_K, INTERACTIVE_TOP_K};
use newswire_core::boolean::evaluate_and;
use newswire_core::docstore::{fetch_by_id, DocumentStore, FsDocStore, StoredDoc, NO_HEADLINE};
use newswire_core::index::DocId;
use newswire_core::persist::{load_docnos, load_index, IndexPaths, SearchIndex};
use newswire_core::snippet::summarize;
use newswire_core::tokenizer::{analyze, tokenize};
use newswire_core::topics::parse_topics;
use tracing_subscriber::{fmt, EnvFilter};

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

const BM25_STEM_TAG: &str = "newswireBM25stem";
const BM25_NO_STEM_TAG: &str = "newswireBM25noStem";
const BOOLEAN_TAG: &str = "newswireAND";

#[derive(Parser)]
#[command(name = "query")]
#[command(about = "Query a built newswire index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank a batch query file with BM25 (top 1000 per topic)
    Bm25 {
        /// Index root directory
        #[arg(long)]
        index: String,
        /// Batch query file (alternating topic id / query lines)
        #[arg(long)]
        queries: String,
        /// Result file to write; must not already exist
        #[arg(long)]
        output: String,
    },
    /// Evaluate a batch query file with Boolean AND
    BooleanAnd {
        #[arg(long)]
        index: String,
        #[arg(long)]
        queries: String,
        #[arg(long)]
        output: String,
    },
    /// Interactive retrieval: query, read snippets, fetch by rank
    Interactive {
        #[arg(long)]
        index: String,
    },
    /// Print one stored document by internal id or docno
    GetDoc {
        #[arg(long)]
        index: String,
        /// Internal id of the document
        #[arg(long, conflicts_with = "docno")]
        id: Option<u32>,
        /// Docno of the document
        #[arg(long)]
        docno: Option<String>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Bm25 {
            index,
            queries,
            output,
        } => run_bm25(&index, &queries, &output),
        Commands::BooleanAnd {
            index,
            queries,
            output,
        } => run_boolean(&index, &queries, &output),
        Commands::Interactive { index } => run_interactive(&index),
        Commands::GetDoc { index, id, docno } => run_get_doc(&index, id, docno),
    }
}

fn load(index_dir: &str) -> Result<SearchIndex> {
    let index = load_index(&IndexPaths::new(index_dir))
        .with_context(|| format!("loading index at {index_dir}"))?;
    tracing::info!(
        num_docs = index.meta.num_docs,
        stemmed = index.meta.stemmed,
        "index loaded"
    );
    Ok(index)
}

fn open_topics(queries: &str) -> Result<Vec<newswire_core::topics::Topic>> {
    let file = File::open(queries).with_context(|| format!("opening query file {queries}"))?;
    parse_topics(BufReader::new(file))
}

fn create_output(output: &str) -> Result<BufWriter<File>> {
    if Path::new(output).exists() {
        bail!("output {output} already exists; refusing to overwrite results");
    }
    Ok(BufWriter::new(File::create(output)?))
}

fn bm25_tag(stemmed: bool) -> &'static str {
    if stemmed {
        BM25_STEM_TAG
    } else {
        BM25_NO_STEM_TAG
    }
}

/// Write one topic's results as `<topicId> Q0 <docno> <rank> <score> <tag>`
/// lines, ranks starting at 1. A doc id outside the docno table means the
/// index files are corrupt.
fn write_result_lines<W: Write, S: std::fmt::Display>(
    writer: &mut W,
    topic_id: u32,
    docnos: &[String],
    ranked: &[(DocId, S)],
    tag: &str,
) -> Result<()> {
    for (i, (doc_id, score)) in ranked.iter().enumerate() {
        let docno = docnos
            .get(*doc_id as usize)
            .with_context(|| format!("doc id {doc_id} is outside the docno table"))?;
        writeln!(writer, "{} Q0 {} {} {} {}", topic_id, docno, i + 1, score, tag)?;
    }
    Ok(())
}

fn run_bm25(index_dir: &str, queries: &str, output: &str) -> Result<()> {
    let index = load(index_dir)?;
    let topics = open_topics(queries)?;
    let mut writer = create_output(output)?;

    let tag = bm25_tag(index.meta.stemmed);
    for topic in topics {
        let tokens = analyze(&topic.query, index.meta.stemmed);
        let ranked = rank_bm25(
            &tokens,
            &index.lexicon,
            &index.index,
            &index.doc_lengths,
            BATCH_TOP_K,
        );
        write_result_lines(&mut writer, topic.id, &index.docnos, &ranked, tag)?;
    }
    writer.flush()?;
    Ok(())
}

fn run_boolean(index_dir: &str, queries: &str, output: &str) -> Result<()> {
    let index = load(index_dir)?;
    let topics = open_topics(queries)?;
    let mut writer = create_output(output)?;

    for topic in topics {
        let tokens = analyze(&topic.query, index.meta.stemmed);
        let results = evaluate_and(&tokens, &index.lexicon, &index.index);
        write_result_lines(&mut writer, topic.id, &index.docnos, &results, BOOLEAN_TAG)?;
    }
    writer.flush()?;
    Ok(())
}

fn run_interactive(index_dir: &str) -> Result<()> {
    let paths = IndexPaths::new(index_dir);
    let index = load(index_dir)?;
    let store = FsDocStore::new(&paths.root);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    // Session-private state: the current query's rank -> internal id mapping.
    let mut top_results: Vec<DocId> = Vec::new();
    let mut expecting_query = true;

    loop {
        if expecting_query {
            print!("Enter your query (type 'Q' to quit): ");
            io::stdout().flush()?;
            let Some(line) = lines.next() else { break };
            let input = line?;
            let input = input.trim();
            if input.is_empty() {
                continue;
            }
            if input.eq_ignore_ascii_case("q") {
                break;
            }
            top_results = show_ranked_results(input, &index, &store)?;
            expecting_query = false;
        } else {
            print!(
                "\nEnter the rank of the document you'd like to see or enter 'N' to make a new query (type 'Q' to quit): "
            );
            io::stdout().flush()?;
            let Some(line) = lines.next() else { break };
            let input = line?;
            let input = input.trim();
            if input.eq_ignore_ascii_case("q") {
                break;
            }
            if input.eq_ignore_ascii_case("n") {
                expecting_query = true;
                continue;
            }
            match input.parse::<usize>() {
                Ok(rank) if rank >= 1 && rank <= top_results.len() => {
                    println!();
                    let doc = fetch_by_id(&store, &index.docnos, top_results[rank - 1])?
                        .context("ranked document is missing from the store")?;
                    print_document(&doc);
                }
                Ok(_) => println!("Not a valid rank number."),
                Err(_) => println!("Invalid input."),
            }
        }
    }
    Ok(())
}

/// Run one interactive query: print the top 10 with headline, date and
/// snippet, and return their internal ids in rank order.
fn show_ranked_results(
    query: &str,
    index: &SearchIndex,
    store: &FsDocStore,
) -> Result<Vec<DocId>> {
    let started = Instant::now();
    let rank_tokens = analyze(query, index.meta.stemmed);
    // Snippets match against the raw document text, so they use unstemmed
    // tokens even on a stemmed index.
    let raw_tokens = tokenize(query);

    let ranked = rank_bm25(
        &rank_tokens,
        &index.lexicon,
        &index.index,
        &index.doc_lengths,
        INTERACTIVE_TOP_K,
    );

    let mut top_results = Vec::with_capacity(ranked.len());
    for (i, (doc_id, _score)) in ranked.iter().enumerate() {
        let doc = fetch_by_id(store, &index.docnos, *doc_id)?
            .context("ranked document is missing from the store")?;
        let summary = summarize(&doc, &raw_tokens);
        println!("{}. {} ({})", i + 1, summary.headline, doc.meta.date);
        println!("{} ({})", summary.snippet, doc.meta.docno);
        println!();
        top_results.push(*doc_id);
    }

    println!(
        "\nRetrieval took {:.3} seconds\n",
        started.elapsed().as_secs_f64()
    );
    Ok(top_results)
}

fn run_get_doc(index_dir: &str, id: Option<u32>, docno: Option<String>) -> Result<()> {
    let paths = IndexPaths::new(index_dir);
    let store = FsDocStore::new(&paths.root);

    let doc = match (id, docno) {
        (Some(id), None) => {
            let docnos = load_docnos(&paths)?;
            fetch_by_id(&store, &docnos, id)?
                .with_context(|| format!("no document has internal id {id}"))?
        }
        (None, Some(docno)) => store
            .get_by_docno(&docno)?
            .with_context(|| format!("no document has docno {docno}"))?,
        _ => bail!("pass exactly one of --id or --docno"),
    };
    print_document(&doc);
    Ok(())
}

fn print_document(doc: &StoredDoc) {
    println!("docno: {}", doc.meta.docno);
    println!("internal id: {}", doc.meta.internal_id);
    println!("date: {}", doc.meta.date);
    println!(
        "headline: {}",
        doc.meta.headline.as_deref().unwrap_or(NO_HEADLINE)
    );
    println!("raw document:");
    for line in &doc.content {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_lines_follow_trec_format() {
        let docnos = vec!["LA010190-0001".to_string(), "LA010290-0002".to_string()];
        let ranked = vec![(1u32, 4.5f64), (0, 1.25)];
        let mut out = Vec::new();
        write_result_lines(&mut out, 3, &docnos, &ranked, BM25_NO_STEM_TAG).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "3 Q0 LA010290-0002 1 4.5 newswireBM25noStem\n\
             3 Q0 LA010190-0001 2 1.25 newswireBM25noStem\n"
        );
    }

    #[test]
    fn boolean_scores_write_as_integers() {
        let docnos = vec!["LA010190-0001".to_string()];
        let results = vec![(0u32, 0i64)];
        let mut out = Vec::new();
        write_result_lines(&mut out, 12, &docnos, &results, BOOLEAN_TAG).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "12 Q0 LA010190-0001 1 0 newswireAND\n"
        );
    }

    #[test]
    fn run_tag_follows_index_stemming() {
        assert_eq!(bm25_tag(true), "newswireBM25stem");
        assert_eq!(bm25_tag(false), "newswireBM25noStem");
    }

    #[test]
    fn out_of_range_doc_id_is_an_error() {
        let docnos = vec!["LA010190-0001".to_string()];
        let ranked = vec![(9u32, 1.0f64)];
        let mut out = Vec::new();
        let err = write_result_lines(&mut out, 1, &docnos, &ranked, BM25_NO_STEM_TAG).unwrap_err();
        assert!(err.to_string().contains("outside the docno table"));
    }
}
