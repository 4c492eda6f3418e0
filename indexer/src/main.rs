use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use flate2::read::GzDecoder;
use newswire_core::docstore::FsDocStore;
use newswire_core::indexer::build_index;
use newswire_core::persist::{
    save_doc_lengths, save_docnos, save_inverted_index, save_lexicon, save_meta, IndexMeta,
    IndexPaths, INDEX_FORMAT_VERSION,
};
use tracing_subscriber::{fmt, EnvFilter};

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the inverted index from an LA Times corpus file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a new index (and document store) from the corpus
    Build {
        /// Corpus file of tagged records, gzipped or plain text
        #[arg(long)]
        input: String,
        /// Output index root; must not already exist
        #[arg(long)]
        output: String,
        /// Stem tokens before lexicon lookup ("-stemmed" is appended to the
        /// output root so stemmed and unstemmed indexes never mix)
        #[arg(long, default_value_t = false)]
        stem: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, stem } => build(&input, &output, stem),
    }
}

fn open_corpus(input: &str) -> Result<Box<dyn BufRead>> {
    let file = File::open(input).with_context(|| format!("opening corpus {input}"))?;
    if Path::new(input).extension().and_then(|e| e.to_str()) == Some("gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn build(input: &str, output: &str, stem: bool) -> Result<()> {
    let output = if stem {
        format!("{output}-stemmed")
    } else {
        output.to_string()
    };
    let final_root = PathBuf::from(&output);
    if final_root.exists() {
        bail!("output {output} already exists; refusing to overwrite an index");
    }

    // Build under a temporary sibling and rename on success, so a failed run
    // never leaves a partial index at the final path.
    let tmp_root = temp_sibling(&final_root)?;
    let result = build_into(input, &tmp_root, stem);
    match result {
        Ok(()) => {
            fs::rename(&tmp_root, &final_root)
                .with_context(|| format!("publishing index to {output}"))?;
            tracing::info!(%output, "index published");
            Ok(())
        }
        Err(err) => {
            let _ = fs::remove_dir_all(&tmp_root);
            Err(err)
        }
    }
}

fn temp_sibling(final_root: &Path) -> Result<PathBuf> {
    let name = final_root
        .file_name()
        .and_then(|n| n.to_str())
        .context("output path has no directory name")?;
    let tmp = final_root.with_file_name(format!(".{name}.tmp-{}", std::process::id()));
    if tmp.exists() {
        bail!(
            "temporary build directory {} already exists; remove it first",
            tmp.display()
        );
    }
    Ok(tmp)
}

fn build_into(input: &str, root: &Path, stem: bool) -> Result<()> {
    let started = Instant::now();
    let reader = open_corpus(input)?;
    let mut store = FsDocStore::new(root);
    let built = build_index(reader, stem, &mut store)?;

    let paths = IndexPaths::new(root);
    save_lexicon(&paths, &built.lexicon)?;
    save_inverted_index(&paths, &built.index)?;
    save_docnos(&paths, &built.docnos)?;
    save_doc_lengths(&paths, &built.doc_lengths)?;
    let meta = IndexMeta {
        version: INDEX_FORMAT_VERSION,
        num_docs: built.docnos.len() as u32,
        stemmed: stem,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .context("formatting the index build timestamp")?,
    };
    save_meta(&paths, &meta)?;

    tracing::info!(
        num_docs = built.docnos.len(),
        num_terms = built.lexicon.len(),
        elapsed_s = started.elapsed().as_secs_f64(),
        "index build complete"
    );
    Ok(())
}
