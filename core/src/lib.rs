pub mod bm25;
pub mod boolean;
pub mod docstore;
pub mod index;
pub mod indexer;
pub mod lexicon;
pub mod persist;
pub mod snippet;
pub mod tokenizer;
pub mod topics;

pub use docstore::{DocMeta, DocumentStore, FsDocStore, MemDocStore, StoredDoc};
pub use index::{DocId, DocLengths, InvertedIndex, Posting};
pub use lexicon::{Lexicon, LexiconBuilder, TermId};
