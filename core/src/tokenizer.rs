use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"[\p{L}\p{N}]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Tokenize text into lower-cased maximal runs of letters and digits.
///
/// Everything else is a separator and never appears in a token. There is no
/// minimum token length and purely numeric tokens are kept.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Porter-stem a single token.
pub fn stem(token: &str) -> String {
    STEMMER.stem(token).to_string()
}

/// Tokenize and, when `stemmed` is set, stem each token.
///
/// Stemming changes lexicon identity, so query analysis must use the same
/// flag the index was built with.
pub fn analyze(text: &str, stemmed: bool) -> Vec<String> {
    let mut tokens = tokenize(text);
    if stemmed {
        for token in tokens.iter_mut() {
            *token = stem(token);
        }
    }
    tokens
}
