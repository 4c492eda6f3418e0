use crate::docstore::StoredDoc;
use crate::tokenizer::tokenize;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Sentences of five words or fewer are never snippet candidates.
const MIN_SENTENCE_WORDS: usize = 6;
/// Synthetic headlines truncate the lead sentence to this many words.
const HEADLINE_WORD_CAP: usize = 15;

/// What the result lists show for one ranked document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub headline: String,
    pub snippet: String,
}

#[derive(PartialEq, Eq)]
struct ScoredSentence {
    score: i32,
    order: usize,
    text: String,
}

// Max-heap by score; earlier document order wins ties.
impl Ord for ScoredSentence {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then(other.order.cmp(&self.order))
    }
}

impl PartialOrd for ScoredSentence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Build the two-sentence snippet and headline for one ranked result.
///
/// When the document has no stored headline the lead snippet sentence is
/// truncated into a synthetic one. A document with no eligible sentences
/// produces a shorter (possibly empty) snippet.
pub fn summarize(doc: &StoredDoc, query_tokens: &[String]) -> Summary {
    let sentences = select_sentences(&doc.content, query_tokens, 2);
    let snippet = sentences.join(" ");
    let headline = match doc.meta.headline.as_deref() {
        Some(h) if !h.is_empty() => h.to_string(),
        _ => synthetic_headline(sentences.first().map(String::as_str).unwrap_or("")),
    };
    Summary { headline, snippet }
}

/// Score every eligible sentence from the body/graphic sections and return
/// the best `limit` of them, highest score first.
pub fn select_sentences(content: &[String], query_tokens: &[String], limit: usize) -> Vec<String> {
    let mut heap: BinaryHeap<ScoredSentence> = BinaryHeap::new();
    let mut order = 0;
    let mut eligible_seen = 0;

    for paragraph in body_paragraphs(content) {
        for sentence in split_sentences(&paragraph) {
            if sentence.split_whitespace().count() < MIN_SENTENCE_WORDS {
                continue;
            }
            eligible_seen += 1;
            let mut score = score_sentence(&sentence, query_tokens);
            // Early sentences are likelier to summarize the document.
            if eligible_seen == 1 {
                score += 2;
            } else if eligible_seen == 2 {
                score += 1;
            }
            heap.push(ScoredSentence {
                score,
                order,
                text: sentence,
            });
            order += 1;
        }
    }

    let mut best = Vec::with_capacity(limit);
    while best.len() < limit {
        match heap.pop() {
            Some(scored) => best.push(scored.text),
            None => break,
        }
    }
    best
}

/// Reassemble multi-line paragraph content from `<TEXT>` and `<GRAPHIC>`
/// sections. Tag lines (section markers, `<P>`, ...) delimit paragraphs and
/// are never part of one.
fn body_paragraphs(content: &[String]) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_body = false;

    let flush = |current: &mut String, paragraphs: &mut Vec<String>| {
        if !current.trim().is_empty() {
            paragraphs.push(std::mem::take(current));
        } else {
            current.clear();
        }
    };

    for line in content {
        if line.contains("<TEXT>") || line.contains("<GRAPHIC>") {
            in_body = true;
            continue;
        }
        if line.contains("</TEXT>") || line.contains("</GRAPHIC>") {
            flush(&mut current, &mut paragraphs);
            in_body = false;
            continue;
        }
        if !in_body {
            continue;
        }
        if line.contains('<') || line.contains('>') {
            flush(&mut current, &mut paragraphs);
        } else {
            current.push_str(line);
            current.push(' ');
        }
    }
    flush(&mut current, &mut paragraphs);
    paragraphs
}

/// Split a paragraph on `.`, `?`, `!`. Text after the last terminator is not
/// a sentence and is dropped.
fn split_sentences(paragraph: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for (i, c) in paragraph.char_indices() {
        if matches!(c, '.' | '?' | '!') {
            let sentence = paragraph[start..=i].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = i + 1;
        }
    }
    sentences
}

/// Relevance of a sentence to the query: total query-term occurrences, plus
/// distinct query terms found, plus the longest run of consecutive matching
/// tokens (runs shorter than two tokens do not count).
fn score_sentence(sentence: &str, query_tokens: &[String]) -> i32 {
    let tokens = tokenize(sentence);
    let mut counts: HashMap<&str, i32> = HashMap::new();
    let mut run = 0;
    let mut best_run = 0;

    for token in &tokens {
        if let Some(term) = query_tokens.iter().find(|t| *t == token) {
            *counts.entry(term.as_str()).or_insert(0) += 1;
            run += 1;
        } else {
            if run >= 2 {
                best_run = best_run.max(run);
            }
            run = 0;
        }
    }
    if run >= 2 {
        best_run = best_run.max(run);
    }

    let c: i32 = counts.values().sum();
    let d = counts.len() as i32;
    c + d + best_run
}

fn synthetic_headline(sentence: &str) -> String {
    let words: Vec<&str> = sentence.split_whitespace().collect();
    if words.len() > HEADLINE_WORD_CAP {
        let mut headline = words[..HEADLINE_WORD_CAP].join(" ");
        headline.push_str("...");
        headline
    } else {
        sentence.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docstore::DocMeta;

    fn doc_with(content: &[&str], headline: Option<&str>) -> StoredDoc {
        StoredDoc {
            meta: DocMeta {
                docno: "LA010190-0001".to_string(),
                internal_id: 0,
                date: "January 1, 1990".to_string(),
                headline: headline.map(str::to_string),
            },
            content: content.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn five_word_sentences_are_excluded_six_are_kept() {
        let content = [
            "<TEXT>",
            "One two three four five. One two three four five six.",
            "</TEXT>",
        ];
        let sentences = select_sentences(
            &content.map(String::from),
            &terms(&["seven"]),
            2,
        );
        assert_eq!(sentences, vec!["One two three four five six.".to_string()]);
    }

    #[test]
    fn no_eligible_sentences_yields_empty_snippet() {
        let doc = doc_with(&["<TEXT>", "Too short here.", "</TEXT>"], None);
        let summary = summarize(&doc, &terms(&["short"]));
        assert_eq!(summary.snippet, "");
        assert_eq!(summary.headline, "");
    }

    #[test]
    fn scoring_counts_occurrences_distinct_terms_and_runs() {
        // c = 3 (dog, dog, cat), d = 2, run = 2 ("dog cat")
        let score = score_sentence(
            "the dog saw another dog cat yesterday",
            &terms(&["dog", "cat"]),
        );
        assert_eq!(score, 7);
    }

    #[test]
    fn single_token_runs_do_not_count() {
        // c = 1, d = 1, no run of length >= 2
        let score = score_sentence("a dog walked home", &terms(&["dog", "cat"]));
        assert_eq!(score, 2);
    }

    #[test]
    fn run_reaching_end_of_sentence_counts() {
        // c = 2, d = 2, run = 2 at the very end
        let score = score_sentence("we saw dog cat", &terms(&["dog", "cat"]));
        assert_eq!(score, 6);
    }

    #[test]
    fn query_matches_beat_positional_boost() {
        let content = [
            "<TEXT>",
            "The mayor spoke at length about the budget today.",
            "<P>",
            "Wildfire crews battled the wildfire blaze near the wildfire canyon rim.",
            "</P>",
            "</TEXT>",
        ];
        let sentences = select_sentences(
            &content.map(String::from),
            &terms(&["wildfire"]),
            2,
        );
        // c=3, d=1 beats the lead sentence's +2
        assert!(sentences[0].starts_with("Wildfire crews"));
        assert!(sentences[1].starts_with("The mayor"));
    }

    #[test]
    fn graphic_sections_are_summarized_headline_is_not() {
        let content = [
            "<HEADLINE>",
            "Ignored headline words here for everyone.",
            "</HEADLINE>",
            "<GRAPHIC>",
            "A crowd gathers outside the old city hall downtown.",
            "</GRAPHIC>",
        ];
        let sentences = select_sentences(&content.map(String::from), &terms(&["crowd"]), 2);
        assert_eq!(sentences.len(), 1);
        assert!(sentences[0].starts_with("A crowd"));
    }

    #[test]
    fn stored_headline_wins_over_synthetic() {
        let doc = doc_with(
            &[
                "<TEXT>",
                "Seven words are quite enough right here.",
                "</TEXT>",
            ],
            Some("Real Headline"),
        );
        let summary = summarize(&doc, &terms(&["words"]));
        assert_eq!(summary.headline, "Real Headline");
    }

    #[test]
    fn synthetic_headline_truncates_to_fifteen_words() {
        let long = "one two three four five six seven eight nine ten eleven twelve thirteen fourteen fifteen sixteen seventeen.";
        let doc = doc_with(&["<TEXT>", long, "</TEXT>"], None);
        let summary = summarize(&doc, &terms(&["nothing"]));
        assert_eq!(
            summary.headline,
            "one two three four five six seven eight nine ten eleven twelve thirteen fourteen fifteen..."
        );
    }

    #[test]
    fn paragraphs_reassemble_across_lines() {
        let content = [
            "<TEXT>",
            "<P>",
            "The first half of a sentence",
            "continues on the next line.",
            "</P>",
            "</TEXT>",
        ];
        let paragraphs = body_paragraphs(&content.map(String::from));
        assert_eq!(paragraphs.len(), 1);
        assert!(paragraphs[0].contains("sentence continues"));
    }
}
