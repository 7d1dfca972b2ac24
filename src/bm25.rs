//! BM25 term weighting over an ephemeral two-document index.
//!
//! The matching engine indexes exactly one CV and one JD per analysis and
//! asks for the BM25 weight of every vocabulary term in each document.
//! Weights use the Okapi formula with k1 = 1.2, b = 0.75. Term maps are
//! `BTreeMap`s, so iteration order and every downstream ranking are
//! deterministic.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

/// BM25 term-frequency saturation parameter.
pub const BM25_K1: f64 = 1.2;
/// BM25 length-normalization parameter.
pub const BM25_B: f64 = 0.75;

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is",
        "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
        "these", "they", "this", "to", "was", "will", "with",
    ]
    .into_iter()
    .collect()
});

/// Tokenizes text: lowercase, split on non-alphanumeric boundaries, drop
/// single-character tokens and stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1 && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// A term's occurrence count within one document.
#[derive(Debug, Clone)]
struct Posting {
    doc_id: u32,
    term_frequency: u32,
}

/// Inverted index over a handful of documents.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    index: BTreeMap<String, Vec<Posting>>,
    doc_lengths: Vec<u32>,
    doc_count: u32,
    total_doc_length: u64,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes a document's text under an internal ID.
    pub fn add_document(&mut self, doc_id: u32, text: &str) {
        let tokens = tokenize(text);
        let doc_len = tokens.len() as u32;

        let idx = doc_id as usize;
        if idx >= self.doc_lengths.len() {
            self.doc_lengths.resize(idx + 1, 0);
        }
        self.doc_lengths[idx] = doc_len;
        self.doc_count += 1;
        self.total_doc_length += u64::from(doc_len);

        let mut tf_map: HashMap<&str, u32> = HashMap::new();
        for token in &tokens {
            *tf_map.entry(token.as_str()).or_insert(0) += 1;
        }

        for (term, tf) in tf_map {
            self.index.entry(term.to_string()).or_default().push(Posting {
                doc_id,
                term_frequency: tf,
            });
        }
    }

    fn average_doc_length(&self) -> f64 {
        if self.doc_count == 0 {
            return 0.0;
        }
        self.total_doc_length as f64 / f64::from(self.doc_count)
    }

    /// BM25 weight of every term that occurs in the given document.
    ///
    /// Equivalent to issuing a one-term match query per vocabulary term and
    /// reading the score assigned to this document.
    pub fn term_weights(&self, doc_id: u32) -> BTreeMap<String, f64> {
        let mut weights = BTreeMap::new();
        if self.doc_count == 0 {
            return weights;
        }

        let avgdl = self.average_doc_length();
        let n = f64::from(self.doc_count);
        let dl = self
            .doc_lengths
            .get(doc_id as usize)
            .copied()
            .unwrap_or(0) as f64;

        for (term, postings) in &self.index {
            let Some(posting) = postings.iter().find(|p| p.doc_id == doc_id) else {
                continue;
            };
            let df = postings.len() as f64;
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
            let tf = f64::from(posting.term_frequency);
            let tf_norm = if avgdl > 0.0 {
                (tf * (BM25_K1 + 1.0)) / (tf + BM25_K1 * (1.0 - BM25_B + BM25_B * dl / avgdl))
            } else {
                0.0
            };
            weights.insert(term.clone(), idf * tf_norm);
        }

        weights
    }
}
