#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! In-memory BM25 keyword scorer.
//!
//! Fit once over a corpus of searchable text, then score any query against
//! every document. Hangul tokens additionally contribute their overlapping
//! 2-char windows, which stands in for morphological segmentation: the
//! compound "사무용책상" still overlaps the query token "책상" through the
//! shared bigram.

use std::collections::{HashMap, HashSet};

const DEFAULT_K1: f32 = 1.5;
const DEFAULT_B: f32 = 0.75;

pub struct Bm25 {
    k1: f32,
    b: f32,
    doc_freqs: Vec<HashMap<String, u32>>,
    doc_lens: Vec<usize>,
    idf: HashMap<String, f32>,
    avgdl: f32,
}

impl Default for Bm25 {
    fn default() -> Self {
        Self::new(DEFAULT_K1, DEFAULT_B)
    }
}

impl Bm25 {
    pub fn new(k1: f32, b: f32) -> Self {
        Self { k1, b, doc_freqs: Vec::new(), doc_lens: Vec::new(), idf: HashMap::new(), avgdl: 0.0 }
    }

    /// Builds term statistics for `corpus`. Replaces any previous fit.
    pub fn fit(&mut self, corpus: &[String]) {
        let tokenized: Vec<Vec<String>> = corpus.iter().map(|doc| tokenize(doc)).collect();

        self.doc_lens = tokenized.iter().map(Vec::len).collect();
        self.doc_freqs = tokenized
            .iter()
            .map(|doc| {
                let mut freq: HashMap<String, u32> = HashMap::new();
                for token in doc {
                    *freq.entry(token.clone()).or_insert(0) += 1;
                }
                freq
            })
            .collect();

        self.idf.clear();
        self.avgdl = 0.0;
        if tokenized.is_empty() {
            return;
        }
        self.avgdl = self.doc_lens.iter().sum::<usize>() as f32 / tokenized.len() as f32;

        let n = tokenized.len() as f32;
        let mut vocab: HashSet<&String> = HashSet::new();
        for doc in &self.doc_freqs {
            vocab.extend(doc.keys());
        }
        let mut idf = HashMap::with_capacity(vocab.len());
        for token in vocab {
            let df = self.doc_freqs.iter().filter(|doc| doc.contains_key(token)).count() as f32;
            // Floored at 0: the raw form goes negative for terms present in
            // more than half the corpus, and a keyword hit must never count
            // against a document.
            let value = ((n - df + 0.5) / (df + 0.5)).ln().max(0.0);
            idf.insert(token.clone(), value);
        }
        self.idf = idf;

        tracing::debug!(docs = corpus.len(), vocab = self.idf.len(), "keyword index fitted");
    }

    /// Number of documents in the current fit.
    pub fn len(&self) -> usize {
        self.doc_freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_freqs.is_empty()
    }

    /// One score per fitted document; documents sharing no token with the
    /// query score exactly 0. An unfitted/empty scorer yields an empty vector.
    pub fn scores(&self, query: &str) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.doc_freqs.len()];
        if self.doc_freqs.is_empty() {
            return scores;
        }

        for token in tokenize(query) {
            let Some(&idf) = self.idf.get(&token) else {
                continue;
            };
            for (i, doc) in self.doc_freqs.iter().enumerate() {
                let Some(&tf) = doc.get(&token) else {
                    continue;
                };
                let tf = tf as f32;
                let dl = self.doc_lens[i] as f32;
                let denom = tf + self.k1 * (1.0 - self.b + self.b * dl / self.avgdl);
                scores[i] += idf * tf * (self.k1 + 1.0) / denom;
            }
        }
        scores
    }
}

/// Lowercases, strips everything except word characters and Hangul, splits
/// on whitespace, and appends overlapping 2-char windows for Hangul tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();

    let base: Vec<String> = cleaned.split_whitespace().map(str::to_string).collect();

    let mut bigrams = Vec::new();
    for token in &base {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() >= 2 && chars.iter().any(|c| ('가'..='힣').contains(c)) {
            for window in chars.windows(2) {
                bigrams.push(window.iter().collect::<String>());
            }
        }
    }

    let mut tokens = base;
    tokens.extend(bigrams);
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "사무용 책상 1800x800".to_string(),
            "사무용 의자".to_string(),
            "무선 마우스".to_string(),
        ]
    }

    #[test]
    fn tokenize_emits_hangul_bigrams() {
        let tokens = tokenize("사무용");
        assert_eq!(tokens, vec!["사무용", "사무", "무용"]);
    }

    #[test]
    fn tokenize_lowercases_and_splits_on_punctuation() {
        let tokens = tokenize("Office-Desk");
        assert_eq!(tokens, vec!["office", "desk"]);
    }

    #[test]
    fn tokenize_skips_bigrams_for_pure_latin_tokens() {
        let tokens = tokenize("mouse");
        assert_eq!(tokens, vec!["mouse"]);
    }

    #[test]
    fn exact_overlap_document_ranks_first() {
        let mut bm25 = Bm25::default();
        bm25.fit(&corpus());

        let scores = bm25.scores("사무용 의자");
        assert_eq!(scores.len(), 3);
        let best = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i);
        assert_eq!(best, Some(1));
    }

    #[test]
    fn scores_are_never_negative() {
        let mut bm25 = Bm25::default();
        bm25.fit(&corpus());
        // "사무용" sits in two of three documents; its raw IDF is negative
        // before the floor.
        for score in bm25.scores("사무용") {
            assert!(score >= 0.0);
        }
    }

    #[test]
    fn disjoint_document_scores_exactly_zero() {
        let mut bm25 = Bm25::default();
        bm25.fit(&corpus());
        let scores = bm25.scores("의자");
        assert_eq!(scores[2], 0.0, "무선 마우스 shares no token with 의자");
    }

    #[test]
    fn unknown_query_terms_contribute_nothing() {
        let mut bm25 = Bm25::default();
        bm25.fit(&corpus());
        let scores = bm25.scores("프린터");
        assert!(scores.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn empty_corpus_scores_empty() {
        let mut bm25 = Bm25::default();
        bm25.fit(&[]);
        assert!(bm25.is_empty());
        assert!(bm25.scores("사무용 책상").is_empty());
    }

    #[test]
    fn unfitted_scorer_scores_empty() {
        let bm25 = Bm25::default();
        assert!(bm25.scores("query").is_empty());
    }

    #[test]
    fn ubiquitous_term_has_no_discriminative_power() {
        let mut bm25 = Bm25::default();
        bm25.fit(&["desk lamp".to_string(), "desk chair".to_string()]);
        // "desk" appears everywhere: floored IDF removes it entirely.
        assert!(bm25.scores("desk").iter().all(|s| *s == 0.0));
    }

    #[test]
    fn shorter_document_wins_on_equal_term_frequency() {
        // Five documents keep the IDF of a twice-occurring term positive.
        let mut bm25 = Bm25::default();
        bm25.fit(&[
            "모니터".to_string(),
            "모니터 거치대 받침 지지대 부속품".to_string(),
            "키보드".to_string(),
            "복합기".to_string(),
            "공유기".to_string(),
        ]);
        let scores = bm25.scores("모니터");
        assert!(scores[0] > 0.0);
        assert!(scores[0] > scores[1], "length normalization must favor the shorter document");
    }

    #[test]
    fn compound_token_still_overlaps_through_bigrams() {
        let mut bm25 = Bm25::default();
        bm25.fit(&[
            "사무용책상".to_string(),
            "무선 마우스".to_string(),
            "키보드".to_string(),
        ]);
        let scores = bm25.scores("책상");
        assert!(scores[0] > 0.0, "bigram 책상 must bridge the unsegmented compound");
        assert_eq!(scores[1], 0.0);
        assert_eq!(scores[2], 0.0);
    }
}
