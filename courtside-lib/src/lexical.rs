//! BM25 keyword index
//!
//! Okapi BM25 over lower-cased alphanumeric tokens. Terms that occur in more
//! than half of the corpus would get a negative IDF; like the classic Okapi
//! variant those are floored at `epsilon * mean IDF` (and never below zero)
//! so a common term never lowers a score.

use std::collections::HashMap;

/// Term-frequency saturation
pub const K1: f32 = 1.5;
/// Document-length normalization
pub const B: f32 = 0.75;
/// Floor for negative IDF values, as a fraction of the mean IDF
pub const EPSILON: f32 = 0.25;

/// Split text into lower-cased alphanumeric tokens.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Immutable BM25 index. Row `i` is the `i`-th text passed to [`Bm25Index::build`].
#[derive(Debug, Clone, Default)]
pub struct Bm25Index {
    ids: Vec<String>,
    term_freqs: Vec<HashMap<String, u32>>,
    doc_lens: Vec<usize>,
    avg_doc_len: f32,
    idf: HashMap<String, f32>,
}

impl Bm25Index {
    /// Build the index from `(id, text)` rows.
    pub fn build<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut ids = Vec::new();
        let mut term_freqs = Vec::new();
        let mut doc_lens = Vec::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for (id, text) in rows {
            let tokens = tokenize(text);
            let mut freqs: HashMap<String, u32> = HashMap::new();
            for token in &tokens {
                *freqs.entry(token.clone()).or_insert(0) += 1;
            }
            for term in freqs.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            ids.push(id.to_string());
            doc_lens.push(tokens.len());
            term_freqs.push(freqs);
        }

        let corpus_size = ids.len();
        let avg_doc_len = if corpus_size == 0 {
            0.0
        } else {
            doc_lens.iter().sum::<usize>() as f32 / corpus_size as f32
        };

        Self {
            idf: inverse_document_frequencies(&doc_freq, corpus_size),
            ids,
            term_freqs,
            doc_lens,
            avg_doc_len,
        }
    }

    /// One BM25 score per row, in row order.
    ///
    /// Rows sharing no term with the query score 0.0.
    #[must_use]
    pub fn score(&self, query_tokens: &[String]) -> Vec<f32> {
        self.term_freqs
            .iter()
            .zip(&self.doc_lens)
            .map(|(freqs, &doc_len)| self.score_row(query_tokens, freqs, doc_len))
            .collect()
    }

    /// The `n` best-scoring rows, highest first, ties by row.
    ///
    /// Zero-score rows are kept, so a corpus with no matching term still
    /// yields `min(n, len)` rows.
    #[must_use]
    pub fn top(&self, query_tokens: &[String], n: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .score(query_tokens)
            .into_iter()
            .enumerate()
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(n);
        scored
    }

    /// Chunk id stored at a row
    #[must_use]
    pub fn id(&self, row: usize) -> Option<&str> {
        self.ids.get(row).map(String::as_str)
    }

    /// Chunk ids in row order
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn score_row(&self, query_tokens: &[String], freqs: &HashMap<String, u32>, doc_len: usize) -> f32 {
        let length_norm = 1.0 - B + B * doc_len as f32 / self.avg_doc_len.max(f32::EPSILON);
        query_tokens
            .iter()
            .filter_map(|token| {
                let tf = *freqs.get(token)? as f32;
                let idf = self.idf.get(token).copied().unwrap_or(0.0);
                Some(idf * tf * (K1 + 1.0) / (tf + K1 * length_norm))
            })
            .sum()
    }
}

fn inverse_document_frequencies(
    doc_freq: &HashMap<String, usize>,
    corpus_size: usize,
) -> HashMap<String, f32> {
    let n = corpus_size as f32;
    let mut idf: HashMap<String, f32> = doc_freq
        .iter()
        .map(|(term, &df)| {
            let df = df as f32;
            (term.clone(), ((n - df + 0.5) / (df + 0.5)).ln())
        })
        .collect();

    if idf.is_empty() {
        return idf;
    }
    let mean = idf.values().sum::<f32>() / idf.len() as f32;
    let floor = (EPSILON * mean).max(0.0);
    for value in idf.values_mut() {
        if *value < 0.0 {
            *value = floor;
        }
    }
    idf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(texts: &[&str]) -> Bm25Index {
        let ids: Vec<String> = (0..texts.len()).map(|i| format!("c{i}")).collect();
        Bm25Index::build(ids.iter().map(String::as_str).zip(texts.iter().copied()))
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Entry-angle: 45°, FOLLOW through!"),
            vec!["entry", "angle", "45", "follow", "through"]
        );
        assert!(tokenize("  ...  ").is_empty());
    }

    #[test]
    fn test_matching_row_scores_highest() {
        let index = index(&[
            "keep a high entry angle on the jump shot",
            "goalkeepers should stay on their line",
            "serve toss height and racket angle",
        ]);

        let scores = index.score(&tokenize("entry angle"));

        assert_eq!(scores.len(), 3);
        assert!(scores[0] > scores[2]);
        assert!(scores[2] > 0.0);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn test_no_match_all_zero() {
        let index = index(&["dribble with the left hand", "volley at the net"]);
        let scores = index.score(&tokenize("offside trap"));
        assert_eq!(scores, vec![0.0, 0.0]);
        assert_eq!(index.top(&tokenize("offside trap"), 5), vec![(0, 0.0), (1, 0.0)]);
    }

    #[test]
    fn test_top_keeps_zero_score_rows_after_matches() {
        let index = index(&["footwork drill", "entry angle", "balance drill", "wrist snap"]);

        let top = index.top(&tokenize("entry"), 3);

        assert_eq!(top.len(), 3);
        assert_eq!(top[0].0, 1);
        assert!(top[0].1 > 0.0);
        // zero scores tie, lower rows first
        assert_eq!(top[1], (0, 0.0));
        assert_eq!(top[2], (2, 0.0));
    }

    #[test]
    fn test_common_terms_never_negative() {
        // "ball" appears in every row, so its raw IDF is negative
        let index = index(&["ball ball spin", "ball control", "ball striking"]);
        for score in index.score(&tokenize("ball")) {
            assert!(score >= 0.0);
        }
    }

    #[test]
    fn test_shorter_document_wins_on_equal_tf() {
        let index = index(&[
            "release point",
            "release point with a lot of other words about footwork and balance",
            "unrelated text",
        ]);
        let scores = index.score(&tokenize("release"));
        assert!(scores[0] > scores[1]);
    }

    #[test]
    fn test_top_orders_and_truncates() {
        let index = index(&[
            "arc",
            "arc arc arc entry",
            "nothing relevant here",
            "entry",
            "footwork drill",
            "balance drill",
        ]);

        let top = index.top(&tokenize("arc entry"), 2);

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].0, 1);
        assert!(top[0].1 >= top[1].1);
    }

    #[test]
    fn test_ids_follow_row_order() {
        let index = index(&["a", "b"]);
        assert_eq!(index.id(0), Some("c0"));
        assert_eq!(index.id(1), Some("c1"));
        assert_eq!(index.id(2), None);
    }

    #[test]
    fn test_empty_index() {
        let index = index(&[]);
        assert!(index.is_empty());
        assert!(index.score(&tokenize("anything")).is_empty());
    }
}
