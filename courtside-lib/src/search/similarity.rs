use std::collections::HashMap;

use crate::embed::dot;
use crate::search::RetrievalHit;
use crate::store::{FlatIndex, VectorStore};

/// Redundancy measure used by MMR, in `[0, 1]`.
pub trait Similarity {
    fn similarity(&self, a: &RetrievalHit, b: &RetrievalHit) -> f32;
}

/// Fuzzy partial text match between chunk texts.
///
/// The shorter text is aligned against windows of the longer one and the
/// best indel ratio `2 * lcs / (len_a + len_b)` wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct FuzzySimilarity;

impl Similarity for FuzzySimilarity {
    fn similarity(&self, a: &RetrievalHit, b: &RetrievalHit) -> f32 {
        partial_ratio(&a.chunk.text, &b.chunk.text)
    }
}

/// Cosine similarity of the stored (normalized) chunk vectors, clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddingSimilarity<'a> {
    vectors: &'a FlatIndex,
}

impl<'a> EmbeddingSimilarity<'a> {
    #[must_use]
    pub fn new(vectors: &'a FlatIndex) -> Self {
        Self { vectors }
    }
}

impl Similarity for EmbeddingSimilarity<'_> {
    fn similarity(&self, a: &RetrievalHit, b: &RetrievalHit) -> f32 {
        match (self.vectors.row(a.row), self.vectors.row(b.row)) {
            (Some(x), Some(y)) => dot(x, y).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

/// Best indel ratio of the shorter string against same-length windows of the longer.
///
/// Windows start every `max(1, m / 4)` characters, plus one aligned to the
/// end, so this approximates an exhaustive partial match.
#[must_use]
pub fn partial_ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    match (short.len(), long.len()) {
        (0, 0) => return 1.0,
        (0, _) => return 0.0,
        _ => {}
    }

    let m = short.len();
    let last = long.len() - m;
    let stride = (m / 4).max(1);
    let masks = PatternMasks::new(&short);

    let mut best = 0usize;
    let mut start = 0;
    loop {
        best = best.max(masks.lcs(&long[start..start + m]));
        if best == m || start == last {
            break;
        }
        start = (start + stride).min(last);
    }

    (2 * best) as f32 / (2 * m) as f32
}

/// Match bitmasks of a pattern for bit-parallel LCS.
struct PatternMasks {
    len: usize,
    words: usize,
    masks: HashMap<char, Vec<u64>>,
}

impl PatternMasks {
    fn new(pattern: &[char]) -> Self {
        let words = pattern.len().div_ceil(64);
        let mut masks: HashMap<char, Vec<u64>> = HashMap::new();
        for (i, &c) in pattern.iter().enumerate() {
            masks.entry(c).or_insert_with(|| vec![0; words])[i / 64] |= 1 << (i % 64);
        }
        Self {
            len: pattern.len(),
            words,
            masks,
        }
    }

    /// Length of the longest common subsequence of the pattern and `text`.
    fn lcs(&self, text: &[char]) -> usize {
        let zero = vec![0u64; self.words];
        let mut v = vec![u64::MAX; self.words];

        // V' = (V + (V & M)) | (V & !M), with carry across words
        for c in text {
            let m = self.masks.get(c).unwrap_or(&zero);
            let mut carry = false;
            for (word, &mask) in v.iter_mut().zip(m) {
                let u = *word & mask;
                let (sum, c1) = word.overflowing_add(u);
                let (sum, c2) = sum.overflowing_add(u64::from(carry));
                carry = c1 || c2;
                *word = sum | (*word & !mask);
            }
        }

        let tail = self.len % 64;
        v.iter()
            .enumerate()
            .map(|(w, &word)| {
                let live = if w + 1 == self.words && tail != 0 {
                    (1u64 << tail) - 1
                } else {
                    u64::MAX
                };
                (!word & live).count_ones() as usize
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::chunk::{Chunk, ChunkMetadata};
    use crate::search::HitOrigin;

    fn lcs(a: &str, b: &str) -> usize {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        PatternMasks::new(&a).lcs(&b)
    }

    fn hit(row: usize, text: &str) -> RetrievalHit {
        RetrievalHit {
            chunk: Arc::new(Chunk {
                id: format!("c{row}"),
                text: text.to_string(),
                metadata: ChunkMetadata::default(),
            }),
            row,
            score: 1.0,
            origin: HitOrigin::Vector,
        }
    }

    #[test]
    fn test_lcs_small() {
        assert_eq!(lcs("abc", "abc"), 3);
        assert_eq!(lcs("abcde", "ace"), 3);
        assert_eq!(lcs("abc", "xyz"), 0);
        assert_eq!(lcs("AGGTAB", "GXTXAYB"), 4);
    }

    #[test]
    fn test_lcs_spans_words() {
        let a = "entry angle ".repeat(12);
        assert!(a.chars().count() > 128);
        assert_eq!(lcs(&a, &a), a.chars().count());

        let shifted = format!("x{}", &a[1..]);
        assert_eq!(lcs(&a, &shifted), a.chars().count() - 1);
    }

    #[test]
    fn test_partial_ratio_substring() {
        let ratio = partial_ratio("entry angle", "keep a high entry angle on every shot");
        assert!((ratio - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_ratio_bounds() {
        assert_eq!(partial_ratio("", ""), 1.0);
        assert_eq!(partial_ratio("", "abc"), 0.0);
        assert_eq!(partial_ratio("abc", "xyz"), 0.0);

        let r = partial_ratio("follow through high", "follow-through held high");
        assert!(r > 0.5 && r < 1.0);
    }

    #[test]
    fn test_partial_ratio_symmetric() {
        let a = "plant the standing foot";
        let b = "the standing foot points at the target";
        assert_eq!(partial_ratio(a, b), partial_ratio(b, a));
    }

    #[test]
    fn test_embedding_similarity_clamped() {
        let mut vectors = FlatIndex::new();
        vectors
            .add(
                &["c0".into(), "c1".into(), "c2".into()],
                &[vec![1.0, 0.0], vec![-1.0, 0.0], vec![1.0, 1.0]],
            )
            .unwrap();
        let sim = EmbeddingSimilarity::new(&vectors);

        assert_eq!(sim.similarity(&hit(0, ""), &hit(1, "")), 0.0);
        assert!((sim.similarity(&hit(0, ""), &hit(0, "")) - 1.0).abs() < 1e-6);
        let diagonal = sim.similarity(&hit(0, ""), &hit(2, ""));
        assert!((diagonal - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
    }
}
