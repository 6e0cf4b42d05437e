use crate::embed::{normalize_l2, Embedder, Embedding};
use crate::Result;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Feature-hashing embedder that needs no model download.
///
/// Each lower-cased word and each adjacent word pair is hashed (FNV-1a, so
/// vectors are stable across builds and platforms) into a signed bucket. The
/// result is a normalized bag-of-words vector: useful offline and in tests,
/// but it captures no semantics beyond shared vocabulary.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_one(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0; self.dimension];
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();

        for word in &words {
            self.add_feature(&mut vector, word.as_bytes(), 1.0);
        }
        for pair in words.windows(2) {
            let feature = format!("{} {}", pair[0], pair[1]);
            self.add_feature(&mut vector, feature.as_bytes(), 0.5);
        }

        normalize_l2(&mut vector);
        vector
    }

    fn add_feature(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let hash = fnv1a(feature);
        let bucket = (hash % self.dimension as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Embedder for HashingEmbedder {
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn embed_query(&self, text: &str) -> Result<Embedding> {
        Ok(self.embed_one(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "feature-hashing"
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::dot;

    #[test]
    fn test_deterministic() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed_query("entry angle").unwrap();
        let b = embedder.embed_query("Entry   ANGLE").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unit_length_and_dimension() {
        let embedder = HashingEmbedder::new(64);
        let docs = embedder
            .embed_documents(&["keep the elbow under the ball", "square your hips"])
            .unwrap();

        assert_eq!(docs.len(), 2);
        for doc in &docs {
            assert_eq!(doc.len(), 64);
            assert!((dot(doc, doc) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_shared_words_score_higher() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed_query("shot entry angle").unwrap();
        let related = embedder.embed_query("the entry angle of the shot").unwrap();
        let unrelated = embedder.embed_query("goalkeeper distribution drills").unwrap();

        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(8);
        let v = embedder.embed_query("  ").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
