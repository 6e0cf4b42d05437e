use serde::Deserialize;

use crate::rerank::BonusScorer;
use crate::search::RetrievalHit;

/// Keywords sharing one bonus weight.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeywordTier {
    pub keywords: Vec<String>,
    pub weight: f32,
}

impl KeywordTier {
    pub fn new<I, S>(keywords: I, weight: f32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(|k| k.into().to_lowercase()).collect(),
            weight,
        }
    }

    fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

/// Adds a tier's weight once if any of its keywords occurs in the chunk text.
///
/// Matching is a case-insensitive substring test, so `arc` also matches
/// `arcing`. Tier weights add up.
#[derive(Debug, Clone)]
pub struct KeywordBonus {
    tiers: Vec<KeywordTier>,
}

impl KeywordBonus {
    #[must_use]
    pub fn new(tiers: Vec<KeywordTier>) -> Self {
        let tiers = tiers
            .into_iter()
            .map(|tier| KeywordTier::new(tier.keywords, tier.weight))
            .collect();
        Self { tiers }
    }

    /// Shooting mechanics first, general technique second.
    #[must_use]
    pub fn shooting() -> Self {
        Self::new(vec![
            KeywordTier::new(["angle", "arc", "entry", "release"], 1.0),
            KeywordTier::new(["form", "technique", "mechanics", "finishing"], 0.5),
        ])
    }

    #[must_use]
    pub fn tiers(&self) -> &[KeywordTier] {
        &self.tiers
    }
}

impl Default for KeywordBonus {
    fn default() -> Self {
        Self::shooting()
    }
}

impl BonusScorer for KeywordBonus {
    fn bonus(&self, hit: &RetrievalHit) -> f32 {
        let text = hit.chunk.text.to_lowercase();
        self.tiers
            .iter()
            .filter(|tier| tier.matches(&text))
            .map(|tier| tier.weight)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::chunk::{Chunk, ChunkMetadata};
    use crate::rerank::rerank;
    use crate::search::HitOrigin;

    fn hit(id: &str, text: &str) -> RetrievalHit {
        RetrievalHit {
            chunk: Arc::new(Chunk {
                id: id.to_string(),
                text: text.to_string(),
                metadata: ChunkMetadata::default(),
            }),
            row: 0,
            score: 0.0,
            origin: HitOrigin::Lexical,
        }
    }

    #[test]
    fn test_tier_weights_add() {
        let scorer = KeywordBonus::default();
        assert_eq!(scorer.bonus(&hit("a", "Release ANGLE and form")), 1.5);
        assert_eq!(scorer.bonus(&hit("b", "entry and arc")), 1.0);
        assert_eq!(scorer.bonus(&hit("c", "good mechanics")), 0.5);
        assert_eq!(scorer.bonus(&hit("d", "footwork")), 0.0);
    }

    #[test]
    fn test_rerank_is_stable() {
        let hits = vec![
            hit("plain-1", "balance over the feet"),
            hit("tech", "technique cue"),
            hit("angle-1", "entry angle"),
            hit("plain-2", "eyes on the rim"),
            hit("angle-2", "high arc"),
        ];

        let ranked = rerank(hits, &KeywordBonus::default(), 5);
        let ids: Vec<&str> = ranked.iter().map(|h| h.chunk.id.as_str()).collect();

        assert_eq!(ids, vec!["angle-1", "angle-2", "tech", "plain-1", "plain-2"]);
    }

    #[test]
    fn test_custom_tiers() {
        let scorer = KeywordBonus::new(vec![KeywordTier::new(["Volley"], 2.0)]);
        assert_eq!(scorer.tiers()[0].keywords, vec!["volley"]);
        assert_eq!(scorer.bonus(&hit("a", "split step before the volley")), 2.0);
    }
}
