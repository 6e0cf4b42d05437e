//! Additive re-ranking of retrieved hits
//!
//! A [`BonusScorer`] assigns each hit a bonus; [`rerank`] orders hits by that
//! bonus alone, keeping the incoming (MMR) order among equal bonuses.
//!
//! # Usage
//!
//! ```ignore
//! use courtside_lib::rerank::{rerank, KeywordBonus};
//!
//! let hits = retriever.search(subgoal, 6)?;
//! let top = rerank(hits, &KeywordBonus::default(), 3);
//! ```

use crate::search::RetrievalHit;

/// Trait for re-ranking bonus providers
pub trait BonusScorer: Send + Sync {
    /// Bonus for a hit; higher ranks earlier
    fn bonus(&self, hit: &RetrievalHit) -> f32;
}

/// Gives every hit the same bonus, so [`rerank`] only truncates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBonus;

impl BonusScorer for NoBonus {
    fn bonus(&self, _hit: &RetrievalHit) -> f32 {
        0.0
    }
}

/// Stable sort of `hits` by descending bonus, truncated to `keep`.
#[must_use]
pub fn rerank(hits: Vec<RetrievalHit>, scorer: &dyn BonusScorer, keep: usize) -> Vec<RetrievalHit> {
    let mut scored: Vec<(f32, RetrievalHit)> = hits.into_iter().map(|h| (scorer.bonus(&h), h)).collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().take(keep).map(|(_, hit)| hit).collect()
}

mod keyword;

pub use keyword::*;
