//! Hybrid retrieval
//!
//! Fuses dense (vector) and sparse (BM25) candidates into one deduplicated
//! list, then diversifies it with Maximal Marginal Relevance.
//!
//! # Usage
//!
//! ```ignore
//! use courtside_lib::search::HybridRetriever;
//!
//! let snapshot = handle.current()?;
//! let retriever = HybridRetriever::new(snapshot, &embedder, &config.retrieval);
//! let hits = retriever.search("How do I improve my shot arc?", 6)?;
//! ```
//!
//! Vector scores are cosine similarities and BM25 scores are unbounded; the
//! merge compares them raw, so a strong lexical match usually outranks a
//! vector match.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::chunk::Chunk;
use crate::config::{Diversity, RetrievalConfig};
use crate::embed::Embedder;
use crate::index::IndexSnapshot;
use crate::lexical::tokenize;
use crate::store::VectorStore;
use crate::Result;

/// Which candidate source produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOrigin {
    Vector,
    Lexical,
    /// Found by both sources
    Merged,
}

/// A retrieved chunk with its snapshot row and raw score.
#[derive(Debug, Clone)]
pub struct RetrievalHit {
    pub chunk: Arc<Chunk>,
    pub row: usize,
    pub score: f32,
    pub origin: HitOrigin,
}

/// Hybrid search over one snapshot.
pub struct HybridRetriever<'a> {
    snapshot: Arc<IndexSnapshot>,
    embedder: &'a dyn Embedder,
    config: RetrievalConfig,
}

impl<'a> HybridRetriever<'a> {
    #[must_use]
    pub fn new(snapshot: Arc<IndexSnapshot>, embedder: &'a dyn Embedder, config: &RetrievalConfig) -> Self {
        Self {
            snapshot,
            embedder,
            config: config.clone(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> &IndexSnapshot {
        &self.snapshot
    }

    /// Up to `k` diversified hits, unique by chunk id.
    ///
    /// A blank query or `k == 0` returns no hits without touching the embedder.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievalHit>> {
        if k == 0 || query.trim().is_empty() || self.snapshot.is_empty() {
            return Ok(Vec::new());
        }
        let pool = k * self.config.candidate_multiplier;

        let query_embedding = self.embedder.embed_query(query)?;
        let vector_hits: Vec<RetrievalHit> = self
            .snapshot
            .vectors()
            .search(&query_embedding, pool)?
            .into_iter()
            .filter_map(|m| self.hit(m.row, m.score, HitOrigin::Vector))
            .collect();

        let lexical_hits: Vec<RetrievalHit> = self
            .snapshot
            .lexical()
            .top(&tokenize(query), pool)
            .into_iter()
            .filter_map(|(row, score)| self.hit(row, score, HitOrigin::Lexical))
            .collect();

        debug!(
            vector = vector_hits.len(),
            lexical = lexical_hits.len(),
            "hybrid candidates"
        );
        let candidates = merge_candidates(vector_hits, lexical_hits);

        let lambda = self.config.mmr_lambda;
        let selected = match self.config.diversity {
            Diversity::Fuzzy => mmr(candidates, k, lambda, &FuzzySimilarity),
            Diversity::Cosine => mmr(
                candidates,
                k,
                lambda,
                &EmbeddingSimilarity::new(self.snapshot.vectors()),
            ),
        };
        debug!(query, hits = selected.len(), "hybrid search");
        Ok(selected)
    }

    fn hit(&self, row: usize, score: f32, origin: HitOrigin) -> Option<RetrievalHit> {
        self.snapshot.chunk(row).map(|chunk| RetrievalHit {
            chunk: Arc::clone(chunk),
            row,
            score,
            origin,
        })
    }
}

/// Deduplicate candidates by chunk id, keeping the higher raw score.
///
/// Order is first appearance, vector candidates before lexical ones. A chunk
/// found by both sources is marked [`HitOrigin::Merged`].
#[must_use]
pub fn merge_candidates(vector: Vec<RetrievalHit>, lexical: Vec<RetrievalHit>) -> Vec<RetrievalHit> {
    let mut merged: Vec<RetrievalHit> = Vec::with_capacity(vector.len() + lexical.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for hit in vector.into_iter().chain(lexical) {
        match positions.get(&hit.chunk.id) {
            Some(&pos) => {
                let existing = &mut merged[pos];
                if existing.origin != hit.origin {
                    existing.origin = HitOrigin::Merged;
                }
                existing.score = existing.score.max(hit.score);
            }
            None => {
                positions.insert(hit.chunk.id.clone(), merged.len());
                merged.push(hit);
            }
        }
    }
    merged
}

/// Greedy Maximal Marginal Relevance selection.
///
/// Each step picks the candidate maximizing
/// `lambda * score - (1 - lambda) * max_similarity_to_selected`; ties go to
/// the earlier candidate. Each remaining candidate keeps its running maximum,
/// so similarity is computed once per (candidate, selection) pair.
#[must_use]
pub fn mmr(
    candidates: Vec<RetrievalHit>,
    k: usize,
    lambda: f32,
    similarity: &dyn Similarity,
) -> Vec<RetrievalHit> {
    let mut remaining = candidates;
    let mut redundancy = vec![0.0_f32; remaining.len()];
    let mut selected: Vec<RetrievalHit> = Vec::with_capacity(k.min(remaining.len()));

    while selected.len() < k && !remaining.is_empty() {
        let mut best = 0;
        let mut best_gain = f32::NEG_INFINITY;
        for (i, candidate) in remaining.iter().enumerate() {
            let gain = lambda * candidate.score - (1.0 - lambda) * redundancy[i];
            if gain > best_gain {
                best = i;
                best_gain = gain;
            }
        }

        let picked = remaining.remove(best);
        redundancy.remove(best);
        if selected.len() + 1 < k {
            for (candidate, max_sim) in remaining.iter().zip(redundancy.iter_mut()) {
                *max_sim = max_sim.max(similarity.similarity(candidate, &picked));
            }
        }
        selected.push(picked);
    }
    selected
}

mod similarity;

pub use similarity::*;
