//! Text embedding
//!
//! An [`Embedder`] maps text to dense vectors. Every vector handed to the
//! index is L2-normalized (see [`normalize_l2`]) so that inner product equals
//! cosine similarity.
//!
//! # Usage
//!
//! ```ignore
//! use courtside_lib::embed::{Embedder, HashingEmbedder};
//!
//! let embedder = HashingEmbedder::default();
//!
//! // Embed documents (for indexing)
//! let doc_embeddings = embedder.embed_documents(&["Entry angle...", "Follow-through..."])?;
//!
//! // Embed query (for searching)
//! let query_embedding = embedder.embed_query("How do I improve my shot angle?")?;
//! ```

use crate::Result;

/// A vector embedding - fixed size array of floats
pub type Embedding = Vec<f32>;

/// Trait for text embedding models
///
/// Methods take `&self` so one embedder can serve concurrent queries.
pub trait Embedder: Send + Sync {
    /// Embed multiple documents for indexing
    ///
    /// Returns one row per input, in input order.
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Embed a single query for searching
    fn embed_query(&self, text: &str) -> Result<Embedding>;

    /// Returns the embedding dimension
    fn dimension(&self) -> usize;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn normalize_l2(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Inner product of two equal-length vectors.
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

mod hashing;
#[cfg(feature = "fastembed")]
mod minilm;

pub use hashing::*;
#[cfg(feature = "fastembed")]
pub use minilm::*;
