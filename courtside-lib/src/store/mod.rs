//! Vector storage
//!
//! Append-only nearest-neighbour structures over normalized embeddings.
//! Rows keep the order they were added in, and every row carries the id of
//! the chunk it embeds, so row `i` can always be checked against chunk `i`.
//!
//! # Usage
//!
//! ```ignore
//! use courtside_lib::store::{VectorStore, FlatIndex};
//!
//! let mut index = FlatIndex::new();
//!
//! // Append chunk ids with their embeddings
//! index.add(&ids, &embeddings)?;
//!
//! // Search by inner product
//! let matches = index.search(&query_embedding, 5)?;
//! ```

use crate::embed::Embedding;
use crate::Result;

/// A vector search match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorMatch {
    /// Row position in the index
    pub row: usize,
    /// Inner product with the query; -1.0 to 1.0 for normalized vectors
    pub score: f32,
}

/// Trait for vector storage backends
pub trait VectorStore: Send + Sync {
    /// Append rows in argument order
    ///
    /// # Arguments
    /// * `ids` - Chunk ids, one per row
    /// * `embeddings` - Corresponding embeddings (must be same length)
    fn add(&mut self, ids: &[String], embeddings: &[Embedding]) -> Result<()>;

    /// Search for the rows most similar to the query
    ///
    /// # Returns
    /// Up to `k` matches sorted by similarity (highest first). Asking for
    /// more rows than are stored is not an error.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<VectorMatch>>;

    /// Chunk id stored at a row
    fn id(&self, row: usize) -> Option<&str>;

    /// Stored (normalized) vector at a row
    fn row(&self, row: usize) -> Option<&[f32]>;

    /// Get total number of stored rows
    fn len(&self) -> usize;

    /// Check if store is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

mod flat;

pub use flat::*;
