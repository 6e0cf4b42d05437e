//! Index snapshots and their lifecycle
//!
//! An [`IndexSnapshot`] bundles the chunk list with the vector and lexical
//! indexes built over it. Row `i` means the same chunk in all three; every
//! row carries its chunk id and a snapshot refuses to exist if the ids
//! disagree.
//!
//! # Lifecycle
//!
//! ```text
//! corpus dir --IndexBuilder--> IndexSnapshot --IndexStore::save--> index dir
//!                                   ^                                  |
//!                                   +--------IndexStore::load----------+
//!
//! SnapshotHandle: init (load or build) -> rebuild (swap) -> teardown
//! ```

use std::sync::Arc;

use crate::chunk::Chunk;
use crate::lexical::Bm25Index;
use crate::store::{FlatIndex, VectorStore};
use crate::{Error, Result};

/// Immutable, co-indexed view of the corpus.
#[derive(Debug)]
pub struct IndexSnapshot {
    chunks: Vec<Arc<Chunk>>,
    vectors: FlatIndex,
    lexical: Bm25Index,
}

impl IndexSnapshot {
    /// Build the lexical index over `chunks` and pair it with `vectors`.
    pub fn new(chunks: Vec<Chunk>, vectors: FlatIndex) -> Result<Self> {
        let lexical = Bm25Index::build(chunks.iter().map(|c| (c.id.as_str(), c.text.as_str())));
        Self::from_parts(chunks, vectors, lexical)
    }

    /// Assemble a snapshot, checking that all three structures agree row by row.
    pub fn from_parts(chunks: Vec<Chunk>, vectors: FlatIndex, lexical: Bm25Index) -> Result<Self> {
        if vectors.len() != chunks.len() || lexical.len() != chunks.len() {
            return Err(Error::Store(format!(
                "row count mismatch: {} chunks, {} vector rows, {} lexical rows",
                chunks.len(),
                vectors.len(),
                lexical.len()
            )));
        }

        for (row, chunk) in chunks.iter().enumerate() {
            let vector_id = vectors.id(row);
            let lexical_id = lexical.id(row);
            if vector_id != Some(chunk.id.as_str()) || lexical_id != Some(chunk.id.as_str()) {
                return Err(Error::Store(format!(
                    "row {row} identity mismatch: chunk {}, vector {:?}, lexical {:?}",
                    chunk.id, vector_id, lexical_id
                )));
            }
        }

        Ok(Self {
            chunks: chunks.into_iter().map(Arc::new).collect(),
            vectors,
            lexical,
        })
    }

    #[must_use]
    pub fn chunks(&self) -> &[Arc<Chunk>] {
        &self.chunks
    }

    #[must_use]
    pub fn chunk(&self, row: usize) -> Option<&Arc<Chunk>> {
        self.chunks.get(row)
    }

    #[must_use]
    pub fn vectors(&self) -> &FlatIndex {
        &self.vectors
    }

    #[must_use]
    pub fn lexical(&self) -> &Bm25Index {
        &self.lexical
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

mod build;
mod handle;
mod persist;

pub use build::*;
pub use handle::*;
pub use persist::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkMetadata;

    fn make_chunk(id: &str, text: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: text.to_string(),
            metadata: ChunkMetadata::default(),
        }
    }

    fn vectors(ids: &[&str]) -> FlatIndex {
        let mut index = FlatIndex::new();
        let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        let embeddings: Vec<Vec<f32>> = (0..ids.len()).map(|i| vec![1.0, i as f32]).collect();
        index.add(&ids, &embeddings).unwrap();
        index
    }

    #[test]
    fn test_new_builds_lexical_rows() {
        let chunks = vec![make_chunk("a", "entry angle"), make_chunk("b", "follow through")];
        let snapshot = IndexSnapshot::new(chunks, vectors(&["a", "b"])).unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.lexical().id(1), Some("b"));
        assert_eq!(snapshot.chunk(0).unwrap().text, "entry angle");
    }

    #[test]
    fn test_row_count_mismatch() {
        let chunks = vec![make_chunk("a", "entry angle"), make_chunk("b", "follow through")];
        let result = IndexSnapshot::new(chunks, vectors(&["a"]));
        assert!(matches!(result, Err(Error::Store(_))));
    }

    #[test]
    fn test_row_identity_mismatch() {
        let chunks = vec![make_chunk("a", "entry angle"), make_chunk("b", "follow through")];
        let result = IndexSnapshot::new(chunks, vectors(&["b", "a"]));
        assert!(matches!(result, Err(Error::Store(_))));
    }
}
