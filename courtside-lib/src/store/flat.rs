use serde::{Deserialize, Serialize};

use crate::embed::{dot, normalize_l2, Embedding};
use crate::store::{VectorMatch, VectorStore};
use crate::{Error, Result};

/// Exact inner-product index over a contiguous row-major matrix.
///
/// Uses brute-force search, which is exact and fast enough for a coaching
/// corpus of a few thousand chunks. Rows are L2-normalized on insertion so
/// scores are cosine similarities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    dim: usize,
    ids: Vec<String>,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create a new empty index. The dimension is fixed by the first row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Vector dimension, 0 while empty
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Chunk ids in row order
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Encode the index for the vector artifact.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Store(format!("encode vector index: {e}")))
    }

    /// Decode an index written by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let index: Self = bincode::deserialize(bytes)
            .map_err(|e| Error::Store(format!("decode vector index: {e}")))?;
        if index.data.len() != index.ids.len() * index.dim {
            return Err(Error::Store(format!(
                "vector index holds {} values for {} rows of dimension {}",
                index.data.len(),
                index.ids.len(),
                index.dim
            )));
        }
        Ok(index)
    }
}

impl VectorStore for FlatIndex {
    fn add(&mut self, ids: &[String], embeddings: &[Embedding]) -> Result<()> {
        if ids.len() != embeddings.len() {
            return Err(Error::InvalidInput(format!(
                "{} ids for {} embeddings",
                ids.len(),
                embeddings.len()
            )));
        }
        let dim = match self.dim {
            0 => embeddings.first().map_or(0, Vec::len),
            dim => dim,
        };
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dim || e.is_empty()) {
            return Err(Error::InvalidInput(format!(
                "embedding has dimension {}, index expects {dim}",
                bad.len()
            )));
        }

        self.dim = dim;
        self.data.reserve(embeddings.len() * dim);
        for (id, embedding) in ids.iter().zip(embeddings) {
            let start = self.data.len();
            self.data.extend_from_slice(embedding);
            normalize_l2(&mut self.data[start..]);
            self.ids.push(id.clone());
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<VectorMatch>> {
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dim {
            return Err(Error::InvalidInput(format!(
                "query has dimension {}, index expects {}",
                query.len(),
                self.dim
            )));
        }

        let mut query = query.to_vec();
        normalize_l2(&mut query);

        let mut matches: Vec<VectorMatch> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(row, vector)| VectorMatch {
                row,
                score: dot(&query, vector),
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.row.cmp(&b.row)));
        matches.truncate(k);
        Ok(matches)
    }

    fn id(&self, row: usize) -> Option<&str> {
        self.ids.get(row).map(String::as_str)
    }

    fn row(&self, row: usize) -> Option<&[f32]> {
        if row >= self.ids.len() {
            return None;
        }
        Some(&self.data[row * self.dim..(row + 1) * self.dim])
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}
