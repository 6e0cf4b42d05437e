use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::embed::{normalize_l2, Embedder, Embedding};
use crate::{Error, Result};

/// Sentence embedder using sentence-transformers/all-MiniLM-L6-v2.
///
/// Uses fastembed for ONNX-based inference. This model produces 384-dimensional
/// embeddings and supports up to 256 tokens per input. The session sits behind
/// a mutex so the embedder can be shared between query threads.
pub struct MiniLmEmbedder {
    model: Mutex<TextEmbedding>,
}

impl MiniLmEmbedder {
    /// Create a new MiniLM embedder.
    ///
    /// Downloads the model on first use (~90MB).
    pub fn new() -> Result<Self> {
        let opts = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(true);

        TextEmbedding::try_new(opts)
            .map(|model| Self {
                model: Mutex::new(model),
            })
            .map_err(|e| Error::Embedding(e.to_string()))
    }

    fn embed(&self, texts: Vec<&str>) -> Result<Vec<Embedding>> {
        let expected = texts.len();
        let mut model = self
            .model
            .lock()
            .map_err(|_| Error::Embedding("embedding model lock poisoned".to_string()))?;
        let mut embeddings = model
            .embed(texts, None)
            .map_err(|e| Error::Embedding(e.to_string()))?;

        if embeddings.len() != expected {
            return Err(Error::Embedding(format!(
                "model returned {} embeddings for {expected} inputs",
                embeddings.len()
            )));
        }
        for embedding in &mut embeddings {
            normalize_l2(embedding);
        }
        Ok(embeddings)
    }
}

impl Embedder for MiniLmEmbedder {
    fn model_name(&self) -> &str {
        "sentence-transformers/all-MiniLM-L6-v2"
    }

    fn dimension(&self) -> usize {
        384
    }

    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed(texts.to_vec())
    }

    fn embed_query(&self, text: &str) -> Result<Embedding> {
        self.embed(vec![text])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("model returned no embeddings".to_string()))
    }
}
