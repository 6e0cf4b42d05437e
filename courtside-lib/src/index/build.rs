use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::chunk::{Chunk, ChunkMetadata, Chunker, SlidingWindowChunker};
use crate::config::{CategoryConfig, Config};
use crate::embed::Embedder;
use crate::index::IndexSnapshot;
use crate::reader::{categorize, ReaderSet};
use crate::store::{FlatIndex, VectorStore};
use crate::{Error, Result};

/// Turns a corpus directory into an [`IndexSnapshot`].
///
/// Only regular files at the top level of the corpus directory are read, in
/// sorted filename order so repeated builds produce the same row order.
pub struct IndexBuilder<'a> {
    corpus_dir: PathBuf,
    readers: &'a ReaderSet,
    chunker: SlidingWindowChunker,
    embedder: &'a dyn Embedder,
    categories: CategoryConfig,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(config: &Config, readers: &'a ReaderSet, embedder: &'a dyn Embedder) -> Result<Self> {
        Ok(Self {
            corpus_dir: config.corpus_dir.clone(),
            readers,
            chunker: SlidingWindowChunker::from_config(&config.chunking)?,
            embedder,
            categories: config.categories.clone(),
        })
    }

    #[must_use]
    pub fn corpus_dir(&self) -> &Path {
        &self.corpus_dir
    }

    /// Read, chunk and embed the whole corpus.
    ///
    /// Fails with [`Error::EmptyCorpus`] when no file yields a chunk.
    pub fn build(&self) -> Result<IndexSnapshot> {
        let chunks = self.collect_chunks()?;
        if chunks.is_empty() {
            return Err(Error::EmptyCorpus(self.corpus_dir.clone()));
        }

        info!(
            chunks = chunks.len(),
            model = self.embedder.model_name(),
            "embedding chunks"
        );
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_documents(&texts)?;
        if embeddings.len() != chunks.len() {
            return Err(Error::Embedding(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let ids: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();
        let mut vectors = FlatIndex::new();
        vectors.add(&ids, &embeddings)?;

        IndexSnapshot::new(chunks, vectors)
    }

    /// Top-level files of the corpus directory, sorted by name.
    fn corpus_files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.corpus_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        Ok(files)
    }

    fn collect_chunks(&self) -> Result<Vec<Chunk>> {
        let files = self.corpus_files()?;
        info!(
            corpus = %self.corpus_dir.display(),
            files = files.len(),
            "scanning corpus"
        );

        let mut chunks = Vec::new();
        for path in &files {
            if !self.readers.supports(path) {
                warn!(path = %path.display(), "unsupported file type, skipping");
                continue;
            }

            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let category = categorize(&filename, &self.categories);

            let before = chunks.len();
            for item in self.readers.extract(path) {
                let metadata = ChunkMetadata {
                    filename: filename.clone(),
                    category: category.clone(),
                    section: item.section,
                    page: item.page,
                    position: 0,
                };
                chunks.extend(self.chunker.chunk(&item.text, metadata));
            }
            debug!(file = %filename, chunks = chunks.len() - before, "chunked file");
        }

        Ok(chunks)
    }
}
