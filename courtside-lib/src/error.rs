//! Error types for Courtside

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Courtside operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Courtside operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid chunking, retrieval or agent settings
    #[error("configuration error: {0}")]
    Config(String),

    /// The corpus produced zero chunks
    #[error("empty corpus: no chunks were created from {}", .0.display())]
    EmptyCorpus(PathBuf),

    /// A query was issued with no usable index snapshot
    #[error("index unavailable: {0}")]
    IndexUnavailable(String),

    /// Failed to load or run the embedding model
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Failed to extract text from a source document
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Failed to persist or reload index artifacts
    #[error("store error: {0}")]
    Store(String),

    /// Invalid input provided
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
