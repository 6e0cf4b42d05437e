//! Document chunking
//!
//! Source documents are normalized (whitespace runs collapsed) and cut into
//! overlapping fixed-size windows. Each window becomes a [`Chunk`], the unit
//! of retrieval shared by the vector and lexical indexes.
//!
//! # Implementing a Chunker
//!
//! ```ignore
//! use courtside_lib::chunk::{Chunker, Chunk, ChunkMetadata};
//!
//! struct MyChunker { /* ... */ }
//!
//! impl Chunker for MyChunker {
//!     fn chunk(&self, content: &str, metadata: ChunkMetadata) -> Vec<Chunk> {
//!         // Your chunking logic here
//!         todo!()
//!     }
//!
//!     fn name(&self) -> &str {
//!         "mine"
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};

/// A chunk of text with its metadata
///
/// Serialized as `{id, text, meta}`, the record shape of the persisted
/// metadata and lexical artifacts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Globally unique identifier for this chunk
    pub id: String,
    /// Normalized text content, never empty
    pub text: String,
    /// Metadata about the source and position
    #[serde(rename = "meta")]
    pub metadata: ChunkMetadata,
}

/// Metadata associated with a chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// Source file name
    #[serde(default)]
    pub filename: String,
    /// Category tag derived from the file name (e.g. "basketball")
    #[serde(default)]
    pub category: String,
    /// Section heading for structured documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// 1-based page number for paginated documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Character offset of the chunk within its normalized source text
    #[serde(default)]
    pub position: usize,
}

/// Trait for document chunking strategies
pub trait Chunker: Send + Sync {
    /// Split content into chunks
    ///
    /// # Arguments
    /// * `content` - The text content to chunk
    /// * `metadata` - Base metadata to attach to each chunk
    ///
    /// # Returns
    /// A vector of chunks, each with a unique ID and position metadata
    fn chunk(&self, content: &str, metadata: ChunkMetadata) -> Vec<Chunk>;

    /// Returns the name of this chunking strategy
    fn name(&self) -> &str;
}

/// Collapse every whitespace run to a single space and trim the ends.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

mod window;

pub use window::*;
