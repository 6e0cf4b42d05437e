//! Courtside - hybrid retrieval and agentic answers over a coaching corpus
//!
//! # Architecture
//!
//! ```text
//! corpus dir -> Readers -> Chunker -> Embedder -> FlatIndex --+
//!                                 \-> Bm25Index -------------+-> IndexSnapshot
//!                                                                     |
//! question -> Planner -> HybridRetriever (vector + BM25, MMR) <-------+
//!                              |
//!                      keyword bonus rerank -> Synthesizer -> Reflector
//!                                                   ^             |
//!                                                   +-- refine ---+  (once)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use courtside_lib::{
//!     agent::AgentLoop,
//!     config::Config,
//!     embed::HashingEmbedder,
//!     index::{IndexBuilder, IndexStore, SnapshotHandle},
//!     reader::ReaderSet,
//! };
//!
//! let config = Config::load(None)?;
//! let embedder = Arc::new(HashingEmbedder::default());
//! let readers = ReaderSet::standard();
//!
//! // Load the persisted index, or build it from the corpus
//! let builder = IndexBuilder::new(&config, &readers, embedder.as_ref())?;
//! let handle = Arc::new(SnapshotHandle::new());
//! handle.init(&IndexStore::new(&config.index_dir), &builder)?;
//!
//! // Ask
//! let agent = AgentLoop::new(handle, embedder, &config);
//! println!("{}", agent.answer("How do I get more arc on my jump shot?")?);
//! ```

pub mod agent;
pub mod chunk;
pub mod config;
pub mod embed;
pub mod error;
pub mod index;
pub mod lexical;
pub mod reader;
pub mod rerank;
pub mod search;
pub mod session;
pub mod store;

pub use error::{Error, Result};
