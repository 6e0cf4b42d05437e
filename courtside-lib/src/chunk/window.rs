use uuid::Uuid;

use crate::chunk::{normalize, Chunk, ChunkMetadata, Chunker};
use crate::config::ChunkingConfig;
use crate::{Error, Result};

/// Sliding window chunker - fixed-size character windows with overlap
///
/// Each window starts `size - overlap` characters after the previous one.
/// The sequence stops as soon as a window reaches the end of the text, so
/// the final chunk may be shorter than `size`.
#[derive(Debug, Clone, Copy)]
pub struct SlidingWindowChunker {
    size: usize,
    overlap: usize,
}

impl SlidingWindowChunker {
    /// Create a chunker, rejecting parameters that would never advance.
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::Config("chunk size must be positive".into()));
        }
        if overlap >= size {
            return Err(Error::Config(format!(
                "chunk overlap ({overlap}) must be smaller than chunk size ({size})"
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.size, config.overlap)
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Iterate over the windows of already-normalized text.
    ///
    /// The iterator is `Clone`, so a sequence can be restarted from any point.
    #[must_use]
    pub fn windows<'a>(&self, text: &'a str) -> Windows<'a> {
        Windows {
            text,
            size: self.size,
            stride: self.size - self.overlap,
            start: 0,
            offset: 0,
            done: text.is_empty(),
        }
    }
}

impl Chunker for SlidingWindowChunker {
    fn name(&self) -> &str {
        "sliding-window"
    }

    fn chunk(&self, content: &str, metadata: ChunkMetadata) -> Vec<Chunk> {
        let text = normalize(content);

        self.windows(&text)
            .map(|window| {
                let mut m = metadata.clone();
                m.position = window.offset;

                Chunk {
                    id: Uuid::new_v4().to_string(),
                    text: window.text.to_string(),
                    metadata: m,
                }
            })
            .collect()
    }
}

/// A single window: its character offset and text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window<'a> {
    pub offset: usize,
    pub text: &'a str,
}

/// Iterator over the windows of a text, see [`SlidingWindowChunker::windows`].
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    text: &'a str,
    size: usize,
    stride: usize,
    // byte index of the next window start
    start: usize,
    // character index of the next window start
    offset: usize,
    done: bool,
}

impl<'a> Iterator for Windows<'a> {
    type Item = Window<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let rest = &self.text[self.start..];
        let end = byte_after_chars(rest, self.size);
        let window = Window {
            offset: self.offset,
            text: &rest[..end],
        };

        if end == rest.len() {
            self.done = true;
        } else {
            self.start += byte_after_chars(rest, self.stride);
            self.offset += self.stride;
        }

        Some(window)
    }
}

/// Byte index just past the first `n` characters of `s` (or `s.len()`).
fn byte_after_chars(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(i, _)| i)
}
