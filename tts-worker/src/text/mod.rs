//! Text processing for TTS: splitting arbitrary input into engine-sized chunks.

pub mod chunker;

pub use chunker::{segment, DEFAULT_MAX_LENGTH};

/// A chunk of text ready for TTS processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position of this chunk in synthesis (and stitch) order
    pub index: usize,
    /// Trimmed, non-empty text content
    pub content: String,
    /// Length of `content` in characters
    pub length: usize,
}

impl TextChunk {
    /// Create a new text chunk.
    pub fn new(index: usize, content: String) -> Self {
        let length = content.chars().count();
        Self {
            index,
            content,
            length,
        }
    }
}
