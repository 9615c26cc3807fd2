//! Text chunking for TTS processing.
//!
//! Text longer than the chunk limit is broken at sentence boundaries first,
//! then at commas inside over-long sentences, and only as a last resort sliced
//! at fixed character widths. Chunks keep the source order and never lose a
//! non-whitespace character; only the whitespace at the joins is normalized.

use super::TextChunk;
use crate::error::{PipelineError, Result};

/// Default maximum chunk size in characters.
pub const DEFAULT_MAX_LENGTH: usize = 250;

/// Marks that end a sentence when followed by whitespace.
const SENTENCE_TERMINALS: &[char] = &['.', '!', '?', '¿', '¡'];

/// Mark that ends a clause, with or without trailing whitespace.
const CLAUSE_TERMINAL: char = ',';

/// Kind of boundary a scan splits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Sentence,
    Clause,
}

impl Boundary {
    fn is_mark(self, c: char) -> bool {
        match self {
            Boundary::Sentence => SENTENCE_TERMINALS.contains(&c),
            Boundary::Clause => c == CLAUSE_TERMINAL,
        }
    }

    /// Sentence marks only split when whitespace follows ("3.14" stays whole).
    fn requires_whitespace(self) -> bool {
        matches!(self, Boundary::Sentence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Inside a unit, accumulating characters.
    InUnit,
    /// Just closed a unit, consuming the separating whitespace.
    AtBoundary,
}

/// Scan `text` into trimmed, non-empty units.
///
/// The boundary mark stays at the end of the unit it closes; whitespace right
/// after it is consumed as the separator.
fn scan_units(text: &str, boundary: Boundary) -> Vec<&str> {
    let mut units = Vec::new();
    let mut state = ScanState::InUnit;
    let mut start = 0;
    // Byte offset just past a boundary mark, set while that mark is the previous char.
    let mut mark_end: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if state == ScanState::AtBoundary {
            if c.is_whitespace() {
                continue;
            }
            start = i;
            state = ScanState::InUnit;
        }

        if let Some(end) = mark_end.take() {
            if c.is_whitespace() {
                units.push(&text[start..end]);
                state = ScanState::AtBoundary;
                continue;
            }
            if !boundary.requires_whitespace() {
                units.push(&text[start..end]);
                start = i;
            }
        }

        if boundary.is_mark(c) {
            mark_end = Some(i + c.len_utf8());
        }
    }

    if state == ScanState::InUnit {
        units.push(&text[start..]);
    }

    units
        .into_iter()
        .map(str::trim)
        .filter(|unit| !unit.is_empty())
        .collect()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Greedy chunk builder: pieces join the open chunk while they fit.
struct ChunkAccumulator {
    max_length: usize,
    chunks: Vec<String>,
    current: String,
    current_len: usize,
}

impl ChunkAccumulator {
    fn new(max_length: usize) -> Self {
        Self {
            max_length,
            chunks: Vec::new(),
            current: String::new(),
            current_len: 0,
        }
    }

    /// Append a piece of at most `max_length` characters.
    ///
    /// The piece joins the open chunk only if the chunk, one separating space
    /// and the piece all fit; otherwise the open chunk is flushed.
    fn push(&mut self, piece: &str) {
        let piece_len = char_len(piece);

        if self.current_len + 1 + piece_len <= self.max_length {
            if !self.current.is_empty() {
                self.current.push(' ');
                self.current_len += 1;
            }
            self.current.push_str(piece);
            self.current_len += piece_len;
        } else {
            self.flush();
            self.current.push_str(piece);
            self.current_len = piece_len;
        }
    }

    /// Emit an atomic piece longer than `max_length` as fixed-width slices.
    fn push_sliced(&mut self, piece: &str) {
        self.flush();
        for slice in hard_split(piece, self.max_length) {
            let slice = slice.trim();
            if !slice.is_empty() {
                self.chunks.push(slice.to_string());
            }
        }
    }

    fn flush(&mut self) {
        let trimmed = self.current.trim();
        if !trimmed.is_empty() {
            self.chunks.push(trimmed.to_string());
        }
        self.current.clear();
        self.current_len = 0;
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}

/// Split text into consecutive windows of `max_length` characters.
fn hard_split(text: &str, max_length: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_length)
        .map(|window| window.iter().collect())
        .collect()
}

/// Split text into TTS-friendly chunks of at most `max_length` characters.
///
/// # Arguments
/// * `text` - The text to chunk
/// * `max_length` - Maximum chunk size in characters (default: 250)
///
/// # Errors
/// `InvalidInput` if the text is blank or `max_length` is zero.
pub fn split_text(text: &str, max_length: usize) -> Result<Vec<String>> {
    if max_length == 0 {
        return Err(PipelineError::InvalidInput(
            "max_length must be positive".to_string(),
        ));
    }

    let text = text.trim();
    if text.is_empty() {
        return Err(PipelineError::InvalidInput("text is empty".to_string()));
    }

    if char_len(text) <= max_length {
        return Ok(vec![text.to_string()]);
    }

    let mut chunks = ChunkAccumulator::new(max_length);

    for sentence in scan_units(text, Boundary::Sentence) {
        if char_len(sentence) <= max_length {
            chunks.push(sentence);
            continue;
        }

        // Over-long sentence: fall back to clause boundaries, then slicing
        chunks.flush();
        for clause in scan_units(sentence, Boundary::Clause) {
            if char_len(clause) > max_length {
                chunks.push_sliced(clause);
            } else {
                chunks.push(clause);
            }
        }
    }

    Ok(chunks.finish())
}

/// Split text into indexed [`TextChunk`]s.
pub fn segment(text: &str, max_length: usize) -> Result<Vec<TextChunk>> {
    let chunks = split_text(text, max_length)?
        .into_iter()
        .enumerate()
        .map(|(index, content)| TextChunk::new(index, content))
        .collect();
    Ok(chunks)
}
