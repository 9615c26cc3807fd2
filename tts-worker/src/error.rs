//! Error taxonomy for the synthesis pipeline.

use thiserror::Error;

/// Request fields that failed validation before any engine work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing text")]
    MissingText,

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("invalid reference audio: {0}")]
    InvalidReferenceAudio(String),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Synthesis failed on chunk {chunk_index}: {detail}")]
    Synthesis { chunk_index: usize, detail: String },

    #[error(
        "Sample rate mismatch at segment {index}: expected {expected} Hz, found {found} Hz"
    )]
    RateMismatch {
        index: usize,
        expected: u32,
        found: u32,
    },

    #[error("No audio segments to stitch")]
    EmptyInput,

    #[error("Reference audio resource error: {0}")]
    Resource(String),
}

/// Discriminant of [`PipelineError`], for callers that branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    InvalidInput,
    Synthesis,
    RateMismatch,
    EmptyInput,
    Resource,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Synthesis { .. } => ErrorKind::Synthesis,
            Self::RateMismatch { .. } => ErrorKind::RateMismatch,
            Self::EmptyInput => ErrorKind::EmptyInput,
            Self::Resource(_) => ErrorKind::Resource,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
