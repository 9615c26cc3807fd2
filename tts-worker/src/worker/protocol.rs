//! Protocol types for worker communication.
//!
//! Jobs are sent as JSON over stdin, results returned via stdout.

use crate::audio::wav::encode_wav;
use crate::pipeline::{SynthesisOutcome, SynthesisRequest};
use anyhow::Result;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A TTS job to be executed by the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisJob {
    /// Job identifier assigned by the queue, used only for logging.
    #[serde(default)]
    pub id: Option<String>,
    /// The synthesis request.
    pub input: SynthesisRequest,
}

/// Result of a job: either the audio and its metadata, or just an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobOutput {
    Success {
        /// Base64 encoded WAV
        audio_base64: String,
        sample_rate: u32,
        /// Rounded to 2 decimals
        duration_seconds: f64,
        chunks_processed: usize,
    },
    Failure {
        error: String,
    },
}

impl JobOutput {
    /// Encode a finished outcome.
    pub fn success(outcome: &SynthesisOutcome) -> Result<Self> {
        let wav = encode_wav(&outcome.audio)?;
        Ok(Self::Success {
            audio_base64: BASE64.encode(wav),
            sample_rate: outcome.sample_rate(),
            duration_seconds: round_to_hundredths(outcome.duration_seconds()),
            chunks_processed: outcome.chunks_processed,
        })
    }

    /// Create a failed result.
    pub fn failure(error: impl Display) -> Self {
        Self::Failure {
            error: error.to_string(),
        }
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
