//! Request pipeline: validate, resolve voice, segment, synthesize, stitch.
//!
//! A request is atomic. It either yields one stitched waveform or fails with
//! no audio at all. Chunks are synthesized one at a time, in order, and the
//! engine is never used by two requests at once.

pub mod voice;

use crate::audio::{self, AudioSegment, SilenceSpec, StitchedAudio};
use crate::error::{PipelineError, Result, ValidationError};
use crate::text::{self, TextChunk};
use crate::tts::{self, SynthesisOptions, TtsBackend};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use voice::VoiceReference;

fn default_language() -> String {
    tts::DEFAULT_LANGUAGE.to_string()
}

fn default_exaggeration() -> f32 {
    0.5
}

fn default_cfg_weight() -> f32 {
    0.5
}

/// One synthesis request as received from a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Text to synthesize
    #[serde(default)]
    pub text: Option<String>,

    /// Language code (default "es")
    #[serde(default = "default_language")]
    pub language_id: String,

    /// Base64 encoded reference audio for voice cloning
    #[serde(default)]
    pub reference_audio: Option<String>,

    /// Emotion intensity (default 0.5)
    #[serde(default = "default_exaggeration")]
    pub exaggeration: f32,

    /// Pace/style adherence (default 0.5)
    #[serde(default = "default_cfg_weight")]
    pub cfg_weight: f32,
}

impl SynthesisRequest {
    /// Request for `text` with every other field at its default.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            language_id: default_language(),
            reference_audio: None,
            exaggeration: default_exaggeration(),
            cfg_weight: default_cfg_weight(),
        }
    }
}

/// Fixed per-process pipeline parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Maximum chunk size in characters
    pub max_chunk_length: usize,
    /// Gap inserted between chunks
    pub silence: SilenceSpec,
    /// Reference audio used when a request brings none
    pub default_voice_ref: Option<PathBuf>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_chunk_length: text::DEFAULT_MAX_LENGTH,
            silence: SilenceSpec::default(),
            default_voice_ref: None,
        }
    }
}

/// Result of a successful request.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOutcome {
    pub audio: StitchedAudio,
    pub chunks_processed: usize,
}

impl SynthesisOutcome {
    pub fn sample_rate(&self) -> u32 {
        self.audio.sample_rate
    }

    pub fn duration_seconds(&self) -> f64 {
        self.audio.total_duration_seconds
    }
}

/// Validated view of a request.
struct ValidRequest<'a> {
    text: &'a str,
    reference_audio: Option<Vec<u8>>,
}

fn validate(request: &SynthesisRequest) -> Result<ValidRequest<'_>> {
    let text = request
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ValidationError::MissingText)?;

    if !tts::is_supported_language(&request.language_id) {
        return Err(ValidationError::UnsupportedLanguage(request.language_id.clone()).into());
    }

    let reference_audio = match request.reference_audio.as_deref() {
        Some(encoded) if !encoded.trim().is_empty() => Some(
            BASE64
                .decode(encoded.trim())
                .map_err(|e| ValidationError::InvalidReferenceAudio(e.to_string()))?,
        ),
        _ => None,
    };

    Ok(ValidRequest {
        text,
        reference_audio,
    })
}

/// Drives one engine through whole requests.
pub struct Pipeline {
    engine: Arc<dyn TtsBackend>,
    /// Held for the whole synthesis phase of a request.
    engine_lock: Mutex<()>,
    settings: PipelineSettings,
}

impl Pipeline {
    /// Wrap a loaded engine. The engine is created once by the caller and
    /// reused for every request.
    pub fn new(engine: Arc<dyn TtsBackend>, settings: PipelineSettings) -> Self {
        Self {
            engine,
            engine_lock: Mutex::new(()),
            settings,
        }
    }

    /// Run one request to completion.
    ///
    /// Validation failures return before the engine is touched. The first
    /// engine failure aborts the request. A temporary reference file is
    /// removed on every exit path.
    pub async fn run(&self, request: &SynthesisRequest) -> Result<SynthesisOutcome> {
        let valid = validate(request)?;

        let voice = VoiceReference::resolve(
            valid.reference_audio.as_deref(),
            self.settings.default_voice_ref.as_deref(),
        )?;

        let options = SynthesisOptions::new()
            .with_language(request.language_id.as_str())
            .with_voice_ref(voice.path().map(|p| p.to_path_buf()))
            .with_exaggeration(request.exaggeration)
            .with_cfg_weight(request.cfg_weight);

        let outcome = self.synthesize_text(valid.text, &options).await;

        match (outcome, voice.release()) {
            (Ok(outcome), Ok(())) => Ok(outcome),
            (Ok(_), Err(cleanup)) => Err(cleanup),
            (Err(e), released) => {
                if let Err(cleanup) = released {
                    warn!("{}", cleanup);
                }
                Err(e)
            }
        }
    }

    async fn synthesize_text(
        &self,
        text: &str,
        options: &SynthesisOptions,
    ) -> Result<SynthesisOutcome> {
        let chunks = text::segment(text, self.settings.max_chunk_length)?;
        info!(
            "Synthesizing {} chunk(s) ({} chars, language {}) on {}",
            chunks.len(),
            text.chars().count(),
            options.language_id,
            self.engine.device()
        );

        let started = Instant::now();
        let segments = {
            let _engine = self.engine_lock.lock().await;
            self.synthesize_chunks(&chunks, options).await?
        };

        let audio = audio::stitch(segments, &self.settings.silence)?;
        info!(
            "Synthesized {:.2}s of audio from {} chunk(s) in {:.1}s",
            audio.total_duration_seconds,
            chunks.len(),
            started.elapsed().as_secs_f64()
        );

        Ok(SynthesisOutcome {
            audio,
            chunks_processed: chunks.len(),
        })
    }

    /// Synthesize chunks sequentially, stopping at the first failure.
    async fn synthesize_chunks(
        &self,
        chunks: &[TextChunk],
        options: &SynthesisOptions,
    ) -> Result<Vec<AudioSegment>> {
        let mut segments: Vec<AudioSegment> = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            debug!(
                "Chunk {}/{} ({} chars): {:?}",
                chunk.index + 1,
                chunks.len(),
                chunk.length,
                chunk.content
            );

            let waveform = self
                .engine
                .synthesize(&chunk.content, options)
                .await
                .map_err(|e| PipelineError::Synthesis {
                    chunk_index: chunk.index,
                    detail: format!("{:#}", e),
                })?;

            if waveform.sample_rate == 0 {
                return Err(PipelineError::Synthesis {
                    chunk_index: chunk.index,
                    detail: "engine reported a sample rate of 0 Hz".to_string(),
                });
            }

            // Reject a rate change now rather than after the remaining chunks
            if let Some(first) = segments.first() {
                if waveform.sample_rate != first.sample_rate {
                    return Err(PipelineError::RateMismatch {
                        index: chunk.index,
                        expected: first.sample_rate,
                        found: waveform.sample_rate,
                    });
                }
            }

            segments.push(AudioSegment::new(
                chunk.index,
                waveform.samples,
                waveform.sample_rate,
            ));
        }

        Ok(segments)
    }
}
