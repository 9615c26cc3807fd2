//! TTS backend trait and types.

#[cfg(feature = "chatterbox")]
pub mod chatterbox;
#[cfg(test)]
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Language codes the multilingual model accepts.
pub const SUPPORTED_LANGUAGES: [&str; 23] = [
    "ar", "da", "de", "el", "en", "es", "fi", "fr", "he", "hi", "it", "ja", "ko", "ms", "nl",
    "no", "pl", "pt", "ru", "sv", "sw", "tr", "zh",
];

/// Language used when a request does not name one.
pub const DEFAULT_LANGUAGE: &str = "es";

/// Check whether `language_id` is one of [`SUPPORTED_LANGUAGES`].
pub fn is_supported_language(language_id: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&language_id)
}

/// Options for one synthesis call.
///
/// `exaggeration` and `cfg_weight` are passed to the engine as given.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOptions {
    /// Language code, one of [`SUPPORTED_LANGUAGES`]
    pub language_id: String,
    /// Path to voice reference audio for cloning
    pub voice_ref: Option<PathBuf>,
    /// Expressiveness/exaggeration (default 0.5)
    pub exaggeration: f32,
    /// Pacing/CFG weight (default 0.5)
    pub cfg_weight: f32,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            language_id: DEFAULT_LANGUAGE.to_string(),
            voice_ref: None,
            exaggeration: 0.5,
            cfg_weight: 0.5,
        }
    }
}

impl SynthesisOptions {
    /// Create new options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the language code.
    pub fn with_language(mut self, language_id: impl Into<String>) -> Self {
        self.language_id = language_id.into();
        self
    }

    /// Set the voice reference path.
    pub fn with_voice_ref(mut self, path: Option<PathBuf>) -> Self {
        self.voice_ref = path;
        self
    }

    /// Set the exaggeration level.
    pub fn with_exaggeration(mut self, exaggeration: f32) -> Self {
        self.exaggeration = exaggeration;
        self
    }

    /// Set the CFG/pacing weight.
    pub fn with_cfg_weight(mut self, cfg_weight: f32) -> Self {
        self.cfg_weight = cfg_weight;
        self
    }
}

/// Mono waveform returned by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// TTS backend trait - all TTS engines implement this.
///
/// Implementations are not required to be reentrant; callers serialize use.
/// Every call within one request must report the same sample rate.
#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// Synthesize one chunk of text.
    async fn synthesize(&self, text: &str, options: &SynthesisOptions) -> Result<Waveform>;

    /// Device being used (cuda, mps, cpu).
    fn device(&self) -> &str;
}

/// Create a TTS backend.
///
/// # Arguments
/// * `device` - Device to use: "cuda", "mps", "cpu", or None for auto-detect
#[cfg(feature = "chatterbox")]
pub fn create_backend(device: Option<&str>) -> Result<Box<dyn TtsBackend>> {
    Ok(Box::new(chatterbox::ChatterboxBackend::new(device)?))
}

/// Create a TTS backend.
#[cfg(not(feature = "chatterbox"))]
pub fn create_backend(_device: Option<&str>) -> Result<Box<dyn TtsBackend>> {
    anyhow::bail!(
        "No TTS engine available: tts-worker was built without the `chatterbox` feature. \
         Rebuild with `--features chatterbox`."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_options_default() {
        let opts = SynthesisOptions::default();
        assert_eq!(opts.language_id, "es");
        assert_eq!(opts.exaggeration, 0.5);
        assert_eq!(opts.cfg_weight, 0.5);
        assert!(opts.voice_ref.is_none());
    }

    #[test]
    fn test_synthesis_options_builder_passes_values_through() {
        let opts = SynthesisOptions::new()
            .with_language("fr")
            .with_exaggeration(3.5)
            .with_cfg_weight(-0.2)
            .with_voice_ref(Some(PathBuf::from("/voices/ref.wav")));

        assert_eq!(opts.language_id, "fr");
        assert_eq!(opts.exaggeration, 3.5);
        assert_eq!(opts.cfg_weight, -0.2);
        assert_eq!(opts.voice_ref, Some(PathBuf::from("/voices/ref.wav")));
    }

    #[test]
    fn test_supported_languages() {
        assert_eq!(SUPPORTED_LANGUAGES.len(), 23);
        assert!(is_supported_language("es"));
        assert!(is_supported_language("zh"));
        assert!(!is_supported_language("xx"));
        assert!(!is_supported_language("ES"));
        assert!(!is_supported_language(""));
    }

    #[cfg(not(feature = "chatterbox"))]
    #[test]
    fn test_create_backend_without_engine() {
        let err = create_backend(None).err().expect("no engine compiled in");
        assert!(err.to_string().contains("chatterbox"));
    }
}
