//! Chatterbox multilingual TTS backend using PyO3 to embed Python.
//!
//! The model is loaded once when the backend is created and reused for every
//! call. It supports voice cloning from reference audio and GPU acceleration.

use super::{SynthesisOptions, TtsBackend, Waveform};
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::sync::{Arc, Once};

/// Initialize Python runtime once.
static PYTHON_INIT: Once = Once::new();

/// Loaded model plus the device it lives on.
struct ModelHandle {
    device: String,
    model: Py<PyAny>,
}

/// Chatterbox multilingual TTS backend using PyO3.
pub struct ChatterboxBackend {
    handle: Arc<ModelHandle>,
}

impl ChatterboxBackend {
    /// Load the multilingual model.
    ///
    /// # Arguments
    /// * `device` - Device to use: "cuda", "mps", "cpu", or None for auto-detect
    pub fn new(device: Option<&str>) -> Result<Self> {
        PYTHON_INIT.call_once(pyo3::prepare_freethreaded_python);

        let device = match device {
            Some(d) => d.to_string(),
            None => Self::detect_device()?,
        };

        info!("Loading Chatterbox multilingual model on {}", device);
        let model = Self::load_model(&device)?;
        info!("Model loaded on {}", device);

        Ok(Self {
            handle: Arc::new(ModelHandle { device, model }),
        })
    }

    /// Auto-detect the best available device.
    fn detect_device() -> Result<String> {
        Python::with_gil(|py| {
            let torch = py.import("torch").context("Failed to import torch")?;

            let cuda = torch.getattr("cuda")?;
            if cuda.call_method0("is_available")?.extract::<bool>()? {
                return Ok("cuda".to_string());
            }

            // Apple Silicon
            let mps = torch.getattr("backends")?.getattr("mps")?;
            if mps.call_method0("is_available")?.extract::<bool>()? {
                return Ok("mps".to_string());
            }

            Ok("cpu".to_string())
        })
    }

    fn load_model(device: &str) -> Result<Py<PyAny>> {
        Python::with_gil(|py| {
            if device == "mps" {
                let environ = py.import("os")?.getattr("environ")?;
                environ.set_item("PYTORCH_ENABLE_MPS_FALLBACK", "1")?;
            }

            let mtl_tts = py
                .import("chatterbox.mtl_tts")
                .context("Failed to import chatterbox.mtl_tts; is chatterbox-tts installed?")?;
            let model_class = mtl_tts.getattr("ChatterboxMultilingualTTS")?;

            let kwargs = PyDict::new(py);
            kwargs.set_item("device", device)?;
            let model = model_class
                .call_method("from_pretrained", (), Some(&kwargs))
                .context("Failed to load ChatterboxMultilingualTTS")?;

            Ok(model.unbind())
        })
    }
}

impl ModelHandle {
    /// Run one generation on the calling (blocking) thread.
    fn generate_sync(&self, text: &str, options: &SynthesisOptions) -> Result<Waveform> {
        Python::with_gil(|py| {
            let model = self.model.bind(py);
            let torch = py.import("torch")?;

            let gen_kwargs = PyDict::new(py);
            gen_kwargs.set_item("language_id", options.language_id.as_str())?;
            if let Some(voice) = &options.voice_ref {
                gen_kwargs.set_item("audio_prompt_path", voice.to_string_lossy().as_ref())?;
            }
            gen_kwargs.set_item("exaggeration", options.exaggeration)?;
            gen_kwargs.set_item("cfg_weight", options.cfg_weight)?;

            // Equivalent of `with torch.inference_mode():`
            let inference_mode = torch.call_method0("inference_mode")?;
            inference_mode.call_method0("__enter__")?;
            let generated = model.call_method("generate", (text,), Some(&gen_kwargs));
            inference_mode.call_method1("__exit__", (py.None(), py.None(), py.None()))?;
            let wav = generated?;

            let sample_rate: u32 = model.getattr("sr")?.extract()?;
            let samples: Vec<f32> = wav
                .call_method0("detach")?
                .call_method0("cpu")?
                .call_method1("reshape", (-1,))?
                .call_method0("tolist")?
                .extract()?;

            self.cleanup_memory(py)?;

            debug!(
                "Generated {} samples at {} Hz for {} chars",
                samples.len(),
                sample_rate,
                text.chars().count()
            );

            Ok(Waveform {
                samples,
                sample_rate,
            })
        })
    }

    /// Cleanup GPU memory to mitigate leaks.
    fn cleanup_memory(&self, py: Python<'_>) -> Result<()> {
        py.import("gc")?.call_method0("collect")?;

        let torch = py.import("torch")?;
        let cache_owner = match self.device.as_str() {
            "cuda" => Some(torch.getattr("cuda")?),
            "mps" => Some(torch.getattr("mps")?),
            _ => None,
        };
        if let Some(owner) = cache_owner {
            if owner.hasattr("empty_cache")? {
                owner.call_method0("empty_cache")?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl TtsBackend for ChatterboxBackend {
    async fn synthesize(&self, text: &str, options: &SynthesisOptions) -> Result<Waveform> {
        let handle = Arc::clone(&self.handle);
        let text = text.to_string();
        let options = options.clone();

        // Run in a blocking task to not block the tokio runtime
        tokio::task::spawn_blocking(move || handle.generate_sync(&text, &options))
            .await
            .context("Task join error")?
    }

    fn device(&self) -> &str {
        &self.handle.device
    }
}
