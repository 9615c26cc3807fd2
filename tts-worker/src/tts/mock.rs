//! Mock TTS backend for testing
//!
//! Produces constant-length waveforms and can simulate failures or a sample
//! rate change on a chosen call. Tracks how many calls overlap.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{SynthesisOptions, TtsBackend, Waveform};
use anyhow::Result;

/// What the backend saw on one call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub text: String,
    pub options: SynthesisOptions,
    /// Whether the voice reference file existed when the call was made
    pub voice_ref_existed: bool,
}

/// A mock backend for pipeline tests
pub struct MockBackend {
    sample_rate: u32,
    samples_per_call: usize,
    /// Zero-based call number that fails, if any
    fail_on_call: Option<usize>,
    /// Zero-based call number that reports a different sample rate
    rate_change: Option<(usize, u32)>,
    /// Delete the voice reference file during each call
    removes_voice_ref: bool,
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockBackend {
    /// Create a backend that returns `seconds` of audio per call
    pub fn always_succeeds(sample_rate: u32, seconds: f32) -> Self {
        Self {
            sample_rate,
            samples_per_call: (seconds * sample_rate as f32).round() as usize,
            fail_on_call: None,
            rate_change: None,
            removes_voice_ref: false,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Create a backend whose `n`th call (zero-based) fails
    pub fn fails_on_call(n: usize, sample_rate: u32, seconds: f32) -> Self {
        Self {
            fail_on_call: Some(n),
            ..Self::always_succeeds(sample_rate, seconds)
        }
    }

    /// Report `sample_rate` instead of the configured rate on call `n`
    pub fn with_rate_on_call(mut self, n: usize, sample_rate: u32) -> Self {
        self.rate_change = Some((n, sample_rate));
        self
    }

    /// Delete the voice reference file from under the caller on every call
    pub fn removing_voice_ref(mut self) -> Self {
        self.removes_voice_ref = true;
        self
    }

    /// Highest number of synthesize() calls that were running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Get the number of times synthesize() was called
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Get every recorded call in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TtsBackend for MockBackend {
    async fn synthesize(&self, text: &str, options: &SynthesisOptions) -> Result<Waveform> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        // Give any concurrent caller a chance to enter
        tokio::task::yield_now().await;
        let result = self.generate(text, options);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn device(&self) -> &str {
        "mock"
    }
}

impl MockBackend {
    fn generate(&self, text: &str, options: &SynthesisOptions) -> Result<Waveform> {
        let call_num = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                text: text.to_string(),
                options: options.clone(),
                voice_ref_existed: options.voice_ref.as_ref().is_some_and(|p| p.exists()),
            });
            calls.len() - 1
        };

        if self.removes_voice_ref {
            if let Some(path) = &options.voice_ref {
                std::fs::remove_file(path)?;
            }
        }

        if self.fail_on_call == Some(call_num) {
            anyhow::bail!("CUDA out of memory while generating call {}", call_num);
        }

        let sample_rate = match self.rate_change {
            Some((n, rate)) if n == call_num => rate,
            _ => self.sample_rate,
        };

        // Distinct amplitude per call so stitch order is observable
        let amplitude = (call_num + 1) as f32 / 100.0;
        Ok(Waveform {
            samples: vec![amplitude; self.samples_per_call],
            sample_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_succeeds() {
        let backend = MockBackend::always_succeeds(24000, 1.0);
        let wav = backend
            .synthesize("Hola", &SynthesisOptions::default())
            .await
            .unwrap();

        assert_eq!(wav.samples.len(), 24000);
        assert_eq!(wav.sample_rate, 24000);
        assert_eq!(backend.call_count(), 1);
        assert_eq!(backend.calls()[0].text, "Hola");
    }

    #[tokio::test]
    async fn test_fails_on_call() {
        let backend = MockBackend::fails_on_call(1, 24000, 0.1);
        let opts = SynthesisOptions::default();

        assert!(backend.synthesize("uno", &opts).await.is_ok());
        assert!(backend.synthesize("dos", &opts).await.is_err());
        assert!(backend.synthesize("tres", &opts).await.is_ok());
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_rate_change() {
        let backend = MockBackend::always_succeeds(24000, 0.1).with_rate_on_call(1, 16000);
        let opts = SynthesisOptions::default();

        assert_eq!(backend.synthesize("a", &opts).await.unwrap().sample_rate, 24000);
        assert_eq!(backend.synthesize("b", &opts).await.unwrap().sample_rate, 16000);
    }

    #[tokio::test]
    async fn test_removing_voice_ref() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let backend = MockBackend::always_succeeds(24000, 0.1).removing_voice_ref();
        let opts = SynthesisOptions::default().with_voice_ref(Some(file.path().to_path_buf()));

        backend.synthesize("a", &opts).await.unwrap();
        assert!(!file.path().exists());
        assert!(backend.calls()[0].voice_ref_existed);
    }

    #[tokio::test]
    async fn test_sequential_calls_never_overlap() {
        let backend = MockBackend::always_succeeds(24000, 0.1);
        let opts = SynthesisOptions::default();

        backend.synthesize("a", &opts).await.unwrap();
        backend.synthesize("b", &opts).await.unwrap();
        assert_eq!(backend.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_counted() {
        let backend = MockBackend::always_succeeds(24000, 0.1);
        let opts = SynthesisOptions::default();

        let (a, b) = tokio::join!(backend.synthesize("a", &opts), backend.synthesize("b", &opts));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(backend.max_in_flight(), 2);
    }
}
