//! Audio assembly: stitching per-chunk waveforms and encoding the result.

pub mod stitcher;
pub mod wav;

pub use stitcher::stitch;

/// Default gap inserted between consecutive chunks, in seconds.
pub const DEFAULT_SILENCE_SECONDS: f32 = 0.3;

/// Audio synthesized for a single text chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    /// Index of the source `TextChunk`
    pub index: usize,
    /// Mono samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioSegment {
    pub fn new(index: usize, samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            index,
            samples,
            sample_rate,
        }
    }
}

/// Silence written between chunks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceSpec {
    pub duration_seconds: f32,
}

impl Default for SilenceSpec {
    fn default() -> Self {
        Self {
            duration_seconds: DEFAULT_SILENCE_SECONDS,
        }
    }
}

impl SilenceSpec {
    pub fn new(duration_seconds: f32) -> Self {
        Self { duration_seconds }
    }

    /// Number of zero samples this gap takes at `sample_rate`.
    pub fn sample_count(&self, sample_rate: u32) -> usize {
        (f64::from(self.duration_seconds) * f64::from(sample_rate)).round() as usize
    }
}

/// The continuous waveform for a whole request.
#[derive(Debug, Clone, PartialEq)]
pub struct StitchedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub total_duration_seconds: f64,
}

impl StitchedAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        let total_duration_seconds = if sample_rate == 0 {
            0.0
        } else {
            samples.len() as f64 / f64::from(sample_rate)
        };
        Self {
            samples,
            sample_rate,
            total_duration_seconds,
        }
    }
}
