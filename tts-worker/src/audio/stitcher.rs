//! Joining per-chunk audio into one continuous waveform.

use super::{AudioSegment, SilenceSpec, StitchedAudio};
use crate::error::{PipelineError, Result};

/// Concatenate segments in order with a silence gap between neighbours.
///
/// A single segment is passed through untouched. No silence is written
/// before the first or after the last segment. All segments must share the
/// first segment's sample rate.
pub fn stitch(segments: Vec<AudioSegment>, silence: &SilenceSpec) -> Result<StitchedAudio> {
    let Some(first) = segments.first() else {
        return Err(PipelineError::EmptyInput);
    };
    let sample_rate = first.sample_rate;

    if let Some(mismatch) = segments.iter().find(|s| s.sample_rate != sample_rate) {
        return Err(PipelineError::RateMismatch {
            index: mismatch.index,
            expected: sample_rate,
            found: mismatch.sample_rate,
        });
    }

    if segments.len() == 1 {
        let segment = segments.into_iter().next().ok_or(PipelineError::EmptyInput)?;
        return Ok(StitchedAudio::new(segment.samples, sample_rate));
    }

    let gap = silence.sample_count(sample_rate);
    let total = gap
        .checked_mul(segments.len() - 1)
        .and_then(|silence_total| {
            segments
                .iter()
                .try_fold(silence_total, |acc, s| acc.checked_add(s.samples.len()))
        })
        .ok_or_else(|| {
            PipelineError::InvalidInput(format!(
                "silence of {}s between {} segments is too long",
                silence.duration_seconds,
                segments.len()
            ))
        })?;

    let mut samples = Vec::with_capacity(total);
    for (i, segment) in segments.into_iter().enumerate() {
        if i > 0 {
            samples.resize(samples.len() + gap, 0.0);
        }
        samples.extend_from_slice(&segment.samples);
    }

    Ok(StitchedAudio::new(samples, sample_rate))
}
