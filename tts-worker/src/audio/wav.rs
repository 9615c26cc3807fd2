//! WAV encoding of stitched audio.

use super::StitchedAudio;
use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::{Cursor, Seek, Write};
use std::path::Path;

/// Mono 32-bit float, the layout the engine produces its waveforms in.
fn wav_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    }
}

fn write_samples<W: Write + Seek>(writer: W, audio: &StitchedAudio) -> Result<()> {
    let mut writer =
        WavWriter::new(writer, wav_spec(audio.sample_rate)).context("Failed to start WAV stream")?;
    for &sample in &audio.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize().context("Failed to finalize WAV stream")?;
    Ok(())
}

/// Encode audio as an in-memory WAV file.
pub fn encode_wav(audio: &StitchedAudio) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    write_samples(Cursor::new(&mut bytes), audio)?;
    Ok(bytes)
}

/// Write audio to a WAV file on disk.
pub fn write_wav(path: &Path, audio: &StitchedAudio) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_samples(std::io::BufWriter::new(file), audio)
}
