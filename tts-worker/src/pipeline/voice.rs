//! Voice reference resolution.
//!
//! Priority: audio uploaded with the request, then the configured default
//! reference file, then the engine's built-in voice.

use crate::error::{PipelineError, Result};
use log::{debug, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The voice reference for one request.
///
/// An uploaded reference lives in a temporary file that is removed when this
/// value is released or dropped.
#[derive(Debug)]
pub enum VoiceReference {
    Uploaded(NamedTempFile),
    Default(PathBuf),
    Builtin,
}

impl VoiceReference {
    /// Pick the reference for a request.
    ///
    /// # Arguments
    /// * `uploaded` - Decoded reference audio sent with the request
    /// * `default_ref` - Configured fallback reference file
    pub fn resolve(uploaded: Option<&[u8]>, default_ref: Option<&Path>) -> Result<Self> {
        if let Some(bytes) = uploaded {
            return Self::materialize(bytes);
        }

        if let Some(path) = default_ref {
            if path.is_file() {
                debug!("Using default voice reference {}", path.display());
                return Ok(Self::Default(path.to_path_buf()));
            }
            warn!(
                "Default voice reference {} not found, using built-in voice",
                path.display()
            );
        }

        Ok(Self::Builtin)
    }

    fn materialize(bytes: &[u8]) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("voice-ref-")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| {
                PipelineError::Resource(format!("failed to create temporary file: {}", e))
            })?;

        file.write_all(bytes)
            .and_then(|()| file.flush())
            .map_err(|e| {
                PipelineError::Resource(format!("failed to write reference audio: {}", e))
            })?;

        debug!(
            "Wrote {} bytes of reference audio to {}",
            bytes.len(),
            file.path().display()
        );
        Ok(Self::Uploaded(file))
    }

    /// Path handed to the engine, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Uploaded(file) => Some(file.path()),
            Self::Default(path) => Some(path),
            Self::Builtin => None,
        }
    }

    /// Remove the temporary file, reporting a failed removal.
    pub fn release(self) -> Result<()> {
        match self {
            Self::Uploaded(file) => file.close().map_err(|e| {
                PipelineError::Resource(format!("failed to remove reference audio: {}", e))
            }),
            Self::Default(_) | Self::Builtin => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uploaded_reference_written_and_released() {
        let voice = VoiceReference::resolve(Some(b"RIFF fake wav"), None).unwrap();
        let path = voice.path().unwrap().to_path_buf();

        assert!(path.to_string_lossy().ends_with(".wav"));
        assert_eq!(std::fs::read(&path).unwrap(), b"RIFF fake wav");

        voice.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_uploaded_reference_removed_on_drop() {
        let voice = VoiceReference::resolve(Some(b"data"), None).unwrap();
        let path = voice.path().unwrap().to_path_buf();
        assert!(path.exists());

        drop(voice);
        assert!(!path.exists());
    }

    #[test]
    fn test_uploaded_reference_beats_default() {
        let default = NamedTempFile::new().unwrap();
        let voice = VoiceReference::resolve(Some(b"data"), Some(default.path())).unwrap();
        assert!(matches!(voice, VoiceReference::Uploaded(_)));
        assert_ne!(voice.path(), Some(default.path()));
    }

    #[test]
    fn test_default_reference_used_when_present() {
        let default = NamedTempFile::new().unwrap();
        let voice = VoiceReference::resolve(None, Some(default.path())).unwrap();
        assert_eq!(voice.path(), Some(default.path()));

        voice.release().unwrap();
        assert!(default.path().exists());
    }

    #[test]
    fn test_missing_default_falls_back_to_builtin() {
        let voice =
            VoiceReference::resolve(None, Some(Path::new("/nonexistent/voice.wav"))).unwrap();
        assert!(matches!(voice, VoiceReference::Builtin));
        assert!(voice.path().is_none());
    }

    #[test]
    fn test_no_reference_is_builtin() {
        let voice = VoiceReference::resolve(None, None).unwrap();
        assert!(voice.path().is_none());
    }
}
