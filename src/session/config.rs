use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::audio::AudioBackendConfig;

/// Configuration for a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Managed folder new recordings are written to
    pub output_dir: PathBuf,

    /// Sample rate for capture and the WAV header
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Capture buffer length in milliseconds
    pub buffer_duration_ms: u64,
}

impl SessionConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn backend_config(&self) -> AudioBackendConfig {
        AudioBackendConfig {
            target_sample_rate: self.sample_rate,
            target_channels: self.channels,
            buffer_duration_ms: self.buffer_duration_ms,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output_dir: crate::storage::default_recordings_dir(),
            sample_rate: 44100, // 44.1kHz
            channels: 1,        // Mono
            buffer_duration_ms: 100,
        }
    }
}
