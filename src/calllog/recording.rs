use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::audio::{AudioFormat, WavInfo};
use crate::storage;

/// A recording on disk, identified by its path
#[derive(Debug, Clone, Serialize)]
pub struct Recording {
    pub path: PathBuf,

    /// Creation time encoded in the filename, if it follows the naming scheme
    pub created_at: Option<NaiveDateTime>,

    pub sample_rate: u32,

    pub channels: u16,

    pub format: AudioFormat,

    pub duration_secs: f64,
}

impl Recording {
    /// Describe an existing WAV file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let info = WavInfo::probe(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            created_at: storage::parse_recording_timestamp(path),
            sample_rate: info.sample_rate,
            channels: info.channels,
            format: AudioFormat::Wav,
            duration_secs: info.duration_seconds,
        })
    }
}
