use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Header-level facts about a WAV file
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Samples per channel
    pub frames: u32,
    pub duration_seconds: f64,
}

impl WavInfo {
    /// Read only the header of a WAV file
    pub fn probe(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

        Ok(Self::from_reader(&reader))
    }

    fn from_reader<R: Read>(reader: &WavReader<R>) -> Self {
        let spec = reader.spec();
        let frames = reader.duration();

        Self {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            frames,
            duration_seconds: frames as f64 / spec.sample_rate.max(1) as f64,
        }
    }
}

/// A fully decoded 16-bit WAV file
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub path: PathBuf,
    pub info: WavInfo,
    /// Interleaved PCM samples
    pub samples: Vec<i16>,
}

impl AudioFile {
    /// Decode a 16-bit PCM WAV file into memory
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

        let spec = reader.spec();
        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
            bail!(
                "{} is {}-bit {:?}, only 16-bit PCM can be replayed",
                path.display(),
                spec.bits_per_sample,
                spec.sample_format
            );
        }

        let info = WavInfo::from_reader(&reader);
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read samples from {}", path.display()))?;

        debug!(
            "Loaded {}: {:.1}s at {}Hz, {} channel(s)",
            path.display(),
            info.duration_seconds,
            info.sample_rate,
            info.channels
        );

        Ok(Self {
            path: path.to_path_buf(),
            info,
            samples,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.info.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.info.channels
    }
}
