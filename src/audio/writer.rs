use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::backend::AudioFrame;

/// Streams 16-bit PCM frames into a single WAV file
///
/// The header is only finalized by `finish()` (or on drop), so capture may
/// stop and restart any number of times in between.
pub struct RecordingWriter {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    path: PathBuf,
    sample_rate: u32,
    channels: u16,
    sample_count: u64,
}

impl RecordingWriter {
    pub fn create(path: impl AsRef<Path>, sample_rate: u32, channels: u16) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer = hound::WavWriter::create(&path, spec)
            .with_context(|| format!("Failed to create WAV file: {:?}", path))?;

        Ok(Self {
            writer: Some(writer),
            path,
            sample_rate,
            channels,
            sample_count: 0,
        })
    }

    pub fn write_frame(&mut self, frame: &AudioFrame) -> Result<()> {
        if frame.sample_rate != self.sample_rate || frame.channels != self.channels {
            anyhow::bail!(
                "Frame format {}Hz/{}ch does not match writer {}Hz/{}ch",
                frame.sample_rate,
                frame.channels,
                self.sample_rate,
                self.channels
            );
        }

        if let Some(writer) = &mut self.writer {
            for &sample in &frame.samples {
                writer.write_sample(sample)
                    .context("Failed to write sample to WAV")?;
            }
            self.sample_count += frame.samples.len() as u64;
        }

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Interleaved samples written so far
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    pub fn duration_seconds(&self) -> f64 {
        self.sample_count as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Finalize the WAV header and close the file
    pub fn finish(mut self) -> Result<PathBuf> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()
                .context("Failed to finalize WAV file")?;
        }

        Ok(self.path.clone())
    }
}

impl Drop for RecordingWriter {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                warn!("Failed to finalize WAV writer on drop: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn frame(samples: Vec<i16>) -> AudioFrame {
        AudioFrame {
            samples,
            sample_rate: 44100,
            channels: 1,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn finish_produces_readable_wav() -> Result<()> {
        let dir = TempDir::new()?;
        let mut writer = RecordingWriter::create(dir.path().join("out.wav"), 44100, 1)?;
        writer.write_frame(&frame(vec![1, 2, 3]))?;
        writer.write_frame(&frame(vec![4, 5]))?;
        assert_eq!(writer.sample_count(), 5);

        let path = writer.finish()?;
        let reader = hound::WavReader::open(&path)?;
        assert_eq!(reader.spec().sample_rate, 44100);
        assert_eq!(reader.spec().channels, 1);
        let samples: Vec<i16> = reader.into_samples().collect::<Result<_, _>>()?;
        assert_eq!(samples, vec![1, 2, 3, 4, 5]);
        Ok(())
    }

    #[test]
    fn mismatched_frame_is_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let mut writer = RecordingWriter::create(dir.path().join("out.wav"), 44100, 1)?;
        let stereo = AudioFrame {
            samples: vec![0; 4],
            sample_rate: 44100,
            channels: 2,
            timestamp_ms: 0,
        };
        assert!(writer.write_frame(&stereo).is_err());
        assert_eq!(writer.sample_count(), 0);
        Ok(())
    }

    #[test]
    fn dropped_writer_still_leaves_valid_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("dropped.wav");
        {
            let mut writer = RecordingWriter::create(&path, 44100, 1)?;
            writer.write_frame(&frame(vec![7; 100]))?;
        }
        let reader = hound::WavReader::open(&path)?;
        assert_eq!(reader.duration(), 100);
        Ok(())
    }
}
