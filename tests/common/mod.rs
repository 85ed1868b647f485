// Shared fixtures for integration tests

#![allow(dead_code)]

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Write a 16-bit sine tone WAV and return its path
pub fn write_tone_wav(path: &Path, seconds: f64, sample_rate: u32, channels: u16) -> Result<PathBuf> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let frames = (seconds * sample_rate as f64) as usize;
    for i in 0..frames {
        let t = i as f64 / sample_rate as f64;
        let sample = ((t * 440.0 * std::f64::consts::TAU).sin() * 8000.0) as i16;
        for _ in 0..channels {
            writer.write_sample(sample)?;
        }
    }
    writer.finalize()?;

    Ok(path.to_path_buf())
}

/// Half a second of 44.1kHz mono audio
pub fn call_fixture(dir: &Path, name: &str) -> Result<PathBuf> {
    write_tone_wav(&dir.join(name), 0.5, 44100, 1)
}

pub fn wav_files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().map(|e| e == "wav").unwrap_or(false))
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}
