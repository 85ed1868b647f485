//! Playback of recordings through rodio
//!
//! rodio's output stream is not `Send`, so each playback opens the default
//! output device inside a blocking task and holds it until the sink drains.

use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Plays recordings on the default output device
#[derive(Clone)]
pub struct Player {
    /// Volume as f32 bits
    volume: Arc<AtomicU32>,
}

impl Player {
    pub fn new(volume: f32) -> Self {
        Self {
            volume: Arc::new(AtomicU32::new(clamp_volume(volume).to_bits())),
        }
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::SeqCst))
    }

    /// Set playback volume, clamped to `0.0..=1.0`
    ///
    /// Applies to playbacks started afterwards.
    pub fn set_volume(&self, volume: f32) -> f32 {
        let volume = clamp_volume(volume);
        self.volume.store(volume.to_bits(), Ordering::SeqCst);
        volume
    }

    /// Play a file to completion, returning how long playback took
    pub async fn play(&self, path: impl AsRef<Path>) -> Result<Duration> {
        let path = path.as_ref().to_path_buf();
        let volume = self.volume();

        tokio::task::spawn_blocking(move || play_blocking(&path, volume))
            .await
            .context("Playback task failed")?
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new(1.0)
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return 1.0;
    }
    volume.clamp(0.0, 1.0)
}

fn open_source(path: &Path) -> Result<Decoder<BufReader<File>>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open recording: {}", path.display()))?;
    Decoder::new(BufReader::new(file))
        .with_context(|| format!("Failed to decode recording: {}", path.display()))
}

fn play_blocking(path: &Path, volume: f32) -> Result<Duration> {
    let source = open_source(path)?;
    let expected = source.total_duration();

    let (_stream, stream_handle) = OutputStream::try_default()
        .context("No audio output device available")?;
    let sink = Sink::try_new(&stream_handle)
        .context("Failed to create playback sink")?;

    sink.set_volume(volume);
    sink.append(source);

    info!(
        "Playing {} (volume {:.2}, length {:?})",
        path.display(),
        volume,
        expected
    );

    let started = Instant::now();
    sink.sleep_until_end();

    Ok(started.elapsed())
}
