// File-backed capture source
//
// Replays a WAV file as if it were a capture device. The read position
// survives stop/start, so a paused recording picks up where it left off.

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};
use super::file::AudioFile;

pub struct FileBackend {
    path: PathBuf,
    samples: Arc<Vec<i16>>,
    sample_rate: u32,
    channels: u16,
    samples_per_frame: usize,
    position: Arc<AtomicUsize>,
    stop_flag: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    capturing: bool,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>, config: AudioBackendConfig) -> Result<Self> {
        let path = path.into();
        let audio = AudioFile::open(&path)?;

        if audio.sample_rate() != config.target_sample_rate
            || audio.channels() != config.target_channels
        {
            bail!(
                "{} is {}Hz/{}ch, expected {}Hz/{}ch",
                path.display(),
                audio.sample_rate(),
                audio.channels(),
                config.target_sample_rate,
                config.target_channels
            );
        }

        let samples_per_frame = (config.target_sample_rate as u64
            * config.target_channels as u64
            * config.buffer_duration_ms.max(1)
            / 1000)
            .max(1) as usize;

        Ok(Self {
            path,
            sample_rate: audio.sample_rate(),
            channels: audio.channels(),
            samples: Arc::new(audio.samples),
            samples_per_frame,
            position: Arc::new(AtomicUsize::new(0)),
            stop_flag: Arc::new(AtomicBool::new(false)),
            task: None,
            capturing: false,
        })
    }

    /// Whether every sample of the file has been delivered
    pub fn is_exhausted(&self) -> bool {
        self.position.load(Ordering::SeqCst) >= self.samples.len()
    }
}

#[async_trait::async_trait]
impl AudioBackend for FileBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.capturing {
            bail!("Already capturing");
        }

        info!("Replaying {}", self.path.display());

        let (tx, rx) = mpsc::channel(64);
        self.stop_flag.store(false, Ordering::SeqCst);

        let samples = Arc::clone(&self.samples);
        let position = Arc::clone(&self.position);
        let stop_flag = Arc::clone(&self.stop_flag);
        let sample_rate = self.sample_rate;
        let channels = self.channels;
        let samples_per_frame = self.samples_per_frame;

        self.task = Some(tokio::spawn(async move {
            loop {
                if stop_flag.load(Ordering::SeqCst) {
                    break;
                }

                let start = position.load(Ordering::SeqCst);
                if start >= samples.len() {
                    debug!("Replay source exhausted");
                    break;
                }
                let end = (start + samples_per_frame).min(samples.len());

                let frame = AudioFrame {
                    samples: samples[start..end].to_vec(),
                    sample_rate,
                    channels,
                    timestamp_ms: (start / channels as usize) as u64 * 1000 / sample_rate as u64,
                };

                if tx.send(frame).await.is_err() {
                    break;
                }
                position.store(end, Ordering::SeqCst);
            }
        }));

        self.capturing = true;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if !self.capturing {
            return Ok(());
        }

        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.await?;
        }
        self.capturing = false;

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "file replay"
    }
}
