use super::config::SessionConfig;
use super::error::SessionError;
use super::stats::{SessionState, SessionStatus};
use crate::audio::{
    AudioBackend, AudioBackendFactory, AudioFormat, AudioFrame, AudioSource, RecordingWriter,
};
use crate::calllog::Recording;
use crate::storage;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

type SharedWriter = Arc<Mutex<Option<RecordingWriter>>>;

/// A recording session that owns the capture backend and the output file
///
/// The WAV header is finalized only by `stop()`. Pausing stops the backend
/// and leaves the writer open; resuming restarts the same backend into it.
pub struct RecordingSession {
    /// Session configuration
    config: SessionConfig,

    state: SessionState,

    /// Capture backend, held from start until stop
    backend: Option<Box<dyn AudioBackend>>,

    /// Writer for the recording in progress
    writer: SharedWriter,

    /// Task draining the backend's frames into the writer
    pump: Option<JoinHandle<Result<()>>>,

    /// File being written
    current_path: Option<PathBuf>,

    /// When the current recording started
    started_at: Option<DateTime<Local>>,

    format: AudioFormat,
}

impl RecordingSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            backend: None,
            writer: Arc::new(Mutex::new(None)),
            pump: None,
            current_path: None,
            started_at: None,
            format: AudioFormat::Wav,
        }
    }

    /// Open `source` and start recording into a new timestamped file
    pub async fn start(
        &mut self,
        source: AudioSource,
        format: AudioFormat,
    ) -> Result<PathBuf, SessionError> {
        self.ensure_can_start(format)?;

        let backend = AudioBackendFactory::create(source, self.config.backend_config())
            .map_err(SessionError::DeviceOpen)?;

        self.start_with_backend(backend, format).await
    }

    /// Start recording from an already constructed backend
    pub async fn start_with_backend(
        &mut self,
        mut backend: Box<dyn AudioBackend>,
        format: AudioFormat,
    ) -> Result<PathBuf, SessionError> {
        self.ensure_can_start(format)?;

        storage::ensure_dir(&self.config.output_dir).map_err(SessionError::Io)?;

        let started_at = Local::now();
        let path = storage::new_recording_path(&self.config.output_dir, &started_at);

        let writer = RecordingWriter::create(&path, self.config.sample_rate, self.config.channels)
            .map_err(SessionError::Io)?;

        let audio_rx = match backend.start().await {
            Ok(rx) => rx,
            Err(e) => {
                drop(writer);
                if let Err(remove_err) = std::fs::remove_file(&path) {
                    warn!("Failed to remove unused file {}: {}", path.display(), remove_err);
                }
                return Err(SessionError::DeviceOpen(e));
            }
        };

        {
            let mut slot = self.writer.lock().await;
            *slot = Some(writer);
        }
        self.pump = Some(spawn_pump(audio_rx, Arc::clone(&self.writer)));

        info!(
            "Recording started: {} ({}, {}Hz, {} channel(s))",
            path.display(),
            backend.name(),
            self.config.sample_rate,
            self.config.channels
        );

        self.backend = Some(backend);
        self.current_path = Some(path.clone());
        self.started_at = Some(started_at);
        self.format = format;
        self.state = SessionState::Recording;

        Ok(path)
    }

    /// Stop capture but keep the file open
    ///
    /// Returns false when there was nothing to pause. A capture error ends
    /// the recording without producing a log entry.
    pub async fn pause(&mut self) -> Result<bool, SessionError> {
        if self.state != SessionState::Recording {
            warn!("Pause requested but not recording ({:?})", self.state);
            return Ok(false);
        }

        if let Err(e) = self.halt_capture().await {
            error!("Capture failed while pausing: {:#}", e);
            self.abandon().await;
            return Err(SessionError::Capture(e));
        }

        self.state = SessionState::Paused;
        info!("Recording paused");

        Ok(true)
    }

    /// Restart capture into the open file
    ///
    /// No-op (returns false) unless paused. If the device cannot be
    /// restarted the session stays paused and can still be stopped.
    pub async fn resume(&mut self) -> Result<bool, SessionError> {
        if self.state != SessionState::Paused {
            warn!("Resume requested but not paused ({:?})", self.state);
            return Ok(false);
        }

        let backend = self
            .backend
            .as_mut()
            .ok_or_else(|| SessionError::DeviceOpen(anyhow!("No capture backend to resume")))?;

        let audio_rx = backend.start().await.map_err(SessionError::DeviceOpen)?;
        self.pump = Some(spawn_pump(audio_rx, Arc::clone(&self.writer)));
        self.state = SessionState::Recording;
        info!("Recording resumed");

        Ok(true)
    }

    /// Stop capture, finalize the file and release the device
    ///
    /// Returns `None` when no recording was active.
    pub async fn stop(&mut self) -> Result<Option<Recording>, SessionError> {
        if !self.state.is_active() {
            warn!("Stop requested but no recording active ({:?})", self.state);
            return Ok(None);
        }

        let halted = if self.state == SessionState::Recording {
            self.halt_capture().await
        } else {
            Ok(())
        };

        if let Err(e) = halted {
            error!("Capture failed: {:#}", e);
            self.abandon().await;
            return Err(SessionError::Capture(e));
        }

        // Release the device
        self.backend = None;
        self.state = SessionState::Stopped;
        self.current_path = None;
        self.started_at = None;

        let writer = self
            .writer
            .lock()
            .await
            .take()
            .ok_or_else(|| SessionError::Io(anyhow!("Recording writer missing")))?;

        let duration_secs = writer.duration_seconds();
        let path = writer.finish().map_err(SessionError::Io)?;

        info!("Recording stopped: {} ({:.1}s)", path.display(), duration_secs);

        Ok(Some(Recording {
            created_at: storage::parse_recording_timestamp(&path),
            path,
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
            format: self.format,
            duration_secs,
        }))
    }

    /// Get current session status
    pub async fn status(&self) -> SessionStatus {
        let (samples_written, duration_secs) = {
            let writer = self.writer.lock().await;
            writer
                .as_ref()
                .map(|w| (w.sample_count(), w.duration_seconds()))
                .unwrap_or((0, 0.0))
        };

        SessionStatus {
            state: self.state,
            file_path: self.current_path.clone(),
            started_at: self.started_at,
            duration_secs,
            samples_written,
            backend: self.backend.as_ref().map(|b| b.name().to_string()),
        }
    }

    fn ensure_can_start(&self, format: AudioFormat) -> Result<(), SessionError> {
        if self.state.is_active() {
            return Err(SessionError::AlreadyRecording);
        }
        if !format.is_supported() {
            return Err(SessionError::UnsupportedFormat(format));
        }
        Ok(())
    }

    /// Stop the backend and wait for every delivered frame to be written
    async fn halt_capture(&mut self) -> Result<()> {
        let stopped = match self.backend.as_mut() {
            Some(backend) => backend.stop().await,
            None => Ok(()),
        };

        let drained = match self.pump.take() {
            Some(handle) => handle.await.context("Writer task panicked").and_then(|r| r),
            None => Ok(()),
        };

        stopped?;
        drained
    }

    /// End a failed recording: close the file, release the device
    async fn abandon(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        if let Some(writer) = self.writer.lock().await.take() {
            let path = writer.path().to_path_buf();
            if let Err(e) = writer.finish() {
                warn!("Failed to close {}: {:#}", path.display(), e);
            }
        }
        self.backend = None;
        self.current_path = None;
        self.started_at = None;
        self.state = SessionState::Stopped;
    }
}

/// Drain frames into the shared writer until the backend closes the channel
fn spawn_pump(
    mut audio_rx: mpsc::Receiver<AudioFrame>,
    writer: SharedWriter,
) -> JoinHandle<Result<()>> {
    tokio::spawn(async move {
        while let Some(frame) = audio_rx.recv().await {
            let mut slot = writer.lock().await;
            let writer = slot.as_mut().context("Recording writer already closed")?;
            writer.write_frame(&frame)?;
        }
        Ok(())
    })
}
