//! The call-capture application: one recording session, one call log and a
//! player, driven by the CLI and the HTTP API alike.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::audio::{self, AudioBackend, AudioFormat, AudioSource, InputDevice, Player};
use crate::calllog::{CallLogStore, DeleteOutcome, Recording};
use crate::config::Config;
use crate::session::{RecordingSession, SessionConfig, SessionError, SessionStatus};
use crate::storage;

/// Settings the application is built from
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub session: SessionConfig,
    pub low_disk_space_bytes: u64,
    pub load_existing: bool,
    pub volume: f32,
    pub default_format: AudioFormat,
}

impl AppSettings {
    /// Settings with defaults and the given recordings folder
    pub fn new(recordings_dir: impl Into<PathBuf>) -> Self {
        Self {
            session: SessionConfig::new(recordings_dir),
            low_disk_space_bytes: 1_000_000_000,
            load_existing: false,
            volume: 1.0,
            default_format: AudioFormat::Wav,
        }
    }

    pub fn recordings_dir(&self) -> &Path {
        &self.session.output_dir
    }
}

impl From<&Config> for AppSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            session: cfg.session_config(),
            low_disk_space_bytes: cfg.storage.low_disk_space_bytes,
            load_existing: cfg.storage.load_existing,
            volume: cfg.playback.volume,
            default_format: cfg.audio.default_format,
        }
    }
}

pub struct CallCapture {
    settings: AppSettings,
    session: Mutex<RecordingSession>,
    log: RwLock<CallLogStore>,
    player: Player,
}

impl CallCapture {
    /// Prepare the recordings folder and the call log
    pub fn new(settings: AppSettings) -> Result<Self> {
        let dir = settings.recordings_dir().to_path_buf();
        storage::ensure_dir(&dir)?;
        storage::check_disk_space(&dir, settings.low_disk_space_bytes);

        let mut log = CallLogStore::new(&dir);
        if settings.load_existing {
            log.load_existing()
                .context("Failed to load existing recordings")?;
        }

        info!("Recordings folder: {}", dir.display());

        Ok(Self {
            session: Mutex::new(RecordingSession::new(settings.session.clone())),
            log: RwLock::new(log),
            player: Player::new(settings.volume),
            settings,
        })
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn devices(&self) -> Result<Vec<InputDevice>> {
        audio::list_input_devices()
    }

    pub fn formats(&self) -> &'static [AudioFormat] {
        &AudioFormat::ALL
    }

    pub async fn start_recording(
        &self,
        source: AudioSource,
        format: AudioFormat,
    ) -> Result<PathBuf, SessionError> {
        self.session.lock().await.start(source, format).await
    }

    /// Start recording from a caller-supplied capture backend
    pub async fn start_recording_with(
        &self,
        backend: Box<dyn AudioBackend>,
        format: AudioFormat,
    ) -> Result<PathBuf, SessionError> {
        self.session
            .lock()
            .await
            .start_with_backend(backend, format)
            .await
    }

    pub async fn pause_recording(&self) -> Result<bool, SessionError> {
        self.session.lock().await.pause().await
    }

    pub async fn resume_recording(&self) -> Result<bool, SessionError> {
        self.session.lock().await.resume().await
    }

    /// Stop the active recording and add it to the call log
    ///
    /// A capture error leaves the log untouched.
    pub async fn stop_recording(&self) -> Result<Option<Recording>, SessionError> {
        let recording = self.session.lock().await.stop().await?;

        if let Some(recording) = &recording {
            self.log.write().await.add(recording.path.clone());
        }

        Ok(recording)
    }

    pub async fn status(&self) -> SessionStatus {
        self.session.lock().await.status().await
    }

    /// Logged recordings whose path contains `query` (all when empty)
    pub async fn recordings(&self, query: &str) -> Vec<PathBuf> {
        self.log.read().await.search(query)
    }

    pub fn describe(&self, path: &Path) -> Result<Recording> {
        Recording::from_path(path)
    }

    pub async fn delete_recording(&self, path: &Path) -> Result<DeleteOutcome> {
        self.log.write().await.delete(path)
    }

    /// Drop log entries whose files were removed outside the application
    pub async fn prune_missing(&self) -> Vec<PathBuf> {
        self.log.write().await.prune_missing()
    }

    /// Write the call log to `CallLogs_<timestamp>.txt` in the recordings folder
    pub async fn export_logs(&self) -> Result<PathBuf> {
        let log = self.log.read().await;
        log.export_logs(log.managed_dir())
    }

    pub async fn import_recordings<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<PathBuf>> {
        self.log.write().await.import_files(paths)
    }

    pub async fn export_recordings(&self, dest_dir: &Path) -> Result<Vec<PathBuf>> {
        self.log.read().await.export_files(dest_dir)
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub async fn play(&self, path: &Path) -> Result<Duration> {
        if !self.log.read().await.contains(path) {
            warn!("Playing a file that is not in the call log: {}", path.display());
        }
        self.player.play(path).await
    }

    pub fn set_volume(&self, volume: f32) -> f32 {
        self.player.set_volume(volume)
    }
}
