use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

use crate::audio::AudioFormat;
use crate::session::SessionConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub storage: StorageConfig,
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub buffer_duration_ms: u64,
    pub default_format: AudioFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Managed recordings folder; `~` is expanded
    pub recordings_path: String,
    /// Warn at startup when less than this many bytes are free
    pub low_disk_space_bytes: u64,
    /// Seed the call log with recordings already in the folder
    pub load_existing: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    pub volume: f32,
}

impl Config {
    /// Load configuration
    ///
    /// Built-in defaults, then the optional file at `path` (any extension the
    /// config crate understands), then `CALL_CAPTURE__SECTION__KEY`
    /// environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let default_dir = crate::storage::default_recordings_dir();

        let settings = config::Config::builder()
            .set_default("service.name", "call-capture")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 8730)?
            .set_default("audio.sample_rate", 44100)?
            .set_default("audio.channels", 1)?
            .set_default("audio.buffer_duration_ms", 100)?
            .set_default("audio.default_format", "wav")?
            .set_default("storage.recordings_path", default_dir.to_string_lossy().as_ref())?
            .set_default("storage.low_disk_space_bytes", 1_000_000_000i64)?
            .set_default("storage.load_existing", true)?
            .set_default("playback.volume", 1.0)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("CALL_CAPTURE").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn recordings_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.storage.recordings_path).as_ref())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            output_dir: self.recordings_dir(),
            sample_rate: self.audio.sample_rate,
            channels: self.audio.channels,
            buffer_duration_ms: self.audio.buffer_duration_ms,
        }
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.service.http.bind, self.service.http.port)
    }
}
