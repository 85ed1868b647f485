use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifecycle of a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Recording,
    Paused,
    Stopped,
}

impl SessionState {
    /// A file is open and waiting for either more audio or `stop()`
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Recording | SessionState::Paused)
    }
}

/// Snapshot of a recording session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub state: SessionState,

    /// File being written, while a recording is active
    pub file_path: Option<PathBuf>,

    /// When the active recording started
    pub started_at: Option<DateTime<Local>>,

    /// Audio captured so far, in seconds
    pub duration_secs: f64,

    /// Interleaved samples written so far
    pub samples_written: u64,

    /// Capture backend in use
    pub backend: Option<String>,
}
