use thiserror::Error;

use crate::audio::AudioFormat;

/// Failures of the recording lifecycle
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("{0} recording is not supported")]
    UnsupportedFormat(AudioFormat),

    #[error("failed to open capture device: {0:#}")]
    DeviceOpen(anyhow::Error),

    #[error("capture failed: {0:#}")]
    Capture(anyhow::Error),

    #[error("recording file error: {0:#}")]
    Io(anyhow::Error),
}
