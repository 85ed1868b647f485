pub mod app;
pub mod audio;
pub mod calllog;
pub mod config;
pub mod http;
pub mod session;
pub mod storage;

pub use app::{AppSettings, CallCapture};
pub use audio::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFile, AudioFormat, AudioFrame,
    AudioSource, InputDevice, Player, RecordingWriter, WavInfo,
};
pub use calllog::{CallLogStore, DeleteOutcome, Recording};
pub use config::Config;
pub use http::{create_router, AppState};
pub use session::{RecordingSession, SessionConfig, SessionError, SessionState, SessionStatus};
