//! Recording session management
//!
//! This module provides the `RecordingSession` abstraction that manages:
//! - The capture backend (device or file replay)
//! - The WAV writer for the recording in progress
//! - Start / pause / resume / stop transitions

mod config;
mod error;
mod session;
mod stats;

pub use config::SessionConfig;
pub use error::SessionError;
pub use session::RecordingSession;
pub use stats::{SessionState, SessionStatus};
