//! HTTP API for controlling recordings and the call log
//!
//! - GET  /health - Health check
//! - GET  /devices, /formats - Capture devices and recordable formats
//! - POST /recording/{start,pause,resume,stop} - Recording lifecycle
//! - GET  /recording/status - Current session status
//! - GET  /recordings?q= - List or search the call log
//! - GET  /recordings/info?path= - Sample rate, channels and length of a file
//! - POST /recordings/{delete,play,import,export} - File management
//! - POST /logs/export - Write the call log to a text file
//! - GET/POST /playback/volume - Playback volume

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
