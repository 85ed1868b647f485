pub mod backend;
pub mod device;
pub mod file;
pub mod format;
pub mod playback;
pub mod replay;
pub mod writer;

pub use backend::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource};
pub use device::{list_input_devices, CpalBackend, InputDevice};
pub use file::{AudioFile, WavInfo};
pub use format::AudioFormat;
pub use playback::Player;
pub use replay::FileBackend;
pub use writer::RecordingWriter;
