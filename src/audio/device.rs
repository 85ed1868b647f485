// Capture devices through cpal
//
// cpal::Stream is not Send, so every capture run owns its stream on a
// dedicated thread. The thread looks the device up again by index, builds
// the input stream, forwards converted frames into a tokio channel and
// parks until it is told to stop. Dropping the stream closes the channel.

use anyhow::{bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::backend::{downmix_to_mono, AudioBackend, AudioBackendConfig, AudioFrame};

/// Frames buffered between the driver callback and the writer
const FRAME_CHANNEL_CAPACITY: usize = 256;

/// An enumerated capture device
#[derive(Debug, Clone, Serialize)]
pub struct InputDevice {
    /// Position in the host's input device list
    pub index: usize,
    /// Product name reported by the driver
    pub name: String,
    /// Whether this is the host's default input
    pub is_default: bool,
}

/// List the capture devices of the default host
pub fn list_input_devices() -> Result<Vec<InputDevice>> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let devices = host
        .input_devices()
        .context("Failed to enumerate input devices")?
        .enumerate()
        .map(|(index, device)| {
            let name = device
                .name()
                .unwrap_or_else(|_| format!("Input {}", index + 1));
            let is_default = default_name.as_deref() == Some(name.as_str());
            InputDevice {
                index,
                name,
                is_default,
            }
        })
        .collect();

    Ok(devices)
}

fn input_device_at(index: usize) -> Result<cpal::Device> {
    let host = cpal::default_host();
    host.input_devices()
        .context("Failed to enumerate input devices")?
        .nth(index)
        .with_context(|| format!("No input device at index {}", index))
}

/// Pick a stream configuration that runs at exactly the target rate
fn select_stream_config(
    device: &cpal::Device,
    config: &AudioBackendConfig,
) -> Result<(StreamConfig, SampleFormat)> {
    let rate = config.target_sample_rate;
    let target_channels = config.target_channels;

    let mut best: Option<cpal::SupportedStreamConfigRange> = None;

    for range in device
        .supported_input_configs()
        .context("Failed to query supported input configs")?
    {
        if !matches!(
            range.sample_format(),
            SampleFormat::I16 | SampleFormat::U16 | SampleFormat::F32
        ) {
            continue;
        }
        if range.min_sample_rate().0 > rate || range.max_sample_rate().0 < rate {
            continue;
        }
        // Anything with more channels can be mixed down to mono
        if range.channels() != target_channels && target_channels != 1 {
            continue;
        }

        let is_better = match &best {
            None => true,
            Some(current) => {
                let exact = range.channels() == target_channels;
                let current_exact = current.channels() == target_channels;
                (exact && !current_exact)
                    || (exact == current_exact && range.channels() < current.channels())
            }
        };
        if is_better {
            best = Some(range);
        }
    }

    let range = best.with_context(|| {
        format!(
            "Device does not support {}Hz capture with {} channel(s)",
            rate, target_channels
        )
    })?;

    let stream_config = StreamConfig {
        channels: range.channels(),
        sample_rate: SampleRate(rate),
        buffer_size: cpal::BufferSize::Default,
    };

    Ok((stream_config, range.sample_format()))
}

/// Capture backend for a cpal input device
pub struct CpalBackend {
    device_index: usize,
    device_name: String,
    config: AudioBackendConfig,
    stream_config: StreamConfig,
    sample_format: SampleFormat,
    capturing: bool,
    stop_tx: Option<std_mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
    stream_error: Arc<Mutex<Option<String>>>,
    /// Per-channel samples delivered since the backend was created
    delivered: Arc<AtomicU64>,
}

impl CpalBackend {
    /// Open the input device at `device_index`
    ///
    /// Fails if the device does not exist or cannot capture at the
    /// configured sample rate.
    pub fn new(device_index: usize, config: AudioBackendConfig) -> Result<Self> {
        let device = input_device_at(device_index)?;
        let device_name = device
            .name()
            .unwrap_or_else(|_| format!("Input {}", device_index + 1));

        let (stream_config, sample_format) = select_stream_config(&device, &config)
            .with_context(|| format!("Cannot open input device '{}'", device_name))?;

        info!(
            "Input device '{}' opened ({}Hz, {} channels, {:?})",
            device_name, stream_config.sample_rate.0, stream_config.channels, sample_format
        );

        Ok(Self {
            device_index,
            device_name,
            config,
            stream_config,
            sample_format,
            capturing: false,
            stop_tx: None,
            thread: None,
            stream_error: Arc::new(Mutex::new(None)),
            delivered: Arc::new(AtomicU64::new(0)),
        })
    }
}

#[async_trait::async_trait]
impl AudioBackend for CpalBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.capturing {
            bail!("Already capturing");
        }

        info!("Starting capture on '{}'", self.device_name);

        let (frame_tx, frame_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel();

        let capture = CaptureThread {
            device_index: self.device_index,
            stream_config: self.stream_config.clone(),
            sample_format: self.sample_format,
            target_channels: self.config.target_channels,
            stream_error: Arc::clone(&self.stream_error),
            delivered: Arc::clone(&self.delivered),
        };

        let handle = thread::Builder::new()
            .name("call-capture-input".to_string())
            .spawn(move || capture.run(frame_tx, ready_tx, stop_rx))
            .context("Failed to spawn capture thread")?;

        match ready_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e.context(format!("Failed to start capture on '{}'", self.device_name)));
            }
            Err(_) => {
                let _ = handle.join();
                bail!("Capture thread exited before the stream started");
            }
        }

        self.stop_tx = Some(stop_tx);
        self.thread = Some(handle);
        self.capturing = true;

        Ok(frame_rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if !self.capturing {
            return Ok(());
        }

        info!("Stopping capture on '{}'", self.device_name);

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(handle) = self.thread.take() {
            let joined = tokio::task::spawn_blocking(move || handle.join())
                .await
                .context("Failed to join capture thread")?;
            if joined.is_err() {
                error!("Capture thread panicked");
            }
        }

        self.capturing = false;

        let stream_error = self
            .stream_error
            .lock()
            .map(|mut slot| slot.take())
            .unwrap_or(None);

        if let Some(e) = stream_error {
            bail!("Audio stream error on '{}': {}", self.device_name, e);
        }

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        &self.device_name
    }
}

impl Drop for CpalBackend {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Everything the capture thread needs, moved onto it at start
struct CaptureThread {
    device_index: usize,
    stream_config: StreamConfig,
    sample_format: SampleFormat,
    target_channels: u16,
    stream_error: Arc<Mutex<Option<String>>>,
    delivered: Arc<AtomicU64>,
}

impl CaptureThread {
    fn run(
        self,
        frame_tx: mpsc::Sender<AudioFrame>,
        ready_tx: oneshot::Sender<Result<()>>,
        stop_rx: std_mpsc::Receiver<()>,
    ) {
        let stream = match self.open_stream(frame_tx) {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };

        if let Err(e) = stream.play() {
            let _ = ready_tx.send(Err(anyhow::anyhow!("Failed to start stream: {}", e)));
            return;
        }

        let _ = ready_tx.send(Ok(()));

        // Blocks until stop() or the backend is dropped
        let _ = stop_rx.recv();

        drop(stream);
        debug!("Capture thread for device {} finished", self.device_index);
    }

    fn open_stream(&self, frame_tx: mpsc::Sender<AudioFrame>) -> Result<cpal::Stream> {
        let device = input_device_at(self.device_index)?;

        match self.sample_format {
            SampleFormat::I16 => self.build_stream::<i16>(&device, frame_tx),
            SampleFormat::U16 => self.build_stream::<u16>(&device, frame_tx),
            SampleFormat::F32 => self.build_stream::<f32>(&device, frame_tx),
            other => bail!("Unsupported sample format: {:?}", other),
        }
    }

    fn build_stream<T>(
        &self,
        device: &cpal::Device,
        frame_tx: mpsc::Sender<AudioFrame>,
    ) -> Result<cpal::Stream>
    where
        T: cpal::SizedSample + Send + 'static,
        i16: cpal::FromSample<T>,
    {
        let device_channels = self.stream_config.channels;
        let sample_rate = self.stream_config.sample_rate.0;
        let output_channels = self.target_channels;
        let delivered = Arc::clone(&self.delivered);
        let stream_error = Arc::clone(&self.stream_error);

        let on_data = move |data: &[T], _: &cpal::InputCallbackInfo| {
            let pcm: Vec<i16> = data
                .iter()
                .map(|&sample| cpal::Sample::to_sample::<i16>(sample))
                .collect();

            let samples = if device_channels != output_channels {
                downmix_to_mono(&pcm, device_channels)
            } else {
                pcm
            };

            let frames = (samples.len() / output_channels.max(1) as usize) as u64;
            let position = delivered.fetch_add(frames, Ordering::SeqCst);

            let frame = AudioFrame {
                samples,
                sample_rate,
                channels: output_channels,
                timestamp_ms: position * 1000 / sample_rate as u64,
            };

            if let Err(mpsc::error::TrySendError::Full(_)) = frame_tx.try_send(frame) {
                warn!("Capture buffer full, dropping frame");
            }
        };

        let on_error = move |err: cpal::StreamError| {
            error!("Audio stream error: {}", err);
            if let Ok(mut slot) = stream_error.lock() {
                *slot = Some(err.to_string());
            }
        };

        let stream = device
            .build_input_stream(&self.stream_config, on_data, on_error, None)
            .context("Failed to build input stream")?;

        Ok(stream)
    }
}
