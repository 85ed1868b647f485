use anyhow::{Context, Result};
use call_capture::{create_router, AppSettings, AppState, AudioFormat, AudioSource, CallCapture, Config};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "call-capture")]
#[command(about = "Record, play back and manage call recordings")]
struct Args {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config/call-capture")]
    config: String,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP control API (default)
    Serve,

    /// List capture devices
    Devices,

    /// Record from a device for a fixed time (Ctrl+C stops early)
    Record {
        /// Capture device index
        #[arg(short, long, default_value = "0")]
        device: usize,

        /// Duration to record in seconds
        #[arg(short = 't', long, default_value = "30")]
        duration: u64,

        /// Output format
        #[arg(short, long)]
        format: Option<AudioFormat>,
    },

    /// Play a recording
    Play {
        path: PathBuf,

        /// Volume between 0.0 and 1.0
        #[arg(long)]
        volume: Option<f32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let cfg = Config::load(&args.config)?;
    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&cfg).await,
        Command::Devices => list_devices(),
        Command::Record {
            device,
            duration,
            format,
        } => record(&cfg, device, duration, format).await,
        Command::Play { path, volume } => play(&cfg, path, volume).await,
    }
}

async fn serve(cfg: &Config) -> Result<()> {
    let app = CallCapture::new(AppSettings::from(cfg))?;
    let router = create_router(AppState::new(app));

    let addr = cfg.http_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP API listening on {}", addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

fn list_devices() -> Result<()> {
    let devices = call_capture::audio::list_input_devices()?;
    if devices.is_empty() {
        warn!("No capture devices found");
    }
    for device in devices {
        println!(
            "{:>3}  {}{}",
            device.index,
            device.name,
            if device.is_default { "  (default)" } else { "" }
        );
    }
    Ok(())
}

async fn record(cfg: &Config, device: usize, duration: u64, format: Option<AudioFormat>) -> Result<()> {
    let app = CallCapture::new(AppSettings::from(cfg))?;
    let format = format.unwrap_or(cfg.audio.default_format);

    let path = app.start_recording(AudioSource::Device(device), format).await?;
    info!("Recording to {} for {} seconds", path.display(), duration);

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(duration)) => {}
        _ = tokio::signal::ctrl_c() => info!("Interrupted, stopping"),
    }

    match app.stop_recording().await? {
        Some(recording) => println!(
            "{} ({:.1}s, {}Hz)",
            recording.path.display(),
            recording.duration_secs,
            recording.sample_rate
        ),
        None => warn!("Recording ended without producing a file"),
    }

    Ok(())
}

async fn play(cfg: &Config, path: PathBuf, volume: Option<f32>) -> Result<()> {
    let app = CallCapture::new(AppSettings::from(cfg))?;
    if let Some(volume) = volume {
        app.set_volume(volume);
    }

    let elapsed = app.play(&path).await?;
    info!("Played {} in {:.1}s", path.display(), elapsed.as_secs_f64());
    Ok(())
}
