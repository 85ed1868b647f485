//! Managed recordings folder and file naming
//!
//! Recordings are named `Recording_<yyyyMMdd_HHmmss>.wav` and exported logs
//! `CallLogs_<yyyyMMdd_HHmmss>.txt`.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::audio::AudioFormat;

const RECORDING_PREFIX: &str = "Recording_";
const LOG_EXPORT_PREFIX: &str = "CallLogs_";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Default folder for recordings: ~/CallRecordings
pub fn default_recordings_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("CallRecordings")
}

/// Create the recordings folder if it doesn't exist
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))
}

pub fn recording_file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}{}.{}",
        RECORDING_PREFIX,
        at.format(TIMESTAMP_FORMAT),
        AudioFormat::Wav.extension()
    )
}

pub fn log_export_file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}{}.txt", LOG_EXPORT_PREFIX, at.format(TIMESTAMP_FORMAT))
}

/// Path for a new recording in `dir`
///
/// Two recordings started within the same second get `_2`, `_3`, ...
/// suffixes instead of overwriting each other.
pub fn new_recording_path(dir: &Path, at: &DateTime<Local>) -> PathBuf {
    let first = dir.join(recording_file_name(at));
    if !first.exists() {
        return first;
    }

    let stem = format!("{}{}", RECORDING_PREFIX, at.format(TIMESTAMP_FORMAT));
    (2..)
        .map(|n| dir.join(format!("{}_{}.{}", stem, n, AudioFormat::Wav.extension())))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

/// Recover the creation time encoded in a recording's filename
pub fn parse_recording_timestamp(path: &Path) -> Option<NaiveDateTime> {
    let stem = path.file_stem()?.to_str()?;
    let rest = stem.strip_prefix(RECORDING_PREFIX)?;
    // yyyyMMdd_HHmmss, possibly followed by a _n collision suffix
    let stamp = rest.get(..15)?;
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

/// List `*.wav` files in `dir`, sorted by name
pub fn list_recordings(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|ext| ext.eq_ignore_ascii_case(AudioFormat::Wav.extension()))
                    .unwrap_or(false)
        })
        .collect();

    files.sort();
    Ok(files)
}

/// Free bytes available to the current user on the volume holding `dir`
#[cfg(unix)]
pub fn available_space(dir: &Path) -> Option<u64> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(dir.as_os_str().as_bytes()).ok()?;
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    // SAFETY: c_path is NUL-terminated and stat is a valid out-pointer
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return None;
    }
    Some(stat.f_bavail as u64 * stat.f_frsize as u64)
}

#[cfg(not(unix))]
pub fn available_space(_dir: &Path) -> Option<u64> {
    None
}

/// Warn when the recordings volume is low on space
///
/// Returns true when a warning was issued.
pub fn check_disk_space(dir: &Path, threshold_bytes: u64) -> bool {
    match available_space(dir) {
        Some(free) if free < threshold_bytes => {
            warn!(
                "Low disk space: {} MB free on the volume holding {} (threshold {} MB)",
                free / 1_000_000,
                dir.display(),
                threshold_bytes / 1_000_000
            );
            true
        }
        Some(free) => {
            info!("{} MB free for recordings", free / 1_000_000);
            false
        }
        None => false,
    }
}
