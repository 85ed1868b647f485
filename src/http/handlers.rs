use super::state::AppState;
use crate::audio::{self, AudioFormat, AudioSource};
use crate::calllog::{DeleteOutcome, Recording};
use crate::session::{SessionError, SessionState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StartRecordingRequest {
    /// Capture device index (default: first device)
    pub device_index: Option<usize>,

    /// Output format (default: configured format)
    pub format: Option<AudioFormat>,
}

#[derive(Debug, Serialize)]
pub struct StartRecordingResponse {
    pub status: SessionState,
    pub file_path: PathBuf,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub status: SessionState,
    /// False when the request was a no-op in the current state
    pub changed: bool,
}

#[derive(Debug, Serialize)]
pub struct StopRecordingResponse {
    pub status: SessionState,
    pub message: String,
    pub recording: Option<Recording>,
}

#[derive(Debug, Serialize)]
pub struct FormatInfo {
    pub format: AudioFormat,
    pub label: String,
    pub supported: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordingsResponse {
    pub count: usize,
    pub recordings: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct PathRequest {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub dest_folder: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub dest_folder: PathBuf,
    pub exported: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct ExportLogsResponse {
    pub path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VolumeBody {
    pub volume: f32,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn session_error_response(e: SessionError) -> Response {
    let status = match &e {
        SessionError::AlreadyRecording => StatusCode::CONFLICT,
        SessionError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
        SessionError::DeviceOpen(_) | SessionError::Capture(_) | SessionError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error!("Recording request failed: {}", e);
    error_response(status, e.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /devices
/// Enumerate capture devices
pub async fn list_devices() -> Response {
    match tokio::task::spawn_blocking(audio::list_input_devices).await {
        Ok(Ok(devices)) => (StatusCode::OK, Json(devices)).into_response(),
        Ok(Err(e)) => {
            error!("Failed to list devices: {:#}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to list devices: {:#}", e),
            )
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// GET /formats
/// Formats offered for new recordings
pub async fn list_formats(State(state): State<AppState>) -> impl IntoResponse {
    let formats: Vec<FormatInfo> = state
        .app
        .formats()
        .iter()
        .map(|&format| FormatInfo {
            format,
            label: format.to_string(),
            supported: format.is_supported(),
        })
        .collect();

    (StatusCode::OK, Json(formats))
}

/// POST /recording/start
/// Start recording from a capture device
pub async fn start_recording(
    State(state): State<AppState>,
    Json(req): Json<StartRecordingRequest>,
) -> Response {
    let device_index = req.device_index.unwrap_or(0);
    let format = req.format.unwrap_or(state.app.settings().default_format);

    info!("Starting recording on device {} ({})", device_index, format);

    match state
        .app
        .start_recording(AudioSource::Device(device_index), format)
        .await
    {
        Ok(file_path) => (
            StatusCode::OK,
            Json(StartRecordingResponse {
                status: SessionState::Recording,
                message: format!("Recording to {}", file_path.display()),
                file_path,
            }),
        )
            .into_response(),
        Err(e) => session_error_response(e),
    }
}

/// POST /recording/pause
pub async fn pause_recording(State(state): State<AppState>) -> Response {
    match state.app.pause_recording().await {
        Ok(changed) => transition_response(&state, changed).await,
        Err(e) => session_error_response(e),
    }
}

/// POST /recording/resume
pub async fn resume_recording(State(state): State<AppState>) -> Response {
    match state.app.resume_recording().await {
        Ok(changed) => transition_response(&state, changed).await,
        Err(e) => session_error_response(e),
    }
}

async fn transition_response(state: &AppState, changed: bool) -> Response {
    let status = state.app.status().await.state;
    (StatusCode::OK, Json(TransitionResponse { status, changed })).into_response()
}

/// POST /recording/stop
/// Stop recording and add the file to the call log
pub async fn stop_recording(State(state): State<AppState>) -> Response {
    match state.app.stop_recording().await {
        Ok(recording) => {
            let message = match &recording {
                Some(r) => format!("Recording saved to {}", r.path.display()),
                None => "No recording was active".to_string(),
            };
            let status = state.app.status().await.state;
            (
                StatusCode::OK,
                Json(StopRecordingResponse {
                    status,
                    message,
                    recording,
                }),
            )
                .into_response()
        }
        Err(e) => session_error_response(e),
    }
}

/// GET /recording/status
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.app.status().await))
}

/// GET /recordings?q=
/// List the call log, optionally filtered by a case-insensitive substring
pub async fn list_recordings(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let recordings = state
        .app
        .recordings(query.q.as_deref().unwrap_or(""))
        .await;

    (
        StatusCode::OK,
        Json(RecordingsResponse {
            count: recordings.len(),
            recordings,
        }),
    )
}

/// GET /recordings/info?path=
/// Header facts of one recording
pub async fn describe_recording(
    State(state): State<AppState>,
    Query(req): Query<PathRequest>,
) -> Response {
    if !req.path.is_file() {
        return error_response(
            StatusCode::NOT_FOUND,
            format!("{} does not exist", req.path.display()),
        );
    }

    match state.app.describe(&req.path) {
        Ok(recording) => (StatusCode::OK, Json(recording)).into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, format!("{:#}", e)),
    }
}

/// POST /recordings/delete
pub async fn delete_recording(
    State(state): State<AppState>,
    Json(req): Json<PathRequest>,
) -> Response {
    match state.app.delete_recording(&req.path).await {
        Ok(outcome) if outcome == DeleteOutcome::default() => error_response(
            StatusCode::NOT_FOUND,
            format!("{} is neither on disk nor in the call log", req.path.display()),
        ),
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => {
            error!("Failed to delete {}: {:#}", req.path.display(), e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
        }
    }
}

/// POST /recordings/play
/// Start playback in the background
pub async fn play_recording(
    State(state): State<AppState>,
    Json(req): Json<PathRequest>,
) -> Response {
    if !req.path.is_file() {
        return error_response(
            StatusCode::NOT_FOUND,
            format!("{} does not exist", req.path.display()),
        );
    }

    let app = state.app.clone();
    let path = req.path.clone();
    tokio::spawn(async move {
        if let Err(e) = app.play(&path).await {
            error!("Playback of {} failed: {:#}", path.display(), e);
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "status": "playing",
            "path": req.path,
        })),
    )
        .into_response()
}

/// POST /recordings/import
/// Copy files into the recordings folder and log them
pub async fn import_recordings(
    State(state): State<AppState>,
    Json(req): Json<ImportRequest>,
) -> Response {
    match state.app.import_recordings(&req.paths).await {
        Ok(imported) => (StatusCode::OK, Json(ImportResponse { imported })).into_response(),
        Err(e) => {
            error!("Import failed: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
        }
    }
}

/// POST /recordings/export
/// Copy every logged recording into a folder
pub async fn export_recordings(
    State(state): State<AppState>,
    Json(req): Json<ExportRequest>,
) -> Response {
    match state.app.export_recordings(&req.dest_folder).await {
        Ok(exported) => (
            StatusCode::OK,
            Json(ExportResponse {
                dest_folder: req.dest_folder,
                exported,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Export failed: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
        }
    }
}

/// POST /logs/export
/// Write the call log to CallLogs_<timestamp>.txt
pub async fn export_logs(State(state): State<AppState>) -> Response {
    match state.app.export_logs().await {
        Ok(path) => (StatusCode::OK, Json(ExportLogsResponse { path })).into_response(),
        Err(e) => {
            error!("Log export failed: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
        }
    }
}

/// GET /playback/volume
pub async fn get_volume(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(VolumeBody {
            volume: state.app.player().volume(),
        }),
    )
}

/// POST /playback/volume
pub async fn set_volume(
    State(state): State<AppState>,
    Json(req): Json<VolumeBody>,
) -> impl IntoResponse {
    let volume = state.app.set_volume(req.volume);
    (StatusCode::OK, Json(VolumeBody { volume }))
}
