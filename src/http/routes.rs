use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Device selection
        .route("/devices", get(handlers::list_devices))
        .route("/formats", get(handlers::list_formats))
        // Recording control
        .route("/recording/start", post(handlers::start_recording))
        .route("/recording/pause", post(handlers::pause_recording))
        .route("/recording/resume", post(handlers::resume_recording))
        .route("/recording/stop", post(handlers::stop_recording))
        .route("/recording/status", get(handlers::get_status))
        // Call log
        .route("/recordings", get(handlers::list_recordings))
        .route("/recordings/info", get(handlers::describe_recording))
        .route("/recordings/delete", post(handlers::delete_recording))
        .route("/recordings/play", post(handlers::play_recording))
        .route("/recordings/import", post(handlers::import_recordings))
        .route("/recordings/export", post(handlers::export_recordings))
        .route("/logs/export", post(handlers::export_logs))
        // Playback
        .route(
            "/playback/volume",
            get(handlers::get_volume).post(handlers::set_volume),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
