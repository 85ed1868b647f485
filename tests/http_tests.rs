// HTTP API tests
//
// Requests go straight through the router with `oneshot`; no socket is bound.

mod common;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use call_capture::{create_router, AppSettings, AppState, CallCapture};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn router(dir: &TempDir) -> Result<Router> {
    let app = CallCapture::new(AppSettings::new(dir.path()))?;
    Ok(create_router(AppState::new(app)))
}

async fn send(router: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).to_string())
        })
    };
    Ok((status, body))
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let dir = TempDir::new()?;
    let router = router(&dir)?;

    let (status, body) = send(&router, get("/health")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".into()));
    Ok(())
}

#[tokio::test]
async fn test_formats_marks_mp3_unsupported() -> Result<()> {
    let dir = TempDir::new()?;
    let router = router(&dir)?;

    let (status, body) = send(&router, get("/formats")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "format": "wav", "label": "WAV", "supported": true },
            { "format": "mp3", "label": "MP3", "supported": false },
        ])
    );
    Ok(())
}

#[tokio::test]
async fn test_start_mp3_is_bad_request() -> Result<()> {
    let dir = TempDir::new()?;
    let router = router(&dir)?;

    let (status, body) = send(
        &router,
        post_json("/recording/start", json!({ "format": "mp3" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("MP3"));
    Ok(())
}

#[tokio::test]
async fn test_idle_transitions() -> Result<()> {
    let dir = TempDir::new()?;
    let router = router(&dir)?;

    let (status, body) = send(&router, get("/recording/status")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "idle");
    assert_eq!(body["file_path"], Value::Null);

    let (status, body) = send(&router, post_json("/recording/pause", json!({}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "idle", "changed": false }));

    let (status, body) = send(&router, post_json("/recording/stop", json!({}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recording"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn test_recordings_search_and_delete() -> Result<()> {
    let dir = TempDir::new()?;
    let source = TempDir::new()?;
    let alice = common::call_fixture(source.path(), "alice_call.wav")?;
    let bob = common::call_fixture(source.path(), "bob_meeting.wav")?;
    let router = router(&dir)?;

    let (status, body) = send(
        &router,
        post_json("/recordings/import", json!({ "paths": [alice, bob] })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imported"].as_array().unwrap().len(), 2);

    let (status, body) = send(&router, get("/recordings?q=CALL")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    let imported_alice = dir.path().join("alice_call.wav");
    assert_eq!(body["recordings"], json!([imported_alice]));

    let (status, body) = send(
        &router,
        post_json("/recordings/delete", json!({ "path": imported_alice })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "file_removed": true, "entry_removed": true }));
    assert!(!imported_alice.exists());

    let (_, body) = send(&router, get("/recordings")).await?;
    assert_eq!(body["count"], 1);
    Ok(())
}

#[tokio::test]
async fn test_delete_unknown_is_not_found() -> Result<()> {
    let dir = TempDir::new()?;
    let router = router(&dir)?;

    let (status, body) = send(
        &router,
        post_json(
            "/recordings/delete",
            json!({ "path": dir.path().join("nope.wav") }),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_play_missing_file_is_not_found() -> Result<()> {
    let dir = TempDir::new()?;
    let router = router(&dir)?;

    let (status, _) = send(
        &router,
        post_json(
            "/recordings/play",
            json!({ "path": dir.path().join("nope.wav") }),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_import_missing_file_fails() -> Result<()> {
    let dir = TempDir::new()?;
    let router = router(&dir)?;

    let (status, body) = send(
        &router,
        post_json(
            "/recordings/import",
            json!({ "paths": [dir.path().join("missing.wav")] }),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("missing.wav"));
    Ok(())
}

#[tokio::test]
async fn test_export_logs_and_recordings() -> Result<()> {
    let dir = TempDir::new()?;
    let source = TempDir::new()?;
    let dest = TempDir::new()?;
    let call = common::call_fixture(source.path(), "call.wav")?;
    let router = router(&dir)?;

    send(
        &router,
        post_json("/recordings/import", json!({ "paths": [call] })),
    )
    .await?;

    let (status, body) = send(&router, post_json("/logs/export", json!({}))).await?;
    assert_eq!(status, StatusCode::OK);
    let log_path = std::path::PathBuf::from(body["path"].as_str().unwrap());
    assert_eq!(log_path.parent(), Some(dir.path()));
    let text = std::fs::read_to_string(&log_path)?;
    assert_eq!(text.trim_end(), dir.path().join("call.wav").to_string_lossy().as_ref());

    let (status, body) = send(
        &router,
        post_json("/recordings/export", json!({ "dest_folder": dest.path() })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exported"], json!([dest.path().join("call.wav")]));
    assert!(dest.path().join("call.wav").is_file());
    Ok(())
}

#[tokio::test]
async fn test_volume_is_clamped() -> Result<()> {
    let dir = TempDir::new()?;
    let router = router(&dir)?;

    let (status, body) = send(&router, get("/playback/volume")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "volume": 1.0 }));

    let (_, body) = send(&router, post_json("/playback/volume", json!({ "volume": 0.25 }))).await?;
    assert_eq!(body, json!({ "volume": 0.25 }));

    let (_, body) = send(&router, post_json("/playback/volume", json!({ "volume": 3.0 }))).await?;
    assert_eq!(body, json!({ "volume": 1.0 }));

    let (_, body) = send(&router, get("/playback/volume")).await?;
    assert_eq!(body, json!({ "volume": 1.0 }));
    Ok(())
}

#[tokio::test]
async fn test_recording_info() -> Result<()> {
    let dir = TempDir::new()?;
    let path = common::call_fixture(dir.path(), "Recording_20240305_141500.wav")?;
    let router = router(&dir)?;

    let uri = format!("/recordings/info?path={}", path.display());
    let (status, body) = send(&router, get(&uri)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sample_rate"], 44100);
    assert_eq!(body["channels"], 1);
    assert_eq!(body["format"], "wav");
    assert_eq!(body["duration_secs"], 0.5);
    assert_eq!(body["created_at"], "2024-03-05T14:15:00");

    let (status, _) = send(&router, get("/recordings/info?path=/nonexistent.wav")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
