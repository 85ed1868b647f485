use crate::app::CallCapture;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub app: Arc<CallCapture>,
}

impl AppState {
    pub fn new(app: CallCapture) -> Self {
        Self { app: Arc::new(app) }
    }
}
