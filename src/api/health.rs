use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use super::routes::AppState;

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    Ok(Json(json!({
        "status": "healthy",
        "service": "physio-coach",
        "version": env!("CARGO_PKG_VERSION"),
        "capture_available": state.capture.is_available(),
        "active_sessions": state.sessions.len().await,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
