use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use super::errors::ApiError;
use super::routes::AppState;
use crate::models::{ExerciseType, SessionOptions, SessionSnapshot, SessionSummary};

#[derive(Debug, Deserialize)]
pub struct StartCaptureRequest {
    #[serde(alias = "exercise_key")]
    pub exercise: ExerciseType,
    #[serde(flatten)]
    pub options: SessionOptions,
}

#[derive(Debug, Serialize)]
pub struct CaptureData {
    pub running: bool,
    #[serde(flatten)]
    pub state: SessionSnapshot,
}

/// Start the background capture loop, replacing any running capture
pub async fn start_capture(
    State(state): State<AppState>,
    Json(request): Json<StartCaptureRequest>,
) -> Result<Json<CaptureData>, ApiError> {
    let snapshot = state
        .capture
        .start(&request.exercise, request.options)
        .await?;

    Ok(Json(CaptureData {
        running: true,
        state: snapshot,
    }))
}

pub async fn stop_capture(State(state): State<AppState>) -> Result<Json<SessionSummary>, ApiError> {
    Ok(Json(state.capture.stop().await?))
}

/// Latest capture state
pub async fn capture_data(State(state): State<AppState>) -> Result<Json<CaptureData>, ApiError> {
    let snapshot = state.capture.snapshot().await?;
    Ok(Json(CaptureData {
        running: state.capture.is_running().await,
        state: snapshot,
    }))
}

pub async fn capture_next_set(
    State(state): State<AppState>,
) -> Result<Json<CaptureData>, ApiError> {
    state.capture.next_set().await?;
    capture_data(State(state)).await
}

pub fn capture_routes() -> Router<AppState> {
    Router::new()
        .route("/start", post(start_capture))
        .route("/stop", post(stop_capture))
        .route("/data", get(capture_data))
        .route("/next-set", post(capture_next_set))
}
