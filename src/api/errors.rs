use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::services::TrackerError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unsupported exercise: {0}")]
    UnsupportedExercise(String),
    #[error("Session not found")]
    SessionNotFound,
    #[error("{0}")]
    InvalidTransition(String),
    #[error("Live capture is not available")]
    CaptureUnavailable,
    #[error("No capture is running")]
    CaptureNotRunning,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::UnsupportedExercise(exercise) => ApiError::UnsupportedExercise(exercise),
            TrackerError::SessionNotFound(_) => ApiError::SessionNotFound,
            TrackerError::InvalidTransition(msg) => ApiError::InvalidTransition(msg),
            TrackerError::CaptureUnavailable => ApiError::CaptureUnavailable,
            TrackerError::CaptureNotRunning => ApiError::CaptureNotRunning,
            TrackerError::InvalidRecording(msg) => ApiError::InvalidRequest(msg),
            TrackerError::Internal(e) => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::UnsupportedExercise(_) => (StatusCode::BAD_REQUEST, "Unsupported exercise"),
            ApiError::SessionNotFound => (StatusCode::NOT_FOUND, "Session not found"),
            ApiError::InvalidTransition(_) => (StatusCode::CONFLICT, "Invalid session transition"),
            ApiError::CaptureUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "Capture unavailable"),
            ApiError::CaptureNotRunning => (StatusCode::CONFLICT, "Capture not running"),
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "Invalid request"),
            ApiError::Internal(e) => {
                error!("Internal error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
