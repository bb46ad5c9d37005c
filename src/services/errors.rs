use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Exercise has no threshold profile: {0}")]
    UnsupportedExercise(String),
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),
    #[error("Invalid session transition: {0}")]
    InvalidTransition(String),
    #[error("No pose source configured for live capture")]
    CaptureUnavailable,
    #[error("No capture is running")]
    CaptureNotRunning,
    #[error("Invalid recording: {0}")]
    InvalidRecording(String),
    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}
