use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::errors::ApiError;
use super::routes::AppState;
use crate::models::{
    ExerciseType, FrameObservation, PatientInfo, RenderedReport, SessionOptions, SessionSnapshot,
    SessionSummary,
};

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(alias = "exercise_key")]
    pub exercise: ExerciseType,
    #[serde(flatten)]
    pub options: SessionOptions,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub state: SessionSnapshot,
}

/// A single frame or a batch of frames
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FramePayload {
    Batch { frames: Vec<FrameObservation> },
    Single(FrameObservation),
}

impl FramePayload {
    fn into_frames(self) -> Vec<FrameObservation> {
        match self {
            FramePayload::Batch { frames } => frames,
            FramePayload::Single(frame) => vec![frame],
        }
    }
}

/// Open a client-fed tracking session
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let (session_id, snapshot) = state
        .sessions
        .create(&request.exercise, request.options)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id,
            state: snapshot,
        }),
    ))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(state.sessions.snapshot(id).await?))
}

/// Feed frames to a session and return its updated state
pub async fn ingest_frames(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FramePayload>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let snapshot = state.sessions.ingest(id, payload.into_frames()).await?;
    Ok(Json(snapshot))
}

pub async fn next_set(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(state.sessions.next_set(id).await?))
}

/// Finish a session; the summary is returned and the session is dropped
pub async fn finish_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>, ApiError> {
    let summary = state.sessions.finish(id).await?;
    Ok(Json(summary))
}

pub async fn session_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patient): Json<PatientInfo>,
) -> Result<Json<RenderedReport>, ApiError> {
    let summary = state.sessions.summary(id).await?;
    info!(session_id = %id, "Building report for session");
    Ok(Json(state.reports.generate(&summary, &patient)))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/:id", get(get_session).delete(finish_session))
        .route("/:id/frames", post(ingest_frames))
        .route("/:id/next-set", post(next_set))
        .route("/:id/report", post(session_report))
}
