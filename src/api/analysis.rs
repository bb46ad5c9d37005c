use anyhow::Context;
use axum::{
    extract::State,
    response::Json,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::errors::ApiError;
use super::routes::AppState;
use crate::models::{
    ExerciseType, FrameObservation, JointSide, Landmark, PatientInfo, RenderedReport,
    SessionSummary,
};
use crate::services::errors::TrackerError;
use crate::services::form_scoring::{score_angle, score_for_exercise};
use crate::services::landmark_processor::LandmarkProcessor;
use crate::services::recording_analysis_service::{analyze_recording, RecordingAnalysis, RecordingRequest};
use crate::services::threshold_table::{
    all_profiles, ideal_range_for, profile_for, ExerciseProfile, IdealRange,
};

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    #[serde(alias = "exercise_key")]
    pub exercise: ExerciseType,
    pub angle: f64,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub exercise: ExerciseType,
    pub angle: f64,
    pub score: f64,
    pub ideal_range: IdealRange,
}

#[derive(Debug, Deserialize)]
pub struct FrameAnalysisRequest {
    #[serde(alias = "exercise_key")]
    pub exercise: ExerciseType,
    pub frame: FrameObservation,
    #[serde(default)]
    pub side: Option<JointSide>,
}

#[derive(Debug, Serialize)]
pub struct FrameAnalysis {
    pub exercise: ExerciseType,
    pub angle: Option<f64>,
    pub score: Option<f64>,
    /// Only the landmarks the exercise measures
    pub landmarks: Vec<Landmark>,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub summary: SessionSummary,
    #[serde(flatten)]
    pub patient: PatientInfo,
}

/// The threshold table
pub async fn list_exercises() -> Json<&'static [ExerciseProfile]> {
    Json(all_profiles())
}

/// Score a single peak angle; unknown exercises use the default range
pub async fn score_angle_handler(
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, ApiError> {
    if !request.angle.is_finite() {
        return Err(ApiError::InvalidRequest("angle must be a finite number".to_string()));
    }

    let ideal_range = ideal_range_for(&request.exercise);
    Ok(Json(ScoreResponse {
        score: score_angle(request.angle, ideal_range),
        exercise: request.exercise,
        angle: request.angle,
        ideal_range,
    }))
}

/// Measure the exercise's joint angle in a single frame without any session state
pub async fn analyze_frame(
    State(state): State<AppState>,
    Json(request): Json<FrameAnalysisRequest>,
) -> Result<Json<FrameAnalysis>, ApiError> {
    let profile = profile_for(&request.exercise)
        .ok_or_else(|| TrackerError::UnsupportedExercise(request.exercise.to_string()))?;

    let processor = LandmarkProcessor::new().with_min_visibility(state.tracker.min_visibility);
    let side = request.side.unwrap_or(profile.default_side);
    let angle = processor.measure(&request.frame, &profile.joints, side);

    let mut frame = request.frame;
    frame.retain_only(&profile.joints.all_landmarks());

    Ok(Json(FrameAnalysis {
        score: angle.map(|angle| score_for_exercise(&request.exercise, angle)),
        exercise: request.exercise,
        angle,
        landmarks: frame.landmarks,
    }))
}

/// Count reps and score form over a recorded landmark sequence
pub async fn analyze_recording_handler(
    State(state): State<AppState>,
    Json(request): Json<RecordingRequest>,
) -> Result<Json<RecordingAnalysis>, ApiError> {
    info!(
        exercise = %request.exercise,
        frames = request.frames.len(),
        "Recording analysis requested"
    );

    let config = state.tracker.clone();
    let analysis = tokio::task::spawn_blocking(move || analyze_recording(request, &config))
        .await
        .context("Recording analysis task failed")??;

    Ok(Json(analysis))
}

/// Render a report from a summary produced elsewhere
pub async fn create_report(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<RenderedReport>, ApiError> {
    Ok(Json(state.reports.generate(&request.summary, &request.patient)))
}

pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/analysis/frame", post(analyze_frame))
        .route("/analysis/recording", post(analyze_recording_handler))
        .route("/reports", post(create_report))
}
