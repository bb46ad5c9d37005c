/// Offline analysis of recorded landmark frames
///
/// Video decoding and pose estimation happen upstream; this service takes the
/// resulting per-frame landmarks and runs them through the same rep counter
/// used for live sessions.

use crate::config::TrackerConfig;
use crate::models::{ExerciseType, FrameObservation, JointSide, PatientInfo, SessionOptions, SessionSummary};
use crate::services::errors::TrackerError;
use crate::services::frame_clock::{FrameClock, DEFAULT_FPS};
use crate::services::rep_counter::RepCounter;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A recording submitted for analysis
#[derive(Debug, Clone, Deserialize)]
pub struct RecordingRequest {
    #[serde(alias = "exercise_key")]
    pub exercise: ExerciseType,
    pub frames: Vec<FrameObservation>,
    #[serde(flatten)]
    pub patient: PatientInfo,
    #[serde(default)]
    pub assigned_reps: Option<u32>,
    #[serde(default = "default_sets")]
    pub sets: u32,
    /// Used to derive timestamps when frames carry none
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub side: Option<JointSide>,
}

fn default_sets() -> u32 {
    1
}

/// Result of a recording analysis
///
/// A recording is counted as one continuous set, so `sets` and `reps_per_set`
/// in the summary describe what was performed. The prescription is echoed in
/// `assigned_reps` and `assigned_sets`.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingAnalysis {
    #[serde(flatten)]
    pub summary: SessionSummary,
    pub assigned_sets: u32,
    pub patient_name: String,
    pub patient_id: String,
    pub total_frames: u64,
    pub frames_with_pose: u64,
    pub frames_skipped: u64,
}

/// Analyze a recorded sequence of frames
pub fn analyze_recording(
    request: RecordingRequest,
    config: &TrackerConfig,
) -> Result<RecordingAnalysis, TrackerError> {
    if request.frames.is_empty() {
        return Err(TrackerError::InvalidRecording(
            "recording contains no frames".to_string(),
        ));
    }

    let fps = request.fps.unwrap_or(DEFAULT_FPS);
    if !fps.is_finite() || fps <= 0.0 {
        return Err(TrackerError::InvalidRecording(format!(
            "fps must be positive, got {}",
            fps
        )));
    }

    let options = SessionOptions {
        side: request.side,
        fps: Some(fps),
        ..SessionOptions::default()
    };
    let mut counter = RepCounter::new(&request.exercise, options, config)?;
    let mut clock = FrameClock::offline(Some(fps));

    let total_frames = request.frames.len() as u64;
    let frames_with_pose = request.frames.iter().filter(|f| f.has_pose()).count() as u64;

    for mut frame in request.frames {
        clock.stamp(&mut frame);
        counter.observe(&frame);
    }

    let frames_skipped = counter.snapshot().frames_skipped;
    let mut summary = counter.finish();
    summary.assigned_reps = request.assigned_reps;

    info!(
        exercise = %summary.exercise,
        reps = summary.reps,
        total_frames,
        "Recording analyzed"
    );

    Ok(RecordingAnalysis {
        summary,
        assigned_sets: request.sets.max(1),
        patient_name: request.patient.patient_name,
        patient_id: request.patient.patient_id,
        total_frames,
        frames_with_pose,
        frames_skipped,
    })
}
