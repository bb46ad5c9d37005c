use serde::{Deserialize, Serialize};
use std::fmt;

/// Exercise types with a known threshold profile
///
/// Unrecognized keys are kept as `Other` so they can still be scored against
/// the default ideal range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExerciseType {
    BicepCurl,
    Squat,
    ShoulderAbduction,
    KneeExtension,
    LegRaise,
    SideBend,
    Other(String),
}

impl ExerciseType {
    /// All exercises with a threshold profile
    pub const KNOWN: [ExerciseType; 6] = [
        ExerciseType::BicepCurl,
        ExerciseType::Squat,
        ExerciseType::ShoulderAbduction,
        ExerciseType::KneeExtension,
        ExerciseType::LegRaise,
        ExerciseType::SideBend,
    ];

    pub fn key(&self) -> &str {
        match self {
            ExerciseType::BicepCurl => "bicep_curl",
            ExerciseType::Squat => "squat",
            ExerciseType::ShoulderAbduction => "shoulder_abduction",
            ExerciseType::KneeExtension => "knee_extension",
            ExerciseType::LegRaise => "leg_raise",
            ExerciseType::SideBend => "side_bend",
            ExerciseType::Other(key) => key,
        }
    }

    /// Human readable name for reports
    pub fn display_name(&self) -> String {
        match self {
            ExerciseType::BicepCurl => "Bicep Curl".to_string(),
            ExerciseType::Squat => "Squat".to_string(),
            ExerciseType::ShoulderAbduction => "Shoulder Abduction".to_string(),
            ExerciseType::KneeExtension => "Knee Extension".to_string(),
            ExerciseType::LegRaise => "Leg Raise".to_string(),
            ExerciseType::SideBend => "Side Bend".to_string(),
            ExerciseType::Other(key) => key.replace('_', " "),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ExerciseType::Other(_))
    }
}

impl From<&str> for ExerciseType {
    fn from(key: &str) -> Self {
        let normalized = key.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "bicep_curl" => ExerciseType::BicepCurl,
            "squat" => ExerciseType::Squat,
            "shoulder_abduction" => ExerciseType::ShoulderAbduction,
            "knee_extension" => ExerciseType::KneeExtension,
            "leg_raise" => ExerciseType::LegRaise,
            "side_bend" => ExerciseType::SideBend,
            _ => ExerciseType::Other(key.trim().to_string()),
        }
    }
}

impl From<String> for ExerciseType {
    fn from(key: String) -> Self {
        ExerciseType::from(key.as_str())
    }
}

impl From<ExerciseType> for String {
    fn from(exercise: ExerciseType) -> Self {
        exercise.key().to_string()
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which side of the body the joint angle is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointSide {
    Left,
    Right,
    /// Average of whichever sides are visible
    Both,
}

/// Coarse phase of a repetition cycle
///
/// Labels are exercise specific and live in the threshold profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// No threshold crossed yet
    #[default]
    Unset,
    /// Rest / extended position; a rep may start from here
    Rest,
    /// Active / contracted position; entered when a rep is counted
    Active,
}

/// Lifecycle of a tracked session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    SetCompleted,
    Completed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::SetCompleted => write!(f, "set_completed"),
            SessionStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Options for a tracked session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Reps per set; `None` tracks an open-ended single set
    #[serde(default)]
    pub target_reps: Option<u32>,
    #[serde(default = "default_sets")]
    pub sets: u32,
    /// Overrides the profile's default side
    #[serde(default)]
    pub side: Option<JointSide>,
    /// Nominal frame rate used to space frames sent without timestamps
    #[serde(default)]
    pub fps: Option<f64>,
}

fn default_sets() -> u32 {
    1
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            target_reps: None,
            sets: default_sets(),
            side: None,
            fps: None,
        }
    }
}

/// Live view of a session, safe to hand to request handlers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub exercise: ExerciseType,
    pub stage: Stage,
    /// Exercise specific stage label ("-" before the first crossing)
    pub stage_label: String,
    pub count: u32,
    /// Last angle observed in degrees
    pub angle: Option<f64>,
    pub current_set: u32,
    pub total_sets: u32,
    pub reps_this_set: u32,
    pub target_reps: Option<u32>,
    pub status: SessionStatus,
    pub last_rep_score: Option<f64>,
    pub form_score: f64,
    pub frames_observed: u64,
    pub frames_skipped: u64,
}

/// One counted repetition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepRecord {
    /// 1-based index across the whole session
    pub index: u32,
    /// 1-based set number
    pub set: u32,
    pub timestamp_ms: u64,
    /// Extreme angle reached while the rep was active
    pub peak_angle: f64,
    pub score: f64,
}

/// Final result of a session or a recording analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub exercise: ExerciseType,
    pub reps: u32,
    pub assigned_reps: Option<u32>,
    pub sets: u32,
    pub reps_per_set: Vec<u32>,
    /// Seconds between the first and last observed frame
    pub duration: f64,
    /// Mean seconds between consecutive counted reps
    pub avg_time: f64,
    /// Mean rep score, 0-100
    pub form_score: f64,
    #[serde(default)]
    pub rep_log: Vec<RepRecord>,
}
