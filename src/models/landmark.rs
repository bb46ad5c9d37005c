/// Landmark models for pose observations
///
/// Landmarks arrive from an external pose-estimation model as named, normalized
/// 2-D positions with a visibility score. This module holds the landmark
/// vocabulary and the per-frame observation type the tracker consumes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 2-D point in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A single tracked body landmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Joint label (e.g., "left_shoulder")
    pub name: BodyLandmark,
    /// X coordinate (normalized 0-1)
    pub x: f32,
    /// Y coordinate (normalized 0-1)
    pub y: f32,
    /// Visibility / detection confidence (0-1)
    #[serde(alias = "score", alias = "confidence", default = "default_visibility")]
    pub visibility: f32,
}

fn default_visibility() -> f32 {
    1.0
}

impl Landmark {
    /// Create a new landmark
    pub fn new(name: BodyLandmark, x: f32, y: f32, visibility: f32) -> Self {
        Self {
            name,
            x,
            y,
            visibility,
        }
    }

    /// Check if the landmark is usable at the given visibility threshold
    pub fn is_visible(&self, min_visibility: f32) -> bool {
        self.visibility >= min_visibility && self.x.is_finite() && self.y.is_finite()
    }

    pub fn point(&self) -> Point2 {
        Point2::new(self.x as f64, self.y as f64)
    }
}

/// MediaPipe pose landmark indices (33 landmarks)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BodyLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl BodyLandmark {
    const ALL: [BodyLandmark; 33] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    /// Get landmark name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEyeInner => "left_eye_inner",
            Self::LeftEye => "left_eye",
            Self::LeftEyeOuter => "left_eye_outer",
            Self::RightEyeInner => "right_eye_inner",
            Self::RightEye => "right_eye",
            Self::RightEyeOuter => "right_eye_outer",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::MouthLeft => "mouth_left",
            Self::MouthRight => "mouth_right",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftPinky => "left_pinky",
            Self::RightPinky => "right_pinky",
            Self::LeftIndex => "left_index",
            Self::RightIndex => "right_index",
            Self::LeftThumb => "left_thumb",
            Self::RightThumb => "right_thumb",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
            Self::LeftHeel => "left_heel",
            Self::RightHeel => "right_heel",
            Self::LeftFootIndex => "left_foot_index",
            Self::RightFootIndex => "right_foot_index",
        }
    }

    /// Get all landmarks in model index order
    pub fn all() -> &'static [BodyLandmark] {
        &Self::ALL
    }

    /// Look up a landmark by its model output index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for BodyLandmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown landmark name: {0}")]
pub struct UnknownLandmark(pub String);

impl FromStr for BodyLandmark {
    type Err = UnknownLandmark;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|lm| lm.name() == normalized)
            .ok_or_else(|| UnknownLandmark(s.to_string()))
    }
}

impl Serialize for BodyLandmark {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for BodyLandmark {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Landmarks observed in a single frame
///
/// An empty landmark list means the pose model found no person in the frame.
/// Frames without a timestamp are stamped by the [`FrameClock`] of the stream
/// they arrive on.
///
/// [`FrameClock`]: crate::services::FrameClock
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameObservation {
    /// Frame timestamp in milliseconds, `None` when the source sent none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    #[serde(default, alias = "keypoints")]
    pub landmarks: Vec<Landmark>,
}

impl FrameObservation {
    /// Create a new frame observation
    pub fn new(timestamp_ms: u64, landmarks: Vec<Landmark>) -> Self {
        Self {
            timestamp_ms: Some(timestamp_ms),
            landmarks,
        }
    }

    /// A frame whose source did not report when it was captured
    pub fn untimed(landmarks: Vec<Landmark>) -> Self {
        Self {
            timestamp_ms: None,
            landmarks,
        }
    }

    /// A frame in which no pose was detected
    pub fn empty(timestamp_ms: u64) -> Self {
        Self::new(timestamp_ms, Vec::new())
    }

    /// Drop the timestamp, leaving the frame to be stamped on arrival
    pub fn without_timestamp(mut self) -> Self {
        self.timestamp_ms = None;
        self
    }

    pub fn has_pose(&self) -> bool {
        !self.landmarks.is_empty()
    }

    /// Get landmark by name
    pub fn get(&self, name: BodyLandmark) -> Option<&Landmark> {
        self.landmarks.iter().find(|lm| lm.name == name)
    }

    /// Get a landmark only if it clears the visibility threshold
    pub fn visible(&self, name: BodyLandmark, min_visibility: f32) -> Option<&Landmark> {
        self.get(name).filter(|lm| lm.is_visible(min_visibility))
    }

    /// Keep only the named landmarks, used to trim payloads to what an exercise needs
    pub fn retain_only(&mut self, wanted: &[BodyLandmark]) {
        self.landmarks.retain(|lm| wanted.contains(&lm.name));
    }
}
