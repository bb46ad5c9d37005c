/// Per-exercise threshold table
///
/// One parameterized table replaces per-exercise branching: each profile names
/// the joint triple to measure, the two directed threshold crossings that drive
/// the stage machine, the stage labels and the ideal peak range used for form
/// scoring.

use crate::models::{BodyLandmark, ExerciseType, JointSide, Stage};
use serde::Serialize;

/// A directed threshold on a joint angle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "direction", content = "degrees", rename_all = "lowercase")]
pub enum Crossing {
    Above(f64),
    Below(f64),
}

impl Crossing {
    pub fn is_crossed(&self, angle: f64) -> bool {
        match *self {
            Crossing::Above(threshold) => angle > threshold,
            Crossing::Below(threshold) => angle < threshold,
        }
    }

    /// Whether `candidate` lies further in this crossing's direction than `current`
    pub fn is_further(&self, candidate: f64, current: f64) -> bool {
        match self {
            Crossing::Above(_) => candidate > current,
            Crossing::Below(_) => candidate < current,
        }
    }
}

/// The pair of crossings forming a two-state hysteresis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdRule {
    /// Crossing that puts the stage at rest
    pub reset: Crossing,
    /// Crossing that, from rest, makes the stage active and counts a rep
    pub trigger: Crossing,
}

impl ThresholdRule {
    /// True when no angle can satisfy both crossings at once
    pub fn is_disjoint(&self) -> bool {
        match (self.reset, self.trigger) {
            (Crossing::Above(high), Crossing::Below(low)) => low <= high,
            (Crossing::Below(low), Crossing::Above(high)) => low <= high,
            _ => false,
        }
    }
}

/// Inclusive range of ideal peak angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IdealRange {
    pub min: f64,
    pub max: f64,
}

impl IdealRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.min && angle <= self.max
    }

    /// Degrees outside the range, 0 inside it
    pub fn deviation(&self, angle: f64) -> f64 {
        if angle < self.min {
            self.min - angle
        } else if angle > self.max {
            angle - self.max
        } else {
            0.0
        }
    }
}

/// Ideal range for exercises without a profile
pub const DEFAULT_IDEAL_RANGE: IdealRange = IdealRange::new(60.0, 160.0);

/// Landmarks forming the measured angle, vertex in the middle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JointTriple {
    pub left: [BodyLandmark; 3],
    pub right: [BodyLandmark; 3],
}

impl JointTriple {
    pub fn for_side(&self, side: JointSide) -> Vec<[BodyLandmark; 3]> {
        match side {
            JointSide::Left => vec![self.left],
            JointSide::Right => vec![self.right],
            JointSide::Both => vec![self.left, self.right],
        }
    }

    /// Every landmark the triple can touch, used to trim frame payloads
    pub fn all_landmarks(&self) -> Vec<BodyLandmark> {
        let mut landmarks: Vec<BodyLandmark> =
            self.left.iter().chain(self.right.iter()).copied().collect();
        landmarks.sort();
        landmarks.dedup();
        landmarks
    }
}

/// Complete tracking profile for one exercise
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseProfile {
    pub exercise: ExerciseType,
    pub joints: JointTriple,
    pub default_side: JointSide,
    pub rule: ThresholdRule,
    pub rest_label: &'static str,
    pub active_label: &'static str,
    pub ideal_range: IdealRange,
}

impl ExerciseProfile {
    pub fn stage_label(&self, stage: Stage) -> &'static str {
        match stage {
            Stage::Unset => "-",
            Stage::Rest => self.rest_label,
            Stage::Active => self.active_label,
        }
    }
}

use BodyLandmark::*;

static PROFILES: [ExerciseProfile; 6] = [
    ExerciseProfile {
        exercise: ExerciseType::BicepCurl,
        joints: JointTriple {
            left: [LeftShoulder, LeftElbow, LeftWrist],
            right: [RightShoulder, RightElbow, RightWrist],
        },
        default_side: JointSide::Right,
        rule: ThresholdRule {
            reset: Crossing::Above(160.0),
            trigger: Crossing::Below(40.0),
        },
        rest_label: "down",
        active_label: "up",
        ideal_range: IdealRange::new(20.0, 45.0),
    },
    ExerciseProfile {
        exercise: ExerciseType::Squat,
        joints: JointTriple {
            left: [LeftHip, LeftKnee, LeftAnkle],
            right: [RightHip, RightKnee, RightAnkle],
        },
        default_side: JointSide::Both,
        rule: ThresholdRule {
            reset: Crossing::Above(160.0),
            trigger: Crossing::Below(90.0),
        },
        rest_label: "up",
        active_label: "down",
        ideal_range: IdealRange::new(70.0, 100.0),
    },
    ExerciseProfile {
        exercise: ExerciseType::ShoulderAbduction,
        joints: JointTriple {
            left: [LeftHip, LeftShoulder, LeftElbow],
            right: [RightHip, RightShoulder, RightElbow],
        },
        default_side: JointSide::Right,
        rule: ThresholdRule {
            reset: Crossing::Below(40.0),
            trigger: Crossing::Above(100.0),
        },
        rest_label: "down",
        active_label: "up",
        ideal_range: IdealRange::new(100.0, 170.0),
    },
    ExerciseProfile {
        exercise: ExerciseType::KneeExtension,
        joints: JointTriple {
            left: [LeftHip, LeftKnee, LeftAnkle],
            right: [RightHip, RightKnee, RightAnkle],
        },
        default_side: JointSide::Both,
        rule: ThresholdRule {
            reset: Crossing::Above(150.0),
            trigger: Crossing::Below(100.0),
        },
        rest_label: "extended",
        active_label: "bent",
        ideal_range: IdealRange::new(70.0, 100.0),
    },
    ExerciseProfile {
        exercise: ExerciseType::LegRaise,
        joints: JointTriple {
            left: [LeftShoulder, LeftHip, LeftAnkle],
            right: [RightShoulder, RightHip, RightAnkle],
        },
        default_side: JointSide::Both,
        rule: ThresholdRule {
            reset: Crossing::Below(160.0),
            trigger: Crossing::Above(170.0),
        },
        rest_label: "up",
        active_label: "down",
        ideal_range: IdealRange::new(170.0, 180.0),
    },
    ExerciseProfile {
        exercise: ExerciseType::SideBend,
        joints: JointTriple {
            left: [LeftShoulder, LeftHip, LeftKnee],
            right: [RightShoulder, RightHip, RightKnee],
        },
        default_side: JointSide::Right,
        rule: ThresholdRule {
            reset: Crossing::Below(150.0),
            trigger: Crossing::Above(175.0),
        },
        rest_label: "bend",
        active_label: "upright",
        ideal_range: IdealRange::new(175.0, 180.0),
    },
];

/// Look up the profile for an exercise; `None` for unrecognized exercises
pub fn profile_for(exercise: &ExerciseType) -> Option<&'static ExerciseProfile> {
    PROFILES.iter().find(|profile| &profile.exercise == exercise)
}

/// Ideal range for scoring, falling back to the default for unknown exercises
pub fn ideal_range_for(exercise: &ExerciseType) -> IdealRange {
    profile_for(exercise)
        .map(|profile| profile.ideal_range)
        .unwrap_or(DEFAULT_IDEAL_RANGE)
}

/// The full table in a stable order
pub fn all_profiles() -> &'static [ExerciseProfile] {
    &PROFILES
}
