/// Landmark Processing Service
///
/// Turns a raw frame observation into the single joint angle an exercise is
/// tracked on:
/// - Visibility filtering (low-confidence landmarks count as missing)
/// - Joint triple selection per body side, with left/right averaging
/// - Temporal smoothing of the resulting angle (moving average)

use crate::models::{BodyLandmark, FrameObservation, JointSide};
use crate::services::angle_calculator::joint_angle;
use crate::services::threshold_table::JointTriple;
use std::collections::VecDeque;

/// Default visibility below which a landmark is ignored
pub const DEFAULT_MIN_VISIBILITY: f32 = 0.5;

/// Landmark processor
#[derive(Debug, Clone)]
pub struct LandmarkProcessor {
    /// Minimum visibility for a landmark to be used
    min_visibility: f32,
    /// Moving average window; 1 disables smoothing
    smoothing_window: usize,
    /// Recent angles for smoothing
    history: VecDeque<f64>,
}

impl LandmarkProcessor {
    /// Create a new processor with default configuration
    pub fn new() -> Self {
        Self {
            min_visibility: DEFAULT_MIN_VISIBILITY,
            smoothing_window: 1,
            history: VecDeque::with_capacity(8),
        }
    }

    /// Set minimum visibility threshold
    pub fn with_min_visibility(mut self, min_visibility: f32) -> Self {
        self.min_visibility = min_visibility.clamp(0.0, 1.0);
        self
    }

    /// Set the moving average window
    pub fn with_smoothing_window(mut self, window: usize) -> Self {
        self.smoothing_window = window.max(1);
        self
    }

    pub fn min_visibility(&self) -> f32 {
        self.min_visibility
    }

    /// Raw angle for one landmark triple, if all three are visible and non-degenerate
    fn triple_angle(&self, frame: &FrameObservation, triple: &[BodyLandmark; 3]) -> Option<f64> {
        let a = frame.visible(triple[0], self.min_visibility)?;
        let vertex = frame.visible(triple[1], self.min_visibility)?;
        let c = frame.visible(triple[2], self.min_visibility)?;
        joint_angle(a.point(), vertex.point(), c.point())
    }

    /// Measure the tracked angle for a frame without smoothing
    ///
    /// With `JointSide::Both` the visible sides are averaged; a single visible
    /// side is used alone.
    pub fn measure(
        &self,
        frame: &FrameObservation,
        joints: &JointTriple,
        side: JointSide,
    ) -> Option<f64> {
        if !frame.has_pose() {
            return None;
        }

        let angles: Vec<f64> = joints
            .for_side(side)
            .iter()
            .filter_map(|triple| self.triple_angle(frame, triple))
            .collect();

        if angles.is_empty() {
            None
        } else {
            Some(angles.iter().sum::<f64>() / angles.len() as f64)
        }
    }

    /// Feed an angle through the moving average
    pub fn smooth(&mut self, angle: f64) -> f64 {
        self.history.push_back(angle);
        while self.history.len() > self.smoothing_window {
            self.history.pop_front();
        }
        self.history.iter().sum::<f64>() / self.history.len() as f64
    }

    /// Measure and smooth; `None` means the frame should be skipped
    pub fn process(
        &mut self,
        frame: &FrameObservation,
        joints: &JointTriple,
        side: JointSide,
    ) -> Option<f64> {
        let angle = self.measure(frame, joints, side)?;
        Some(self.smooth(angle))
    }

    /// Reset temporal smoothing state
    pub fn reset(&mut self) {
        self.history.clear();
    }
}

impl Default for LandmarkProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExerciseType, Landmark};
    use crate::services::threshold_table::profile_for;

    fn squat_joints() -> JointTriple {
        profile_for(&ExerciseType::Squat).unwrap().joints
    }

    /// Both legs bent at a right angle, left leg drawn mirrored
    fn right_angle_frame(left_visibility: f32, right_visibility: f32) -> FrameObservation {
        FrameObservation::new(
            0,
            vec![
                Landmark::new(BodyLandmark::LeftHip, 0.4, 0.5, left_visibility),
                Landmark::new(BodyLandmark::LeftKnee, 0.4, 0.7, left_visibility),
                Landmark::new(BodyLandmark::LeftAnkle, 0.2, 0.7, left_visibility),
                Landmark::new(BodyLandmark::RightHip, 0.6, 0.5, right_visibility),
                Landmark::new(BodyLandmark::RightKnee, 0.6, 0.7, right_visibility),
                Landmark::new(BodyLandmark::RightAnkle, 0.6, 0.9, right_visibility),
            ],
        )
    }

    #[test]
    fn test_processor_creation() {
        let processor = LandmarkProcessor::new();
        assert_eq!(processor.min_visibility(), DEFAULT_MIN_VISIBILITY);
    }

    #[test]
    fn test_measure_single_side() {
        let processor = LandmarkProcessor::new();
        let frame = right_angle_frame(0.9, 0.9);

        let left = processor
            .measure(&frame, &squat_joints(), JointSide::Left)
            .unwrap();
        let right = processor
            .measure(&frame, &squat_joints(), JointSide::Right)
            .unwrap();

        assert!((left - 90.0).abs() < 1e-3);
        assert!((right - 180.0).abs() < 1e-3);
    }

    #[test]
    fn test_measure_both_sides_averages() {
        let processor = LandmarkProcessor::new();
        let frame = right_angle_frame(0.9, 0.9);

        let both = processor
            .measure(&frame, &squat_joints(), JointSide::Both)
            .unwrap();
        assert!((both - 135.0).abs() < 1e-3);
    }

    #[test]
    fn test_both_sides_falls_back_to_visible_side() {
        let processor = LandmarkProcessor::new();
        let frame = right_angle_frame(0.1, 0.9);

        let both = processor
            .measure(&frame, &squat_joints(), JointSide::Both)
            .unwrap();
        assert!((both - 180.0).abs() < 1e-3);
    }

    #[test]
    fn test_missing_landmarks_skip_frame() {
        let processor = LandmarkProcessor::new();
        let frame = right_angle_frame(0.1, 0.1);
        assert!(processor
            .measure(&frame, &squat_joints(), JointSide::Both)
            .is_none());
        assert!(processor
            .measure(&FrameObservation::empty(0), &squat_joints(), JointSide::Both)
            .is_none());
    }

    #[test]
    fn test_lower_visibility_threshold_accepts_landmarks() {
        let processor = LandmarkProcessor::new().with_min_visibility(0.05);
        let frame = right_angle_frame(0.1, 0.1);
        assert!(processor
            .measure(&frame, &squat_joints(), JointSide::Left)
            .is_some());
    }

    #[test]
    fn test_temporal_smoothing() {
        let mut processor = LandmarkProcessor::new().with_smoothing_window(3);

        assert_eq!(processor.smooth(90.0), 90.0);
        assert_eq!(processor.smooth(120.0), 105.0);
        assert_eq!(processor.smooth(150.0), 120.0);
        // Oldest value drops out of the window
        assert_eq!(processor.smooth(180.0), 150.0);

        processor.reset();
        assert_eq!(processor.smooth(60.0), 60.0);
    }

    #[test]
    fn test_passthrough_without_smoothing() {
        let mut processor = LandmarkProcessor::new();
        assert_eq!(processor.smooth(90.0), 90.0);
        assert_eq!(processor.smooth(170.0), 170.0);
    }
}
