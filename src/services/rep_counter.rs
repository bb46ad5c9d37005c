/// Repetition counting
///
/// `update_state` is the pure two-state hysteresis: crossing the reset
/// threshold puts the stage at rest, and crossing the trigger threshold from
/// rest makes it active and counts one rep. `RepCounter` wraps it with the
/// per-session bookkeeping: landmark processing, rep debounce, sets, timing and
/// per-rep form scores.

use crate::config::TrackerConfig;
use crate::models::{
    ExerciseType, FrameObservation, JointSide, RepRecord, SessionOptions, SessionSnapshot,
    SessionStatus, SessionSummary, Stage,
};
use crate::services::errors::TrackerError;
use crate::services::form_scoring::{score_angle, FormAccumulator};
use crate::services::landmark_processor::LandmarkProcessor;
use crate::services::threshold_table::{profile_for, ExerciseProfile, ThresholdRule};
use tracing::{debug, info};

/// Advance the stage machine by one angle
///
/// Exercises without a profile leave stage and count unchanged.
pub fn update_state(exercise: &ExerciseType, stage: Stage, count: u32, angle: f64) -> (Stage, u32) {
    match profile_for(exercise) {
        Some(profile) => apply_rule(&profile.rule, stage, count, angle),
        None => (stage, count),
    }
}

/// Apply a threshold rule to one angle
pub fn apply_rule(rule: &ThresholdRule, stage: Stage, count: u32, angle: f64) -> (Stage, u32) {
    let mut next = stage;

    if rule.reset.is_crossed(angle) {
        next = Stage::Rest;
    }

    if rule.trigger.is_crossed(angle) && next == Stage::Rest {
        return (Stage::Active, count.saturating_add(1));
    }

    (next, count)
}

/// A counted rep whose peak angle is still being tracked
#[derive(Debug, Clone)]
struct PendingRep {
    index: u32,
    set: u32,
    timestamp_ms: u64,
    peak: f64,
}

/// Stateful tracker for one exercise session
#[derive(Debug, Clone)]
pub struct RepCounter {
    profile: &'static ExerciseProfile,
    side: JointSide,
    options: SessionOptions,
    processor: LandmarkProcessor,
    min_rep_interval_ms: u64,

    stage: Stage,
    count: u32,
    last_angle: Option<f64>,
    status: SessionStatus,
    current_set: u32,
    reps_per_set: Vec<u32>,

    first_timestamp_ms: Option<u64>,
    last_timestamp_ms: Option<u64>,
    last_rep_timestamp_ms: Option<u64>,
    rep_intervals_ms: Vec<u64>,

    pending: Option<PendingRep>,
    rep_log: Vec<RepRecord>,
    form: FormAccumulator,
    last_rep_score: Option<f64>,

    frames_observed: u64,
    frames_skipped: u64,
}

impl RepCounter {
    /// Create a tracker for an exercise with a threshold profile
    pub fn new(
        exercise: &ExerciseType,
        options: SessionOptions,
        config: &TrackerConfig,
    ) -> Result<Self, TrackerError> {
        let profile = profile_for(exercise)
            .ok_or_else(|| TrackerError::UnsupportedExercise(exercise.to_string()))?;

        let processor = LandmarkProcessor::new()
            .with_min_visibility(config.min_visibility)
            .with_smoothing_window(config.smoothing_window);

        let options = SessionOptions {
            sets: options.sets.max(1),
            target_reps: options.target_reps.filter(|target| *target > 0),
            ..options
        };

        Ok(Self {
            profile,
            side: options.side.unwrap_or(profile.default_side),
            options,
            processor,
            min_rep_interval_ms: config.min_rep_interval_ms,
            stage: Stage::Unset,
            count: 0,
            last_angle: None,
            status: SessionStatus::Active,
            current_set: 1,
            reps_per_set: vec![0],
            first_timestamp_ms: None,
            last_timestamp_ms: None,
            last_rep_timestamp_ms: None,
            rep_intervals_ms: Vec::new(),
            pending: None,
            rep_log: Vec::new(),
            form: FormAccumulator::new(),
            last_rep_score: None,
            frames_observed: 0,
            frames_skipped: 0,
        })
    }

    pub fn exercise(&self) -> &ExerciseType {
        &self.profile.exercise
    }

    pub fn profile(&self) -> &'static ExerciseProfile {
        self.profile
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn last_timestamp_ms(&self) -> Option<u64> {
        self.last_timestamp_ms
    }

    /// Nominal frame rate for untimed frames, if the session set one
    pub fn fps(&self) -> Option<f64> {
        self.options.fps
    }

    /// Feed one frame; returns true when it counted a rep
    ///
    /// Frames are expected to be stamped by a `FrameClock`; one that is not
    /// takes the previous frame's time. Frames without a usable angle are
    /// skipped. While a set break or the end of the workout is pending, frames
    /// only finish tracking the last rep's peak angle and never count.
    pub fn observe(&mut self, frame: &FrameObservation) -> bool {
        let counting = self.status == SessionStatus::Active;
        let timestamp_ms = frame
            .timestamp_ms
            .or(self.last_timestamp_ms)
            .unwrap_or_default();

        if counting {
            self.frames_observed += 1;
            self.first_timestamp_ms.get_or_insert(timestamp_ms);
            self.last_timestamp_ms = Some(timestamp_ms);
        } else if self.pending.is_none() {
            return false;
        }

        let Some(angle) = self
            .processor
            .process(frame, &self.profile.joints, self.side)
        else {
            if counting {
                self.frames_skipped += 1;
            }
            return false;
        };
        self.last_angle = Some(angle);

        let previous = self.stage;
        let (stage, count) = apply_rule(&self.profile.rule, previous, self.count, angle);
        self.stage = stage;

        if previous == Stage::Active && stage == Stage::Rest {
            self.finalize_pending();
        } else if stage == Stage::Active {
            let trigger = self.profile.rule.trigger;
            if let Some(pending) = self.pending.as_mut() {
                if trigger.is_further(angle, pending.peak) {
                    pending.peak = angle;
                }
            }
        }

        if count > self.count && counting {
            self.record_rep(timestamp_ms, angle)
        } else {
            false
        }
    }

    fn record_rep(&mut self, timestamp_ms: u64, angle: f64) -> bool {
        if let Some(last) = self.last_rep_timestamp_ms {
            let elapsed = timestamp_ms.saturating_sub(last);
            if elapsed < self.min_rep_interval_ms {
                debug!(
                    exercise = %self.profile.exercise,
                    elapsed_ms = elapsed,
                    "Rep suppressed by minimum interval"
                );
                return false;
            }
            self.rep_intervals_ms.push(elapsed);
        }

        self.finalize_pending();

        self.count += 1;
        if let Some(reps) = self.reps_per_set.last_mut() {
            *reps += 1;
        }
        self.last_rep_timestamp_ms = Some(timestamp_ms);
        self.pending = Some(PendingRep {
            index: self.count,
            set: self.current_set,
            timestamp_ms,
            peak: angle,
        });

        debug!(
            exercise = %self.profile.exercise,
            count = self.count,
            angle,
            "Rep counted"
        );

        if let Some(target) = self.options.target_reps {
            if self.reps_this_set() >= target {
                self.status = if self.current_set >= self.options.sets {
                    SessionStatus::Completed
                } else {
                    SessionStatus::SetCompleted
                };
                info!(
                    exercise = %self.profile.exercise,
                    set = self.current_set,
                    status = %self.status,
                    "Set completed"
                );
            }
        }

        true
    }

    fn finalize_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            let score = score_angle(pending.peak, self.profile.ideal_range);
            self.form.record(score);
            self.last_rep_score = Some(score);
            self.rep_log.push(RepRecord {
                index: pending.index,
                set: pending.set,
                timestamp_ms: pending.timestamp_ms,
                peak_angle: pending.peak,
                score,
            });
        }
    }

    fn reps_this_set(&self) -> u32 {
        self.reps_per_set.last().copied().unwrap_or(0)
    }

    /// Resume counting after a completed set
    pub fn start_next_set(&mut self) -> Result<(), TrackerError> {
        if self.status != SessionStatus::SetCompleted {
            return Err(TrackerError::InvalidTransition(format!(
                "cannot start next set while session is {}",
                self.status
            )));
        }

        self.finalize_pending();
        self.current_set += 1;
        self.reps_per_set.push(0);
        self.status = SessionStatus::Active;
        self.processor.reset();

        info!(
            exercise = %self.profile.exercise,
            set = self.current_set,
            "Starting next set"
        );
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            exercise: self.profile.exercise.clone(),
            stage: self.stage,
            stage_label: self.profile.stage_label(self.stage).to_string(),
            count: self.count,
            angle: self.last_angle,
            current_set: self.current_set,
            total_sets: self.options.sets,
            reps_this_set: self.reps_this_set(),
            target_reps: self.options.target_reps,
            status: self.status,
            last_rep_score: self.last_rep_score,
            form_score: self.form.mean(),
            frames_observed: self.frames_observed,
            frames_skipped: self.frames_skipped,
        }
    }

    /// Close out the session and summarize it
    pub fn finish(mut self) -> SessionSummary {
        self.finalize_pending();

        let duration = match (self.first_timestamp_ms, self.last_timestamp_ms) {
            (Some(first), Some(last)) => last.saturating_sub(first) as f64 / 1000.0,
            _ => 0.0,
        };

        let avg_time = if self.rep_intervals_ms.is_empty() {
            0.0
        } else {
            self.rep_intervals_ms.iter().sum::<u64>() as f64
                / self.rep_intervals_ms.len() as f64
                / 1000.0
        };

        SessionSummary {
            exercise: self.profile.exercise.clone(),
            reps: self.count,
            assigned_reps: self
                .options
                .target_reps
                .map(|target| target.saturating_mul(self.options.sets)),
            sets: self.options.sets,
            reps_per_set: self.reps_per_set,
            duration,
            avg_time,
            form_score: self.form.mean(),
            rep_log: self.rep_log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BodyLandmark, Landmark};
    use proptest::prelude::*;

    fn run(exercise: &ExerciseType, angles: &[f64]) -> (Stage, u32) {
        angles
            .iter()
            .fold((Stage::Unset, 0), |(stage, count), angle| {
                update_state(exercise, stage, count, *angle)
            })
    }

    /// Right arm frame whose elbow angle equals `degrees`
    fn elbow_frame(timestamp_ms: u64, degrees: f64) -> FrameObservation {
        let elbow = (0.5f64, 0.5f64);
        let radians = degrees.to_radians();
        let wrist = (elbow.0 + 0.2 * radians.cos(), elbow.1 + 0.2 * radians.sin());
        FrameObservation::new(
            timestamp_ms,
            vec![
                Landmark::new(BodyLandmark::RightShoulder, 0.7, 0.5, 0.9),
                Landmark::new(BodyLandmark::RightElbow, elbow.0 as f32, elbow.1 as f32, 0.9),
                Landmark::new(BodyLandmark::RightWrist, wrist.0 as f32, wrist.1 as f32, 0.9),
            ],
        )
    }

    fn curl_cycle(start_ms: u64, contracted: f64) -> Vec<FrameObservation> {
        [170.0, 120.0, 60.0, contracted, 60.0, 120.0, 170.0]
            .iter()
            .enumerate()
            .map(|(i, angle)| elbow_frame(start_ms + i as u64 * 100, *angle))
            .collect()
    }

    fn counter(options: SessionOptions) -> RepCounter {
        let config = TrackerConfig {
            min_rep_interval_ms: 0,
            ..TrackerConfig::default()
        };
        RepCounter::new(&ExerciseType::BicepCurl, options, &config).unwrap()
    }

    #[test]
    fn test_squat_counts_once_per_cycle() {
        let (stage, count) = run(&ExerciseType::Squat, &[170.0, 140.0, 100.0, 80.0, 120.0, 170.0]);
        assert_eq!(count, 1);
        assert_eq!(stage, Stage::Rest);
    }

    #[test]
    fn test_trigger_without_rest_does_not_count() {
        // Starting in the contracted position never counts
        let (stage, count) = run(&ExerciseType::Squat, &[80.0, 70.0, 85.0]);
        assert_eq!(count, 0);
        assert_eq!(stage, Stage::Unset);
    }

    #[test]
    fn test_staying_contracted_counts_once() {
        let (_, count) = run(&ExerciseType::BicepCurl, &[170.0, 30.0, 25.0, 35.0, 30.0]);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_inverted_exercise_counts_on_rising_angle() {
        let (stage, count) = run(
            &ExerciseType::ShoulderAbduction,
            &[20.0, 60.0, 110.0, 60.0, 20.0, 120.0],
        );
        assert_eq!(count, 2);
        assert_eq!(stage, Stage::Active);
    }

    #[test]
    fn test_unknown_exercise_is_noop() {
        let other = ExerciseType::from("plank");
        assert_eq!(update_state(&other, Stage::Rest, 3, 10.0), (Stage::Rest, 3));
    }

    #[test]
    fn test_nan_angle_is_noop() {
        assert_eq!(
            update_state(&ExerciseType::Squat, Stage::Rest, 2, f64::NAN),
            (Stage::Rest, 2)
        );
    }

    #[test]
    fn test_unsupported_exercise_rejected() {
        let result = RepCounter::new(
            &ExerciseType::from("plank"),
            SessionOptions::default(),
            &TrackerConfig::default(),
        );
        assert!(matches!(result, Err(TrackerError::UnsupportedExercise(_))));
    }

    #[test]
    fn test_counter_tracks_reps_and_peaks() {
        let mut tracker = counter(SessionOptions::default());
        for frame in curl_cycle(0, 30.0).iter().chain(curl_cycle(1000, 10.0).iter()) {
            tracker.observe(frame);
        }

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.count, 2);
        assert_eq!(snapshot.stage_label, "down");

        let summary = tracker.finish();
        assert_eq!(summary.reps, 2);
        assert_eq!(summary.rep_log.len(), 2);
        assert!((summary.rep_log[0].peak_angle - 30.0).abs() < 0.1);
        assert!((summary.rep_log[0].score - 100.0).abs() < 1e-6);
        // 10 degrees is 10 below the ideal minimum of 20
        assert!((summary.rep_log[1].peak_angle - 10.0).abs() < 0.1);
        assert!(summary.rep_log[1].score < 100.0);
        assert!((summary.avg_time - 1.0).abs() < 1e-9);
        assert!((summary.duration - 1.6).abs() < 1e-9);
    }

    #[test]
    fn test_missing_pose_frames_are_skipped() {
        let mut tracker = counter(SessionOptions::default());
        tracker.observe(&elbow_frame(0, 170.0));
        tracker.observe(&FrameObservation::empty(50));
        tracker.observe(&elbow_frame(100, 30.0));

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.count, 1);
        assert_eq!(snapshot.frames_observed, 3);
        assert_eq!(snapshot.frames_skipped, 1);
    }

    #[test]
    fn test_min_interval_suppresses_bounce() {
        let config = TrackerConfig {
            min_rep_interval_ms: 700,
            ..TrackerConfig::default()
        };
        let mut tracker =
            RepCounter::new(&ExerciseType::BicepCurl, SessionOptions::default(), &config).unwrap();

        // Noisy flicker across both thresholds within 300ms
        for (ts, angle) in [(0, 170.0), (100, 30.0), (200, 170.0), (300, 30.0), (1200, 170.0), (1300, 30.0)] {
            tracker.observe(&elbow_frame(ts, angle));
        }
        assert_eq!(tracker.count(), 2);
    }

    #[test]
    fn test_sets_pause_until_next_set() {
        let mut tracker = counter(SessionOptions {
            target_reps: Some(1),
            sets: 2,
            ..SessionOptions::default()
        });

        for frame in curl_cycle(0, 30.0) {
            tracker.observe(&frame);
        }
        assert_eq!(tracker.status(), SessionStatus::SetCompleted);

        // Ignored while the set break is pending
        for frame in curl_cycle(1000, 30.0) {
            tracker.observe(&frame);
        }
        assert_eq!(tracker.count(), 1);

        tracker.start_next_set().unwrap();
        assert!(tracker.start_next_set().is_err());

        for frame in curl_cycle(2000, 30.0) {
            tracker.observe(&frame);
        }
        assert_eq!(tracker.status(), SessionStatus::Completed);

        let summary = tracker.finish();
        assert_eq!(summary.reps, 2);
        assert_eq!(summary.reps_per_set, vec![1, 1]);
        assert_eq!(summary.assigned_reps, Some(2));
    }

    #[test]
    fn test_finish_without_reps() {
        let tracker = counter(SessionOptions::default());
        let summary = tracker.finish();
        assert_eq!(summary.reps, 0);
        assert_eq!(summary.form_score, 0.0);
        assert_eq!(summary.avg_time, 0.0);
        assert_eq!(summary.duration, 0.0);
    }

    #[test]
    fn test_assigned_reps_saturate_on_huge_targets() {
        let tracker = counter(SessionOptions {
            target_reps: Some(u32::MAX),
            sets: 2,
            ..SessionOptions::default()
        });
        assert_eq!(tracker.snapshot().total_sets, 2);

        let summary = tracker.finish();
        assert_eq!(summary.assigned_reps, Some(u32::MAX));
        assert_eq!(summary.sets, 2);
    }

    #[test]
    fn test_unstamped_frame_takes_previous_time() {
        let mut tracker = counter(SessionOptions::default());
        tracker.observe(&elbow_frame(400, 170.0));
        tracker.observe(&elbow_frame(900, 30.0).without_timestamp());

        assert_eq!(tracker.last_timestamp_ms(), Some(400));
        assert_eq!(tracker.count(), 1);
    }

    proptest! {
        #[test]
        fn prop_count_never_decreases(angles in proptest::collection::vec(0.0f64..180.0, 0..200)) {
            for exercise in ExerciseType::KNOWN.iter() {
                let mut stage = Stage::Unset;
                let mut count = 0;
                for angle in &angles {
                    let (next_stage, next_count) = update_state(exercise, stage, count, *angle);
                    prop_assert!(next_count >= count);
                    prop_assert!(next_count - count <= 1);
                    stage = next_stage;
                    count = next_count;
                }
            }
        }

        #[test]
        fn prop_single_dip_counts_once(
            start in 161.0f64..180.0,
            bottom in 0.0f64..89.0,
            steps in 2usize..20,
        ) {
            // Monotonically down past both thresholds, then back up
            let down = (0..=steps).map(|i| start + (bottom - start) * i as f64 / steps as f64);
            let up = (1..=steps).map(|i| bottom + (start - bottom) * i as f64 / steps as f64);
            let angles: Vec<f64> = down.chain(up).collect();

            let (_, count) = run(&ExerciseType::Squat, &angles);
            prop_assert_eq!(count, 1);
        }
    }
}
