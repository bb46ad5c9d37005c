/// Form scoring against ideal joint-angle ranges

use crate::models::ExerciseType;
use crate::services::threshold_table::{ideal_range_for, IdealRange};

/// Deviation in degrees at which the score reaches zero
pub const ZERO_SCORE_DEVIATION: f64 = 60.0;

/// Score a single angle, 0-100
///
/// 100 anywhere inside the ideal range, decaying linearly with the distance to
/// the nearest boundary and floored at 0 once 60 degrees out.
pub fn score_angle(angle: f64, range: IdealRange) -> f64 {
    let deviation = range.deviation(angle);
    let score = 100.0 * (1.0 - deviation / ZERO_SCORE_DEVIATION);
    score.clamp(0.0, 100.0)
}

/// Score an angle for an exercise, using the default range when it has no profile
pub fn score_for_exercise(exercise: &ExerciseType, angle: f64) -> f64 {
    score_angle(angle, ideal_range_for(exercise))
}

/// Running mean of rep scores
#[derive(Debug, Clone, Default)]
pub struct FormAccumulator {
    total: f64,
    samples: u32,
}

impl FormAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, score: f64) {
        self.total += score;
        self.samples += 1;
    }

    /// Mean score, 0 when nothing was recorded
    pub fn mean(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.total / self.samples as f64
        }
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }
}
