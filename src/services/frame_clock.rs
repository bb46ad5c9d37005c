/// Timestamps for frames that arrive without one
///
/// A stream is either timed or untimed, and its first frame decides which. A
/// timed stream keeps the timestamps it was sent; a frame that later arrives
/// without one is placed one frame interval after the previous frame. An
/// untimed stream is stamped at its nominal frame rate, so frames delivered
/// together in one batch are still spread out in time. On a live clock an
/// untimed frame is never stamped earlier than the wall time since the clock
/// started.

use crate::models::FrameObservation;
use std::time::Instant;

/// Frame rate assumed when a stream carries no timestamps
pub const DEFAULT_FPS: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timing {
    Recorded,
    Synthesized,
}

#[derive(Debug, Clone)]
pub struct FrameClock {
    started: Option<Instant>,
    frame_interval_ms: f64,
    timing: Option<Timing>,
    /// Earliest time the next synthesized frame may take
    next_ms: f64,
    last_ms: Option<u64>,
}

impl FrameClock {
    /// Clock for frames arriving in real time
    pub fn live(fps: Option<f64>) -> Self {
        Self {
            started: Some(Instant::now()),
            ..Self::offline(fps)
        }
    }

    /// Clock for a recording, where only the frame rate gives time
    pub fn offline(fps: Option<f64>) -> Self {
        let fps = fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .unwrap_or(DEFAULT_FPS);
        Self {
            started: None,
            frame_interval_ms: 1000.0 / fps,
            timing: None,
            next_ms: 0.0,
            last_ms: None,
        }
    }

    /// True once the first frame showed the stream carries its own timestamps
    pub fn is_timed(&self) -> bool {
        self.timing == Some(Timing::Recorded)
    }

    /// Give the frame its timestamp on this clock
    pub fn stamp(&mut self, frame: &mut FrameObservation) {
        let timing = *self.timing.get_or_insert(match frame.timestamp_ms {
            Some(_) => Timing::Recorded,
            None => Timing::Synthesized,
        });

        let timestamp_ms = match (timing, frame.timestamp_ms) {
            (Timing::Recorded, Some(timestamp_ms)) => timestamp_ms,
            (Timing::Recorded, None) => match self.last_ms {
                Some(last) => last.saturating_add(self.frame_interval_ms.round() as u64),
                None => 0,
            },
            (Timing::Synthesized, _) => {
                let wall_ms = self
                    .started
                    .map(|started| started.elapsed().as_millis() as f64)
                    .unwrap_or(0.0);
                let at = self.next_ms.max(wall_ms);
                self.next_ms = at + self.frame_interval_ms;
                at.round() as u64
            }
        };

        self.last_ms = Some(timestamp_ms);
        frame.timestamp_ms = Some(timestamp_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped(clock: &mut FrameClock, timestamp_ms: Option<u64>) -> u64 {
        let mut frame = FrameObservation {
            timestamp_ms,
            landmarks: Vec::new(),
        };
        clock.stamp(&mut frame);
        frame.timestamp_ms.unwrap_or_default()
    }

    #[test]
    fn test_untimed_frames_follow_frame_rate() {
        let mut clock = FrameClock::offline(Some(10.0));
        let stamps: Vec<u64> = (0..4).map(|_| stamped(&mut clock, None)).collect();
        assert_eq!(stamps, vec![0, 100, 200, 300]);
        assert!(!clock.is_timed());
    }

    #[test]
    fn test_fractional_interval_does_not_drift() {
        let mut clock = FrameClock::offline(None);
        let stamps: Vec<u64> = (0..31).map(|_| stamped(&mut clock, None)).collect();
        assert_eq!(stamps[1], 33);
        assert_eq!(stamps[2], 67);
        assert_eq!(stamps[30], 1000);
    }

    #[test]
    fn test_timed_stream_starting_at_zero_is_kept() {
        let mut clock = FrameClock::live(None);
        std::thread::sleep(std::time::Duration::from_millis(20));

        let stamps: Vec<u64> = [0, 1000, 2000, 2900]
            .into_iter()
            .map(|ts| stamped(&mut clock, Some(ts)))
            .collect();
        assert_eq!(stamps, vec![0, 1000, 2000, 2900]);
        assert!(clock.is_timed());
    }

    #[test]
    fn test_timed_stream_fills_a_missing_timestamp() {
        let mut clock = FrameClock::offline(Some(10.0));
        assert_eq!(stamped(&mut clock, Some(500)), 500);
        assert_eq!(stamped(&mut clock, None), 600);
    }

    #[test]
    fn test_untimed_stream_ignores_later_timestamps() {
        let mut clock = FrameClock::offline(Some(10.0));
        assert_eq!(stamped(&mut clock, None), 0);
        assert_eq!(stamped(&mut clock, Some(0)), 100);
        assert_eq!(stamped(&mut clock, Some(50_000)), 200);
    }

    #[test]
    fn test_live_untimed_frames_never_run_behind_wall_time() {
        let mut clock = FrameClock::live(Some(1000.0));
        let first = stamped(&mut clock, None);
        std::thread::sleep(std::time::Duration::from_millis(30));
        let second = stamped(&mut clock, None);
        assert!(second >= first + 30, "{} then {}", first, second);
    }

    #[test]
    fn test_invalid_frame_rate_falls_back_to_default() {
        let mut clock = FrameClock::offline(Some(-5.0));
        stamped(&mut clock, None);
        assert_eq!(stamped(&mut clock, None), 33);
    }
}
