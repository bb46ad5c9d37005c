/// Live Capture Service
///
/// Runs one background loop that pulls frames from a pose source and feeds
/// them to a rep counter. The loop owns the counter outright; request
/// handlers only ever see snapshots published over a watch channel, and talk
/// back to the loop through a command channel.
///
/// The pose model and camera are external: a `PoseSource` yields landmark
/// frames and may block while doing so, so the loop runs on the blocking pool.

use crate::config::{CaptureConfig, TrackerConfig};
use crate::models::{ExerciseType, FrameObservation, SessionOptions, SessionSnapshot, SessionSummary};
use crate::services::errors::TrackerError;
use crate::services::frame_clock::FrameClock;
use crate::services::rep_counter::RepCounter;
use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Producer of landmark frames, e.g. a camera feeding a pose model
pub trait PoseSource: Send {
    /// Block until the next frame is available; `Ok(None)` ends the stream
    fn next_frame(&mut self) -> Result<Option<FrameObservation>>;
}

/// Opens a fresh pose source for each capture run
pub type PoseSourceFactory = Arc<dyn Fn() -> Result<Box<dyn PoseSource>> + Send + Sync>;

/// Replays recorded landmark frames in order
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    frames: VecDeque<FrameObservation>,
}

impl ReplaySource {
    pub fn new(frames: Vec<FrameObservation>) -> Self {
        Self {
            frames: frames.into(),
        }
    }

    /// Load a JSON array of frames
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read replay file {}", path.as_ref().display())
        })?;
        let frames: Vec<FrameObservation> =
            serde_json::from_str(&raw).context("Failed to parse replay frames")?;
        Ok(Self::new(frames))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl PoseSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Option<FrameObservation>> {
        Ok(self.frames.pop_front())
    }
}

/// Factory replaying the same recording on every run
pub fn replay_factory(frames: Vec<FrameObservation>) -> PoseSourceFactory {
    Arc::new(move || Ok(Box::new(ReplaySource::new(frames.clone())) as Box<dyn PoseSource>))
}

/// Messages from request handlers to the capture loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureCommand {
    NextSet,
}

struct RunningCapture {
    cancel: CancellationToken,
    snapshots: watch::Receiver<SessionSnapshot>,
    commands: mpsc::UnboundedSender<CaptureCommand>,
    handle: JoinHandle<RepCounter>,
}

#[derive(Default)]
struct CaptureState {
    running: Option<RunningCapture>,
    last_snapshot: Option<SessionSnapshot>,
}

/// Live capture service
pub struct CaptureService {
    factory: Option<PoseSourceFactory>,
    tracker_config: TrackerConfig,
    interval: Duration,
    state: Mutex<CaptureState>,
}

impl CaptureService {
    pub fn new(
        factory: Option<PoseSourceFactory>,
        tracker_config: TrackerConfig,
        capture_config: &CaptureConfig,
    ) -> Self {
        Self {
            factory,
            tracker_config,
            interval: Duration::from_millis(capture_config.interval_ms),
            state: Mutex::new(CaptureState::default()),
        }
    }

    /// Build the service from configuration, wiring a replay source when configured
    pub fn from_config(tracker_config: TrackerConfig, capture_config: &CaptureConfig) -> Result<Self> {
        let factory = match &capture_config.replay_path {
            Some(path) => {
                let source = ReplaySource::from_json_file(path)?;
                info!(
                    "Loaded {} replay frames from {}",
                    source.len(),
                    path.display()
                );
                Some(replay_factory(source.frames.into_iter().collect()))
            }
            None => None,
        };
        Ok(Self::new(factory, tracker_config, capture_config))
    }

    pub fn is_available(&self) -> bool {
        self.factory.is_some()
    }

    /// Start capturing for an exercise, replacing any capture already running
    pub async fn start(
        &self,
        exercise: &ExerciseType,
        options: SessionOptions,
    ) -> Result<SessionSnapshot, TrackerError> {
        let factory = self.factory.as_ref().ok_or(TrackerError::CaptureUnavailable)?;
        let counter = RepCounter::new(exercise, options, &self.tracker_config)?;

        let mut state = self.state.lock().await;
        if let Some(previous) = state.running.take() {
            info!("Replacing running capture");
            previous.cancel.cancel();
            if let Err(e) = previous.handle.await {
                warn!("Previous capture loop ended abnormally: {}", e);
            }
        }

        let source = factory().context("Failed to open pose source")?;
        let initial = counter.snapshot();
        let (snapshot_tx, snapshot_rx) = watch::channel(initial.clone());
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let loop_cancel = cancel.clone();
        let interval = self.interval;
        let handle = tokio::task::spawn_blocking(move || {
            run_capture_loop(source, counter, snapshot_tx, command_rx, loop_cancel, interval)
        });

        state.running = Some(RunningCapture {
            cancel,
            snapshots: snapshot_rx,
            commands: command_tx,
            handle,
        });
        state.last_snapshot = None;

        info!(exercise = %exercise, "Capture started");
        Ok(initial)
    }

    /// Latest published state of the running (or most recently stopped) capture
    pub async fn snapshot(&self) -> Result<SessionSnapshot, TrackerError> {
        let state = self.state.lock().await;
        match &state.running {
            Some(running) => Ok(running.snapshots.borrow().clone()),
            None => state
                .last_snapshot
                .clone()
                .ok_or(TrackerError::CaptureNotRunning),
        }
    }

    /// Ask the capture loop to resume counting after a completed set
    pub async fn next_set(&self) -> Result<(), TrackerError> {
        let state = self.state.lock().await;
        let running = state.running.as_ref().ok_or(TrackerError::CaptureNotRunning)?;
        running
            .commands
            .send(CaptureCommand::NextSet)
            .map_err(|_| TrackerError::CaptureNotRunning)
    }

    /// True while the loop is still pulling frames
    pub async fn is_running(&self) -> bool {
        let state = self.state.lock().await;
        state
            .running
            .as_ref()
            .map_or(false, |running| !running.handle.is_finished())
    }

    /// Stop the loop and summarize the capture
    pub async fn stop(&self) -> Result<SessionSummary, TrackerError> {
        let mut state = self.state.lock().await;
        let running = state.running.take().ok_or(TrackerError::CaptureNotRunning)?;

        running.cancel.cancel();
        let counter = running
            .handle
            .await
            .context("Capture loop panicked")?;

        state.last_snapshot = Some(counter.snapshot());
        let summary = counter.finish();
        info!(
            exercise = %summary.exercise,
            reps = summary.reps,
            "Capture stopped"
        );
        Ok(summary)
    }
}

fn run_capture_loop(
    mut source: Box<dyn PoseSource>,
    mut counter: RepCounter,
    snapshots: watch::Sender<SessionSnapshot>,
    mut commands: mpsc::UnboundedReceiver<CaptureCommand>,
    cancel: CancellationToken,
    interval: Duration,
) -> RepCounter {
    let mut clock = FrameClock::live(counter.fps());

    while !cancel.is_cancelled() {
        while let Ok(command) = commands.try_recv() {
            match command {
                CaptureCommand::NextSet => {
                    if let Err(e) = counter.start_next_set() {
                        warn!("Ignoring next set request: {}", e);
                    }
                }
            }
            snapshots.send_replace(counter.snapshot());
        }

        match source.next_frame() {
            Ok(Some(mut frame)) => {
                clock.stamp(&mut frame);
                counter.observe(&frame);
                snapshots.send_replace(counter.snapshot());
            }
            Ok(None) => {
                info!("Pose source exhausted, capture loop ending");
                break;
            }
            Err(e) => {
                warn!("Failed to read frame: {:#}", e);
            }
        }

        if !interval.is_zero() {
            std::thread::sleep(interval);
        }
    }

    counter
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSource {
        failures: usize,
    }

    impl PoseSource for FailingSource {
        fn next_frame(&mut self) -> Result<Option<FrameObservation>> {
            if self.failures == 0 {
                return Ok(None);
            }
            self.failures -= 1;
            anyhow::bail!("camera read failed")
        }
    }

    fn quick_capture() -> CaptureConfig {
        CaptureConfig {
            interval_ms: 0,
            replay_path: None,
        }
    }

    #[test]
    fn test_replay_source_drains_in_order() {
        let mut source = ReplaySource::new(vec![
            FrameObservation::empty(1),
            FrameObservation::empty(2),
        ]);
        assert_eq!(source.len(), 2);
        assert_eq!(source.next_frame().unwrap().unwrap().timestamp_ms, Some(1));
        assert_eq!(source.next_frame().unwrap().unwrap().timestamp_ms, Some(2));
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.is_empty());
    }

    #[test]
    fn test_replay_source_from_missing_file() {
        assert!(ReplaySource::from_json_file("/nonexistent/replay.json").is_err());
    }

    #[tokio::test]
    async fn test_start_without_source_is_unavailable() {
        let service = CaptureService::new(None, TrackerConfig::default(), &quick_capture());
        assert!(!service.is_available());
        let result = service
            .start(&ExerciseType::Squat, SessionOptions::default())
            .await;
        assert!(matches!(result, Err(TrackerError::CaptureUnavailable)));
    }

    #[tokio::test]
    async fn test_stop_without_capture() {
        let service = CaptureService::new(None, TrackerConfig::default(), &quick_capture());
        assert!(matches!(
            service.stop().await,
            Err(TrackerError::CaptureNotRunning)
        ));
        assert!(matches!(
            service.snapshot().await,
            Err(TrackerError::CaptureNotRunning)
        ));
    }

    #[tokio::test]
    async fn test_source_errors_do_not_end_loop() {
        let factory: PoseSourceFactory =
            Arc::new(|| Ok(Box::new(FailingSource { failures: 3 }) as Box<dyn PoseSource>));
        let service =
            CaptureService::new(Some(factory), TrackerConfig::default(), &quick_capture());

        service
            .start(&ExerciseType::Squat, SessionOptions::default())
            .await
            .unwrap();

        for _ in 0..100 {
            if !service.is_running().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let summary = service.stop().await.unwrap();
        assert_eq!(summary.reps, 0);
    }
}
