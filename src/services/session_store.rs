use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::config::TrackerConfig;
use crate::models::{ExerciseType, FrameObservation, SessionOptions, SessionSnapshot, SessionSummary};
use crate::services::errors::TrackerError;
use crate::services::frame_clock::FrameClock;
use crate::services::rep_counter::RepCounter;

struct TrackedSession {
    counter: RepCounter,
    clock: FrameClock,
}

/// In-memory registry of client-driven tracking sessions
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, TrackedSession>>>,
    config: TrackerConfig,
}

impl SessionStore {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Open a session for an exercise and return its id
    pub async fn create(
        &self,
        exercise: &ExerciseType,
        options: SessionOptions,
    ) -> Result<(Uuid, SessionSnapshot), TrackerError> {
        let counter = RepCounter::new(exercise, options, &self.config)?;
        let snapshot = counter.snapshot();
        let id = Uuid::new_v4();

        self.sessions.write().await.insert(
            id,
            TrackedSession {
                clock: FrameClock::live(counter.fps()),
                counter,
            },
        );

        info!(session_id = %id, exercise = %exercise, "Session created");
        Ok((id, snapshot))
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, TrackerError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .map(|session| session.counter.snapshot())
            .ok_or(TrackerError::SessionNotFound(id))
    }

    /// Feed frames to a session in order
    ///
    /// The session's first frame decides whether it is timed. Frames of an
    /// untimed session are spaced at the session's frame rate and never fall
    /// behind the time since the session was created.
    pub async fn ingest(
        &self,
        id: Uuid,
        frames: Vec<FrameObservation>,
    ) -> Result<SessionSnapshot, TrackerError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or(TrackerError::SessionNotFound(id))?;

        for mut frame in frames {
            session.clock.stamp(&mut frame);
            session.counter.observe(&frame);
        }

        Ok(session.counter.snapshot())
    }

    pub async fn next_set(&self, id: Uuid) -> Result<SessionSnapshot, TrackerError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or(TrackerError::SessionNotFound(id))?;

        session.counter.start_next_set()?;
        Ok(session.counter.snapshot())
    }

    /// Summary of a session that stays open
    pub async fn summary(&self, id: Uuid) -> Result<SessionSummary, TrackerError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .map(|session| session.counter.clone().finish())
            .ok_or(TrackerError::SessionNotFound(id))
    }

    /// Close a session and return its summary
    pub async fn finish(&self, id: Uuid) -> Result<SessionSummary, TrackerError> {
        let session = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(TrackerError::SessionNotFound(id))?;

        let summary = session.counter.finish();
        info!(
            session_id = %id,
            reps = summary.reps,
            form_score = summary.form_score,
            "Session finished"
        );
        Ok(summary)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
