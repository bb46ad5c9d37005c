use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::analysis::{analysis_routes, list_exercises, score_angle_handler};
use super::capture::capture_routes;
use super::health::health_check;
use super::sessions::session_routes;
use crate::config::TrackerConfig;
use crate::services::{CaptureService, ReportService, SessionStore};

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub capture: Arc<CaptureService>,
    pub reports: Arc<ReportService>,
    pub tracker: TrackerConfig,
}

impl AppState {
    pub fn new(tracker: TrackerConfig, capture: CaptureService) -> Self {
        Self {
            sessions: SessionStore::new(tracker.clone()),
            capture: Arc::new(capture),
            reports: Arc::new(ReportService::new()),
            tracker,
        }
    }
}

pub fn create_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/exercises", get(list_exercises))
        .route("/score", post(score_angle_handler))
        .nest("/sessions", session_routes())
        .nest("/capture", capture_routes())
        .merge(analysis_routes());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
