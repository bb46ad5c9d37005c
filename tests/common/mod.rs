// Shared builders for integration tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use physio_coach::api::{create_routes, AppState};
use physio_coach::config::{CaptureConfig, TrackerConfig};
use physio_coach::models::{BodyLandmark, FrameObservation, Landmark};
use physio_coach::services::{CaptureService, PoseSourceFactory};
use serde_json::Value;
use tower::ServiceExt;

/// Landmarks of one joint triple with the vertex angle at `degrees`
///
/// The first landmark sits straight above the vertex and the third is rotated
/// from it by `degrees`.
pub fn triple_landmarks(triple: [BodyLandmark; 3], origin_x: f64, degrees: f64) -> Vec<Landmark> {
    let radians = degrees.to_radians();
    let vertex = (origin_x, 0.5f64);
    let first = (vertex.0, vertex.1 - 0.2);
    let third = (
        vertex.0 + 0.2 * radians.sin(),
        vertex.1 - 0.2 * radians.cos(),
    );

    vec![
        Landmark::new(triple[0], first.0 as f32, first.1 as f32, 0.95),
        Landmark::new(triple[1], vertex.0 as f32, vertex.1 as f32, 0.95),
        Landmark::new(triple[2], third.0 as f32, third.1 as f32, 0.95),
    ]
}

/// A frame holding every given triple at the same angle
pub fn pose_frame(timestamp_ms: u64, triples: &[[BodyLandmark; 3]], degrees: f64) -> FrameObservation {
    let landmarks = triples
        .iter()
        .enumerate()
        .flat_map(|(i, triple)| triple_landmarks(*triple, 0.3 + 0.4 * i as f64, degrees))
        .collect();
    FrameObservation::new(timestamp_ms, landmarks)
}

pub fn elbow_frame(timestamp_ms: u64, degrees: f64) -> FrameObservation {
    pose_frame(
        timestamp_ms,
        &[[
            BodyLandmark::RightShoulder,
            BodyLandmark::RightElbow,
            BodyLandmark::RightWrist,
        ]],
        degrees,
    )
}

pub fn knee_frame(timestamp_ms: u64, degrees: f64) -> FrameObservation {
    pose_frame(
        timestamp_ms,
        &[
            [BodyLandmark::LeftHip, BodyLandmark::LeftKnee, BodyLandmark::LeftAnkle],
            [BodyLandmark::RightHip, BodyLandmark::RightKnee, BodyLandmark::RightAnkle],
        ],
        degrees,
    )
}

/// Tracker settings without the rep debounce
pub fn undebounced() -> TrackerConfig {
    TrackerConfig {
        min_rep_interval_ms: 0,
        ..TrackerConfig::default()
    }
}

pub fn quick_capture() -> CaptureConfig {
    CaptureConfig {
        interval_ms: 1,
        replay_path: None,
    }
}

pub fn test_app(factory: Option<PoseSourceFactory>) -> Router {
    let tracker = TrackerConfig::default();
    let capture = CaptureService::new(factory, tracker.clone(), &quick_capture());
    create_routes(AppState::new(tracker, capture))
}

pub fn json_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Send a request and return status and JSON body
pub async fn send(app: &Router, request: Request<Body>) -> (axum::http::StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, read_json(response).await)
}
