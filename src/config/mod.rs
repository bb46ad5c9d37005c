pub mod app;

pub use app::{AppConfig, CaptureConfig, TrackerConfig};
