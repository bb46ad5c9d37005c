// Tracking and reporting services

pub mod angle_calculator;
pub mod capture_service;
pub mod errors;
pub mod form_scoring;
pub mod frame_clock;
pub mod landmark_processor;
pub mod recording_analysis_service;
pub mod rep_counter;
pub mod report_service;
pub mod session_store;
pub mod threshold_table;

pub use angle_calculator::{compute_angle, joint_angle};
pub use capture_service::{CaptureService, PoseSource, PoseSourceFactory, ReplaySource};
pub use errors::TrackerError;
pub use form_scoring::{score_angle, score_for_exercise};
pub use frame_clock::FrameClock;
pub use landmark_processor::LandmarkProcessor;
pub use recording_analysis_service::{analyze_recording, RecordingAnalysis, RecordingRequest};
pub use rep_counter::{update_state, RepCounter};
pub use report_service::{PlainTextRenderer, ReportRenderer, ReportService};
pub use session_store::SessionStore;
pub use threshold_table::{profile_for, ExerciseProfile, IdealRange, ThresholdRule};
