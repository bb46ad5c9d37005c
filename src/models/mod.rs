// Data models for landmarks, exercise sessions and reports

pub mod exercise;
pub mod landmark;
pub mod report;

pub use exercise::*;
pub use landmark::*;
pub use report::*;
