use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: String,
    pub tracker: TrackerConfig,
    pub capture: CaptureConfig,
}

/// Rep tracking settings shared by every session
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Landmarks below this visibility are treated as missing
    pub min_visibility: f32,
    /// Qualifying transitions closer than this to the previous rep are not counted
    pub min_rep_interval_ms: u64,
    /// Moving average window over the joint angle; 1 disables smoothing
    pub smoothing_window: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_visibility: 0.5,
            min_rep_interval_ms: 700,
            smoothing_window: 1,
        }
    }
}

/// Background capture loop settings
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Pause between frames in the capture loop
    pub interval_ms: u64,
    /// Recorded landmark frames replayed as the live source
    pub replay_path: Option<PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval_ms: 30,
            replay_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .unwrap_or(8000);
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = TrackerConfig::default();
        let tracker = TrackerConfig {
            min_visibility: parse_var("MIN_LANDMARK_VISIBILITY", defaults.min_visibility)?,
            min_rep_interval_ms: parse_var("MIN_REP_INTERVAL_MS", defaults.min_rep_interval_ms)?,
            smoothing_window: parse_var("ANGLE_SMOOTHING_WINDOW", defaults.smoothing_window)?,
        };

        let capture = CaptureConfig {
            interval_ms: parse_var("CAPTURE_INTERVAL_MS", CaptureConfig::default().interval_ms)?,
            replay_path: env::var("CAPTURE_REPLAY_PATH").ok().map(PathBuf::from),
        };

        Ok(AppConfig {
            host,
            port,
            environment,
            log_level,
            tracker,
            capture,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_defaults() {
        let tracker = TrackerConfig::default();
        assert_eq!(tracker.min_visibility, 0.5);
        assert_eq!(tracker.min_rep_interval_ms, 700);
        assert_eq!(tracker.smoothing_window, 1);
    }

    #[test]
    fn test_parse_var_falls_back_when_unset() {
        let value: u64 = parse_var("PHYSIO_COACH_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_server_address() {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            environment: "test".to_string(),
            log_level: "debug".to_string(),
            tracker: TrackerConfig::default(),
            capture: CaptureConfig::default(),
        };
        assert_eq!(config.server_address(), "127.0.0.1:8000");
        assert!(!config.is_production());
    }
}
