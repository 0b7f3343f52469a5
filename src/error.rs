use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the pacing scheduler.
///
/// These never reach the reader: the controller only arms intervals derived from
/// validated settings, so an `InvalidInterval` means a caller bypassed the settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PacingError {
    #[error("timer interval must be finite and positive, got {millis}ms")]
    InvalidInterval { millis: f64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} = {value} is outside the allowed range {allowed}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        allowed: String,
    },

    #[error("environment variable {name} is not a valid integer: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReactorError {
    #[error("playback reactor has shut down")]
    Closed,

    #[error("playback reactor command queue is full")]
    Full,
}
