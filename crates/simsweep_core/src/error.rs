use std::io;
use std::path::PathBuf;

use crate::engine::EngineError;

/// Problems that make a sweep impossible to start. Nothing has run when one
/// of these is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("axis '{axis}' has non-positive step {step}")]
    NonPositiveStep { axis: String, step: f64 },

    #[error("axis '{axis}' has a non-finite bound")]
    NonFiniteBound { axis: String },

    #[error("axis '{axis}' is empty: start {start} exceeds max {max}")]
    EmptyAxis { axis: String, start: f64, max: f64 },

    #[error("axis '{axis}' would produce more than {limit} points")]
    TooManyPoints { axis: String, limit: usize },

    #[error("sweep would produce more than {limit} runs")]
    TooManyRuns { limit: usize },

    #[error("axis '{axis}' snaps its first value but starts at {start}; snapping needs a positive start")]
    SnapFromNonPositive { axis: String, start: f64 },

    #[error("axis '{0}' is declared more than once")]
    DuplicateAxis(String),

    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("engine rejected configuration: {0}")]
    Engine(#[from] EngineError),
}

/// I/O failures on the results log. Never fatal to a sweep.
#[derive(Debug, thiserror::Error)]
pub enum LogWriteError {
    #[error("failed to create results log {}: {source}", .path.display())]
    Create { path: PathBuf, source: io::Error },

    #[error("failed to read results log {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("results log {} has no header line", .path.display())]
    MissingHeader { path: PathBuf },

    #[error("failed to append to results log {}: {source}", .path.display())]
    Append { path: PathBuf, source: io::Error },

    #[error("results log {} is not in use ({reason})", .path.display())]
    Detached { path: PathBuf, reason: String },
}
