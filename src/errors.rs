// SPDX-License-Identifier: MPL-2.0

//! Error types for the point cloud pipeline
//!
//! Nothing in this crate is allowed to take the process down: pool
//! exhaustion and malformed frames are rejections the caller may retry,
//! snapshot failures are reported and forgotten. The only hard error is
//! failing to construct the pipeline itself.

use std::fmt;

/// Result type alias using PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised while constructing or controlling a pipeline
#[derive(Debug, Clone)]
pub enum PipelineError {
    /// Pool dimensions were zero or the capacity was zero
    InvalidDimensions { width: usize, height: usize },
    /// Frame pool capacity must be at least one slot
    InvalidCapacity(usize),
    /// Configuration could not be read or parsed
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Non-fatal rejection of a submitted frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// No writable slot: the pool is full or the consumer holds the
    /// write candidate. The caller may retry next cycle.
    PoolFull,
    /// The pipeline has not been started (or has been stopped)
    NotActive,
    /// Frame buffers are empty or do not match the stated dimensions
    InvalidFrame(String),
}

/// Snapshot (point cloud file write) errors; reported, never fatal
#[derive(Debug, Clone)]
pub enum SnapshotError {
    /// The displayed cloud had no valid points to write
    EmptyCloud,
    /// Filesystem failure creating or writing the output file
    Io(String),
    /// LAS header or point encoding failure
    Encode(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::InvalidDimensions { width, height } => {
                write!(f, "Invalid frame dimensions: {}x{}", width, height)
            }
            PipelineError::InvalidCapacity(n) => {
                write!(f, "Invalid pool capacity: {}", n)
            }
            PipelineError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PipelineError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::PoolFull => write!(f, "Frame pool has no writable slot"),
            SubmitError::NotActive => write!(f, "Pipeline is not running"),
            SubmitError::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
        }
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::EmptyCloud => write!(f, "No valid points to export"),
            SnapshotError::Io(msg) => write!(f, "Snapshot I/O failure: {}", msg),
            SnapshotError::Encode(msg) => write!(f, "Snapshot encoding failure: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}
impl std::error::Error for SubmitError {}
impl std::error::Error for SnapshotError {}

impl From<String> for PipelineError {
    fn from(msg: String) -> Self {
        PipelineError::Other(msg)
    }
}

impl From<&str> for PipelineError {
    fn from(msg: &str) -> Self {
        PipelineError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(err: std::io::Error) -> Self {
        SnapshotError::Io(err.to_string())
    }
}
