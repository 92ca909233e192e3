//! Error types for generation, persistence and configuration

use std::path::PathBuf;
use thiserror::Error;

use crate::spatial::chunk::ChunkPosition;

/// Main error type for all fallible generation operations
///
/// Collapse and propagation never fail with an error: contradictions are
/// counted in statistics and logged. Errors are reserved for bad input,
/// missing chunks and the filesystem.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Parameter validation failed
    #[error("Invalid parameter '{parameter}' = '{value}': {reason}")]
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Serialized chunk text is malformed
    #[error("Parse error on line {line}: {reason}")]
    Parse {
        /// 1-based line number of the offending record
        line: usize,
        /// Description of what was expected
        reason: String,
    },

    /// A state id lies outside the configured state count
    #[error("State {state} is out of range (state count: {state_count})")]
    InvalidState {
        /// The invalid state id
        state: usize,
        /// Number of configured states
        state_count: usize,
    },

    /// A chunk the operation needs is not loaded
    #[error("Chunk {position} is not loaded")]
    ChunkNotFound {
        /// Position of the missing chunk
        position: ChunkPosition,
    },

    /// Curve construction or evaluation failed
    #[error("Interpolation error: {reason}")]
    Interpolation {
        /// Description of the failure
        reason: String,
    },

    /// Configuration file could not be decoded
    #[error("Invalid configuration in '{}': {source}", path.display())]
    Config {
        /// Path of the configuration file
        path: PathBuf,
        /// Underlying TOML error
        source: Box<toml::de::Error>,
    },

    /// Failed to save a rendered slice to disk
    #[error("Failed to export image to '{}': {source}", path.display())]
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// A worker thread could not be started
    #[error("Failed to spawn worker thread {index}: {source}")]
    WorkerSpawn {
        /// Index of the worker in the pool
        index: usize,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// General file system operation failure
    #[error("File system error during {operation} on '{}': {source}", path.display())]
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// Convenience type alias for generation results
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> GenerationError {
    GenerationError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a parse error for a 1-based line number
pub fn parse_error(line: usize, reason: &impl ToString) -> GenerationError {
    GenerationError::Parse {
        line,
        reason: reason.to_string(),
    }
}
