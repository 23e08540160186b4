//! Error types for world-kpi-core (WASM-compatible)

use thiserror::Error;

/// Result type alias for world-kpi-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that work in both native and WASM environments.
///
/// Malformed rows and non-numeric values are not errors: the pipeline drops
/// or carries them as `NaN` instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Aggregation requires a variable filter")]
    MissingVariable,

    #[error("Invalid filter expression: {0}")]
    InvalidFilter(String),

    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),

    #[error("Unknown value field: {0} (expected value or count)")]
    UnknownField(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
