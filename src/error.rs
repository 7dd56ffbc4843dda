//! Error types for degradation detection.
//!
//! Insufficient history and degenerate baselines are *not* errors: they
//! are policy outcomes reported through `EntityStatus`. Everything here
//! aborts the whole call.

use thiserror::Error;

/// Result type alias for detection, loading and export.
pub type DegradationResult<T> = Result<T, DegradationError>;

#[derive(Error, Debug)]
pub enum DegradationError {
    // ========== Configuration ==========
    /// A threshold or guard is outside its valid range.
    #[error("Invalid configuration: {field} = {value} ({reason})")]
    InvalidConfig {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    // ========== Schema ==========
    /// A required column (entity or cycle) is absent.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// No column carries the sensor prefix.
    #[error("No sensor columns found (expected names starting with '{prefix}')")]
    NoSensorColumns { prefix: String },

    /// Column names are not unique.
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// Data width does not match the declared columns.
    #[error("Shape mismatch: expected {expected} columns, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    // ========== Lookups ==========
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    // ========== I/O ==========
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DegradationError {
    pub(crate) fn invalid_config(field: &'static str, value: impl ToString, reason: &'static str) -> Self {
        Self::InvalidConfig {
            field,
            value: value.to_string(),
            reason,
        }
    }
}
