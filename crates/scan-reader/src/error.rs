//! Error types for scan reading.

use binning::BinningError;
use thiserror::Error;

/// Result type for scan reader operations.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Error types for decoding a swath product.
#[derive(Error, Debug)]
pub enum ScanError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON scan dump
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A variable does not match the swath dimensions
    #[error("variable '{variable}' has {actual} elements, expected {expected}")]
    ShapeMismatch {
        variable: String,
        expected: usize,
        actual: usize,
    },

    /// Missing required variable or attribute
    #[error("missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("invalid data format: {0}")]
    InvalidFormat(String),

    /// Unparsable time reference
    #[error("invalid time reference '{0}'")]
    InvalidTimeReference(String),

    /// No reader handles this file
    #[error("unsupported scan format: {0}")]
    UnsupportedFormat(String),

    /// Decoded columns could not form a point table
    #[error("table error: {0}")]
    Table(#[from] BinningError),
}

impl ScanError {
    pub fn shape_mismatch(variable: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            variable: variable.into(),
            expected,
            actual,
        }
    }

    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingData(what.into())
    }
}
