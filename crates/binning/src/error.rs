//! Error types for the binning pipeline.
//!
//! Every stage either returns a complete table or one of these errors; there
//! is no row-level failure. All variants describe bad input, so none of them
//! is worth retrying.

use geo_index::GeoIndexError;
use thiserror::Error;

/// Errors that can occur while binning points.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BinningError {
    /// The grid has no level at the requested resolution.
    #[error("resolution {resolution} is outside the supported range {min}..={max}")]
    InvalidResolution { resolution: u8, min: u8, max: u8 },

    /// Unknown aggregation function name.
    #[error("unsupported reduction '{0}' (expected 'mean' or 'median')")]
    UnsupportedReduction(String),

    /// A row violates a stage precondition (e.g. a missing value reaching the aggregator).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The table has not been through cell assignment.
    #[error("table has no cell_id column")]
    MissingCellId,

    /// Columns passed to a table constructor differ in length.
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    ColumnLengthMismatch {
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The geo-index provider rejected a coordinate or cell.
    #[error("geo-index error: {0}")]
    GeoIndex(#[from] GeoIndexError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl BinningError {
    /// Create an InvalidInput error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type for binning operations.
pub type Result<T> = std::result::Result<T, BinningError>;
