//! Error types for geo-index providers.

use thiserror::Error;

/// Errors raised by a [`GeoIndex`](crate::GeoIndex) provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoIndexError {
    /// The grid has no level at this resolution.
    #[error("unsupported grid resolution: {0}")]
    InvalidResolution(u8),

    /// The coordinate cannot be placed on the grid (e.g. NaN or infinite).
    #[error("invalid coordinate: lat={lat}, lon={lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    /// The identifier does not address a cell of this grid.
    #[error("invalid cell identifier: {0:#x}")]
    InvalidCell(u64),
}

impl GeoIndexError {
    /// Create an InvalidCoordinate error.
    pub fn invalid_coordinate(lat: f64, lon: f64) -> Self {
        Self::InvalidCoordinate { lat, lon }
    }
}

/// Result type for geo-index operations.
pub type Result<T> = std::result::Result<T, GeoIndexError>;
