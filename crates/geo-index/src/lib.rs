//! Discrete global grid indexing.
//!
//! The binning pipeline never does grid math itself. It talks to a
//! [`GeoIndex`] provider that knows how to:
//!
//! - map a `(latitude, longitude, resolution)` triple to a [`CellId`]
//! - map a [`CellId`] back to a representative coordinate inside the cell
//! - report which resolutions it supports
//!
//! Any grid that partitions the sphere at each resolution can stand in for
//! the default [`H3Index`], which wraps the pure-Rust `h3o` implementation of
//! Uber's H3 hexagonal grid.
//!
//! # Example
//!
//! ```
//! use geo_index::{GeoIndex, H3Index};
//!
//! let index = H3Index::new();
//! let cell = index.to_cell(48.8566, 2.3522, 7).unwrap();
//! let (lat, lon) = index.to_point(cell).unwrap();
//!
//! // The centroid lies in the same cell
//! assert_eq!(index.to_cell(lat, lon, 7).unwrap(), cell);
//! ```

pub mod cell;
pub mod error;
pub mod h3;

use std::ops::RangeInclusive;

pub use cell::CellId;
pub use error::{GeoIndexError, Result};
pub use h3::H3Index;

/// A discrete global grid that can address any coordinate on the sphere.
///
/// Implementations must be deterministic: the same input always yields the
/// same cell. Cells at one resolution partition the sphere, and
/// [`to_point`](GeoIndex::to_point) returns a coordinate strictly inside the
/// cell it was given.
///
/// The trait is `Send + Sync` so a single provider can be shared by the
/// parallel assignment path.
pub trait GeoIndex: Send + Sync {
    /// Cell containing `(lat, lon)` (degrees) at `resolution`.
    fn to_cell(&self, lat: f64, lon: f64, resolution: u8) -> Result<CellId>;

    /// Representative `(lat, lon)` of a cell, in degrees.
    fn to_point(&self, cell: CellId) -> Result<(f64, f64)>;

    /// Resolutions this grid supports, coarsest first.
    fn resolution_range(&self) -> RangeInclusive<u8>;

    /// Resolution a cell identifier was produced at.
    fn resolution_of(&self, cell: CellId) -> Result<u8>;

    /// Whether `resolution` lies within [`resolution_range`](GeoIndex::resolution_range).
    fn is_valid_resolution(&self, resolution: u8) -> bool {
        self.resolution_range().contains(&resolution)
    }
}

impl<T: GeoIndex + ?Sized> GeoIndex for &T {
    fn to_cell(&self, lat: f64, lon: f64, resolution: u8) -> Result<CellId> {
        (**self).to_cell(lat, lon, resolution)
    }

    fn to_point(&self, cell: CellId) -> Result<(f64, f64)> {
        (**self).to_point(cell)
    }

    fn resolution_range(&self) -> RangeInclusive<u8> {
        (**self).resolution_range()
    }

    fn resolution_of(&self, cell: CellId) -> Result<u8> {
        (**self).resolution_of(cell)
    }
}
