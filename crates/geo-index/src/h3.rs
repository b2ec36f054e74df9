//! H3 hexagonal grid provider.
//!
//! H3 tiles the icosahedron-projected sphere with hexagons (plus twelve
//! pentagons per resolution). Resolution 0 has 122 cells with ~1100 km edges;
//! every step down divides the cell area by roughly seven, down to
//! resolution 15 at ~0.5 m edges.
//!
//! Reference: <https://h3geo.org/docs/core-library/restable>

use std::ops::RangeInclusive;

use h3o::{CellIndex, LatLng, Resolution};

use crate::cell::CellId;
use crate::error::{GeoIndexError, Result};
use crate::GeoIndex;

/// Coarsest H3 resolution.
pub const MIN_RESOLUTION: u8 = 0;

/// Finest H3 resolution.
pub const MAX_RESOLUTION: u8 = 15;

/// [`GeoIndex`] backed by the `h3o` crate.
///
/// Stateless; cheap to construct and share between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct H3Index;

impl H3Index {
    pub fn new() -> Self {
        Self
    }

    fn resolution(resolution: u8) -> Result<Resolution> {
        Resolution::try_from(resolution).map_err(|_| GeoIndexError::InvalidResolution(resolution))
    }

    fn cell_index(cell: CellId) -> Result<CellIndex> {
        CellIndex::try_from(cell.get()).map_err(|_| GeoIndexError::InvalidCell(cell.get()))
    }
}

impl GeoIndex for H3Index {
    fn to_cell(&self, lat: f64, lon: f64, resolution: u8) -> Result<CellId> {
        let resolution = Self::resolution(resolution)?;
        let coord =
            LatLng::new(lat, lon).map_err(|_| GeoIndexError::invalid_coordinate(lat, lon))?;
        Ok(CellId::new(u64::from(coord.to_cell(resolution))))
    }

    fn to_point(&self, cell: CellId) -> Result<(f64, f64)> {
        let center = LatLng::from(Self::cell_index(cell)?);
        Ok((center.lat(), center.lng()))
    }

    fn resolution_range(&self) -> RangeInclusive<u8> {
        MIN_RESOLUTION..=MAX_RESOLUTION
    }

    fn resolution_of(&self, cell: CellId) -> Result<u8> {
        Ok(u8::from(Self::cell_index(cell)?.resolution()))
    }
}
