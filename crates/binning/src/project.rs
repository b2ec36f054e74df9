//! Cell-to-point projection.
//!
//! Replaces (or adds) the coordinate columns of a cell-keyed table with the
//! provider's representative point of each row's cell. The result is not the
//! input coordinate; it only lies inside the same cell.

use std::collections::HashMap;

use geo_index::{CellId, GeoIndex};
use tracing::debug;

use crate::error::{BinningError, Result};
use crate::table::{CellGroupTable, PointTable};

/// A table whose rows are keyed by a grid cell and carry a coordinate pair.
pub trait CellKeyed {
    /// The cell column, or `None` if the table has none.
    fn cell_column(&self) -> Option<&[CellId]>;

    /// Overwrite the coordinate columns. Both vectors have one entry per row.
    fn replace_coordinates(&mut self, latitude: Vec<f64>, longitude: Vec<f64>);
}

impl CellKeyed for PointTable {
    fn cell_column(&self) -> Option<&[CellId]> {
        self.cell_ids()
    }

    fn replace_coordinates(&mut self, latitude: Vec<f64>, longitude: Vec<f64>) {
        self.set_coordinates(latitude, longitude);
    }
}

impl CellKeyed for CellGroupTable {
    fn cell_column(&self) -> Option<&[CellId]> {
        Some(self.cell_ids())
    }

    fn replace_coordinates(&mut self, latitude: Vec<f64>, longitude: Vec<f64>) {
        self.set_coordinates(latitude, longitude);
    }
}

/// Set every row's `latitude`/`longitude` to the representative point of its
/// cell.
///
/// # Errors
///
/// - [`BinningError::MissingCellId`] if the table has no cell column.
/// - [`BinningError::GeoIndex`] if the provider rejects any cell id; no
///   partial table is returned.
pub fn project<T, G>(table: &T, index: &G) -> Result<T>
where
    T: CellKeyed + Clone,
    G: GeoIndex + ?Sized,
{
    let cells = table.cell_column().ok_or(BinningError::MissingCellId)?;

    // Point tables repeat cells heavily
    let mut centroids: HashMap<CellId, (f64, f64)> = HashMap::new();
    let mut latitude = Vec::with_capacity(cells.len());
    let mut longitude = Vec::with_capacity(cells.len());
    for &cell in cells {
        let (lat, lon) = match centroids.get(&cell) {
            Some(&point) => point,
            None => {
                let point = index.to_point(cell)?;
                centroids.insert(cell, point);
                point
            }
        };
        latitude.push(lat);
        longitude.push(lon);
    }

    debug!(
        rows = cells.len(),
        distinct_cells = centroids.len(),
        "Projected cells to representative points"
    );

    let mut projected = table.clone();
    projected.replace_coordinates(latitude, longitude);
    Ok(projected)
}
