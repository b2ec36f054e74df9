//! Cell assignment: attach a grid cell to every point that has a value.

use geo_index::{CellId, GeoIndex};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{BinningError, Result};
use crate::table::PointTable;

/// Assign every point with a defined value to its grid cell at `resolution`.
///
/// Rows without a value are dropped; the surviving rows keep their relative
/// order. An existing `cell_id` column is replaced, so assigning twice with
/// the same resolution is a no-op.
///
/// # Errors
///
/// - [`BinningError::InvalidResolution`] if `index` does not support
///   `resolution`; raised before any row is looked at.
/// - [`BinningError::GeoIndex`] if the provider rejects a coordinate.
pub fn assign_cells<G>(points: &PointTable, resolution: u8, index: &G) -> Result<PointTable>
where
    G: GeoIndex + ?Sized,
{
    check_resolution(index, resolution)?;
    let keep = rows_with_values(points);

    let cells = keep
        .iter()
        .map(|&i| cell_of(points, i, resolution, index))
        .collect::<Result<Vec<CellId>>>()?;

    finish(points, &keep, cells, resolution)
}

/// Parallel form of [`assign_cells`]; produces the identical table.
///
/// Each row's cell depends only on that row, so lookups are spread over the
/// rayon pool and collected back in input order.
pub fn assign_cells_par<G>(points: &PointTable, resolution: u8, index: &G) -> Result<PointTable>
where
    G: GeoIndex + ?Sized,
{
    check_resolution(index, resolution)?;
    let keep = rows_with_values(points);

    let cells = keep
        .par_iter()
        .map(|&i| cell_of(points, i, resolution, index))
        .collect::<Result<Vec<CellId>>>()?;

    finish(points, &keep, cells, resolution)
}

pub(crate) fn check_resolution<G: GeoIndex + ?Sized>(index: &G, resolution: u8) -> Result<()> {
    if index.is_valid_resolution(resolution) {
        return Ok(());
    }
    let range = index.resolution_range();
    Err(BinningError::InvalidResolution {
        resolution,
        min: *range.start(),
        max: *range.end(),
    })
}

fn rows_with_values(points: &PointTable) -> Vec<usize> {
    points
        .values()
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_some_and(|v| !v.is_nan()))
        .map(|(i, _)| i)
        .collect()
}

#[inline]
fn cell_of<G: GeoIndex + ?Sized>(
    points: &PointTable,
    row: usize,
    resolution: u8,
    index: &G,
) -> Result<CellId> {
    let lat = points.latitude()[row];
    let lon = points.longitude()[row];
    Ok(index.to_cell(lat, lon, resolution)?)
}

fn finish(
    points: &PointTable,
    keep: &[usize],
    cells: Vec<CellId>,
    resolution: u8,
) -> Result<PointTable> {
    let dropped = points.len() - keep.len();
    debug!(
        input = points.len(),
        assigned = keep.len(),
        dropped,
        resolution,
        "Assigned points to grid cells"
    );
    metrics::counter!("binning_points_dropped_total").increment(dropped as u64);

    points.take(keep).with_cell_ids(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use geo_index::H3Index;

    fn points() -> PointTable {
        PointTable::new(
            vec![13.40, 13.41, 2.35, -74.0],
            vec![52.52, 52.52, 48.85, 40.7],
            vec![Some(1.0), None, Some(3.0), Some(4.0)],
            vec![0.9; 4],
            vec![Utc::now(); 4],
        )
        .unwrap()
    }

    #[test]
    fn test_assign_drops_missing_values() {
        let index = H3Index::new();
        let assigned = assign_cells(&points(), 5, &index).unwrap();
        assert_eq!(assigned.len(), 3);
        assert_eq!(assigned.longitude(), &[13.40, 2.35, -74.0]);
        assert_eq!(assigned.cell_ids().unwrap().len(), 3);
    }

    #[test]
    fn test_assign_matches_provider_per_row() {
        let index = H3Index::new();
        let assigned = assign_cells(&points(), 8, &index).unwrap();
        for point in assigned.iter() {
            let expected = index.to_cell(point.latitude, point.longitude, 8).unwrap();
            assert_eq!(point.cell_id, Some(expected));
        }
    }

    #[test]
    fn test_assign_rejects_resolution_before_work() {
        let index = H3Index::new();
        let err = assign_cells(&points(), 16, &index).unwrap_err();
        assert_eq!(
            err,
            BinningError::InvalidResolution {
                resolution: 16,
                min: 0,
                max: 15
            }
        );

        // Even an empty table is rejected
        let err = assign_cells(&PointTable::default(), 200, &index).unwrap_err();
        assert!(matches!(err, BinningError::InvalidResolution { .. }));
    }

    #[test]
    fn test_assign_fails_whole_call_on_bad_coordinate() {
        let index = H3Index::new();
        let points = PointTable::new(
            vec![1.0, f64::NAN],
            vec![1.0, 1.0],
            vec![Some(1.0), Some(2.0)],
            vec![0.9, 0.9],
            vec![Utc::now(); 2],
        )
        .unwrap();
        let err = assign_cells(&points, 3, &index).unwrap_err();
        assert!(matches!(err, BinningError::GeoIndex(_)));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let index = H3Index::new();
        let points = points();
        assert_eq!(
            assign_cells(&points, 6, &index).unwrap(),
            assign_cells_par(&points, 6, &index).unwrap()
        );
    }

    #[test]
    fn test_reassign_is_idempotent() {
        let index = H3Index::new();
        let once = assign_cells(&points(), 4, &index).unwrap();
        let twice = assign_cells(&once, 4, &index).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_reassign_at_other_resolution_replaces_column() {
        let index = H3Index::new();
        let coarse = assign_cells(&points(), 2, &index).unwrap();
        let fine = assign_cells(&coarse, 9, &index).unwrap();
        for cell in fine.cell_ids().unwrap() {
            assert_eq!(index.resolution_of(*cell).unwrap(), 9);
        }
    }
}
