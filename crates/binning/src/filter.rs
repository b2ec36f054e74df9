//! Quality filtering.

use tracing::debug;

use crate::table::PointTable;

/// Product-recommended quality cutoff for Sentinel-5P L2 data.
pub const DEFAULT_MINIMAL_QUALITY: f32 = 0.5;

/// Keep the rows with `quality >= minimal_quality`, preserving order.
///
/// The threshold is not range-checked: anything above every quality yields
/// an empty table, anything at or below the lowest quality yields all rows.
/// Rows with a `NaN` quality never pass.
pub fn filter_by_quality(points: &PointTable, minimal_quality: f32) -> PointTable {
    let keep: Vec<usize> = points
        .quality()
        .iter()
        .enumerate()
        .filter(|(_, &q)| q >= minimal_quality)
        .map(|(i, _)| i)
        .collect();

    let removed = points.len() - keep.len();
    debug!(
        input = points.len(),
        kept = keep.len(),
        removed,
        minimal_quality,
        "Filtered points by quality"
    );
    metrics::counter!("binning_points_filtered_total").increment(removed as u64);

    points.take(&keep)
}
