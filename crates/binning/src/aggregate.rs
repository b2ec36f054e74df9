//! Per-cell aggregation of assigned points.
//!
//! Each distinct cell becomes one [`CellGroup`]:
//!
//! | column      | rule                         |
//! |-------------|------------------------------|
//! | `timestamp` | earliest member timestamp    |
//! | `quality`   | lowest member quality        |
//! | `value`     | [`Reduction`] of the values  |
//! | `count`     | number of members            |

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use geo_index::CellId;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BinningError, Result};
use crate::table::{CellGroup, CellGroupTable, PointTable};

/// How a cell's member values collapse into one value.
///
/// There is deliberately no `Default`: callers always pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Reduction {
    /// Arithmetic mean.
    Mean,
    /// Middle value; mean of the two middle values for even counts.
    Median,
}

impl Reduction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
        }
    }

    /// Reduce a non-empty slice. The slice may be reordered.
    pub fn apply(&self, values: &mut [f64]) -> f64 {
        match self {
            Self::Mean => mean(values),
            Self::Median => median(values),
        }
    }
}

impl FromStr for Reduction {
    type Err = BinningError;

    /// Case-insensitive; anything but `mean`/`median` is rejected.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            _ => Err(BinningError::UnsupportedReduction(s.to_string())),
        }
    }
}

impl TryFrom<String> for Reduction {
    type Error = BinningError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Group assigned points by cell and reduce each group.
///
/// Output row order is unspecified.
///
/// # Errors
///
/// - [`BinningError::MissingCellId`] if `points` has not been assigned.
/// - [`BinningError::InvalidInput`] if any row has no value; cell assignment
///   never lets one through, so this means the table was built by hand.
pub fn aggregate(points: &PointTable, reduction: Reduction) -> Result<CellGroupTable> {
    let groups = partition(points)?;
    let table: CellGroupTable = groups
        .iter()
        .map(|(cell, members)| reduce_group(points, *cell, members, reduction))
        .collect();

    log_groups(points, &table, reduction);
    Ok(table)
}

/// Parallel form of [`aggregate`]. Partitions are disjoint, so each group
/// is reduced independently on the rayon pool.
pub fn aggregate_par(points: &PointTable, reduction: Reduction) -> Result<CellGroupTable> {
    let groups = partition(points)?;
    let rows: Vec<CellGroup> = groups
        .par_iter()
        .map(|(cell, members)| reduce_group(points, *cell, members, reduction))
        .collect();
    let table: CellGroupTable = rows.into_iter().collect();

    log_groups(points, &table, reduction);
    Ok(table)
}

/// [`aggregate`] with the reduction given by name.
///
/// The name is validated before any grouping work.
pub fn aggregate_by_name(points: &PointTable, reduction: &str) -> Result<CellGroupTable> {
    let reduction = reduction.parse()?;
    aggregate(points, reduction)
}

/// Member row indices per cell, cells in order of first appearance.
fn partition(points: &PointTable) -> Result<Vec<(CellId, Vec<usize>)>> {
    let cells = points.cell_ids().ok_or(BinningError::MissingCellId)?;

    if let Some(row) = points
        .values()
        .iter()
        .position(|v| v.map_or(true, f64::is_nan))
    {
        return Err(BinningError::invalid_input(format!(
            "row {row} has no value; unassigned or missing values cannot be aggregated"
        )));
    }

    let mut slots: HashMap<CellId, usize> = HashMap::new();
    let mut groups: Vec<(CellId, Vec<usize>)> = Vec::new();
    for (row, &cell) in cells.iter().enumerate() {
        match slots.entry(cell) {
            Entry::Occupied(slot) => groups[*slot.get()].1.push(row),
            Entry::Vacant(slot) => {
                slot.insert(groups.len());
                groups.push((cell, vec![row]));
            }
        }
    }
    Ok(groups)
}

fn reduce_group(
    points: &PointTable,
    cell_id: CellId,
    members: &[usize],
    reduction: Reduction,
) -> CellGroup {
    let first = members[0];
    let timestamps = points.timestamps();
    let qualities = points.quality();

    let timestamp = members
        .iter()
        .map(|&i| timestamps[i])
        .fold(timestamps[first], |a, b| a.min(b));
    let quality = members
        .iter()
        .map(|&i| qualities[i])
        .fold(qualities[first], f32::min);

    let mut values: Vec<f64> = members
        .iter()
        .filter_map(|&i| points.values()[i])
        .collect();

    CellGroup {
        cell_id,
        timestamp,
        quality,
        value: reduction.apply(&mut values),
        count: members.len(),
        latitude: None,
        longitude: None,
    }
}

fn log_groups(points: &PointTable, table: &CellGroupTable, reduction: Reduction) {
    debug!(
        points = points.len(),
        groups = table.len(),
        %reduction,
        "Aggregated points per cell"
    );
    metrics::counter!("binning_cells_total").increment(table.len() as u64);
}

fn mean(values: &[f64]) -> f64 {
    let (sum, min, max) = values.iter().fold(
        (0.0, f64::INFINITY, f64::NEG_INFINITY),
        |(sum, min, max), &v| (sum + v, min.min(v), max.max(v)),
    );
    if values.is_empty() {
        return f64::NAN;
    }
    // Rounding can push the quotient just outside the members' range
    (sum / values.len() as f64).clamp(min, max)
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}
