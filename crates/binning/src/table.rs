//! Columnar point and cell-group tables.
//!
//! Both tables store one `Vec` per column and hand out owned row structs
//! ([`Point`], [`CellGroup`]) on access. Stages never mutate a table they
//! were given; they build a new one.

use std::fmt;

use chrono::{DateTime, Utc};
use geo_index::CellId;
use serde::{Deserialize, Serialize};

use crate::error::{BinningError, Result};

/// Normalize a measured value: `NaN` counts as missing.
#[inline]
pub fn defined_value(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// One satellite ground-pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Degrees east, [-180, 180].
    pub longitude: f64,
    /// Degrees north, [-90, 90].
    pub latitude: f64,
    /// Measured quantity; `None` when the product flags it as missing.
    pub value: Option<f64>,
    /// Measurement confidence in [0, 1].
    pub quality: f32,
    /// Acquisition time of the ground-pixel.
    pub timestamp: DateTime<Utc>,
    /// Grid cell, once assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_id: Option<CellId>,
}

impl Point {
    pub fn new(
        longitude: f64,
        latitude: f64,
        value: Option<f64>,
        quality: f32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            longitude,
            latitude,
            value,
            quality,
            timestamp,
            cell_id: None,
        }
    }

    /// Attach a cell identifier.
    pub fn with_cell(mut self, cell_id: CellId) -> Self {
        self.cell_id = Some(cell_id);
        self
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "longitude={} latitude={} value={} timestamp={} quality={}",
            self.longitude,
            self.latitude,
            self.value.map_or_else(|| "NaN".to_string(), |v| v.to_string()),
            self.timestamp.to_rfc3339(),
            self.quality
        )?;
        if let Some(cell) = self.cell_id {
            write!(f, " cell_id={cell}")?;
        }
        Ok(())
    }
}

/// Columnar collection of ground-pixels.
///
/// All columns have the same length. The `cell_id` column only exists after
/// cell assignment; it is either present for every row or for none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointTable {
    longitude: Vec<f64>,
    latitude: Vec<f64>,
    value: Vec<Option<f64>>,
    quality: Vec<f32>,
    timestamp: Vec<DateTime<Utc>>,
    cell_id: Option<Vec<CellId>>,
}

impl PointTable {
    /// Build a table from aligned columns.
    ///
    /// `NaN` values are stored as missing.
    pub fn new(
        longitude: Vec<f64>,
        latitude: Vec<f64>,
        value: Vec<Option<f64>>,
        quality: Vec<f32>,
        timestamp: Vec<DateTime<Utc>>,
    ) -> Result<Self> {
        let expected = longitude.len();
        check_len("latitude", expected, latitude.len())?;
        check_len("value", expected, value.len())?;
        check_len("quality", expected, quality.len())?;
        check_len("timestamp", expected, timestamp.len())?;

        Ok(Self {
            longitude,
            latitude,
            value: value.into_iter().map(defined_value).collect(),
            quality,
            timestamp,
            cell_id: None,
        })
    }

    /// Attach a full `cell_id` column, replacing any existing one.
    pub fn with_cell_ids(mut self, cell_ids: Vec<CellId>) -> Result<Self> {
        check_len("cell_id", self.len(), cell_ids.len())?;
        self.cell_id = Some(cell_ids);
        Ok(self)
    }

    /// Drop the `cell_id` column.
    pub fn without_cell_ids(mut self) -> Self {
        self.cell_id = None;
        self
    }

    pub fn len(&self) -> usize {
        self.longitude.len()
    }

    pub fn is_empty(&self) -> bool {
        self.longitude.is_empty()
    }

    pub fn longitude(&self) -> &[f64] {
        &self.longitude
    }

    pub fn latitude(&self) -> &[f64] {
        &self.latitude
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.value
    }

    pub fn quality(&self) -> &[f32] {
        &self.quality
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamp
    }

    /// The `cell_id` column, if the table has been assigned.
    pub fn cell_ids(&self) -> Option<&[CellId]> {
        self.cell_id.as_deref()
    }

    pub fn has_cell_ids(&self) -> bool {
        self.cell_id.is_some()
    }

    /// Row `index`, if in bounds.
    pub fn get(&self, index: usize) -> Option<Point> {
        (index < self.len()).then(|| self.row(index))
    }

    /// Iterate rows in table order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Point> + '_ {
        (0..self.len()).map(move |i| self.row(i))
    }

    fn row(&self, index: usize) -> Point {
        Point {
            longitude: self.longitude[index],
            latitude: self.latitude[index],
            value: self.value[index],
            quality: self.quality[index],
            timestamp: self.timestamp[index],
            cell_id: self.cell_id.as_ref().map(|ids| ids[index]),
        }
    }

    /// New table holding the rows at `indices`, in that order.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds.
    pub fn take(&self, indices: &[usize]) -> Self {
        Self {
            longitude: indices.iter().map(|&i| self.longitude[i]).collect(),
            latitude: indices.iter().map(|&i| self.latitude[i]).collect(),
            value: indices.iter().map(|&i| self.value[i]).collect(),
            quality: indices.iter().map(|&i| self.quality[i]).collect(),
            timestamp: indices.iter().map(|&i| self.timestamp[i]).collect(),
            cell_id: self
                .cell_id
                .as_ref()
                .map(|ids| indices.iter().map(|&i| ids[i]).collect()),
        }
    }

    /// Append one row.
    ///
    /// The `cell_id` column survives only while every row has one.
    pub fn push(&mut self, point: Point) {
        self.cell_id = match (self.cell_id.take(), point.cell_id) {
            (Some(mut ids), Some(cell)) => {
                ids.push(cell);
                Some(ids)
            }
            (None, Some(cell)) if self.is_empty() => Some(vec![cell]),
            _ => None,
        };
        self.longitude.push(point.longitude);
        self.latitude.push(point.latitude);
        self.value.push(defined_value(point.value));
        self.quality.push(point.quality);
        self.timestamp.push(point.timestamp);
    }

    /// Append all rows of `other`, e.g. to merge several scans.
    ///
    /// Merging an assigned with an unassigned table drops the `cell_id` column.
    pub fn append(&mut self, other: PointTable) {
        let self_empty = self.is_empty();
        let other_empty = other.is_empty();
        self.cell_id = match (self.cell_id.take(), other.cell_id) {
            (Some(mut ids), Some(more)) => {
                ids.extend(more);
                Some(ids)
            }
            (None, Some(more)) if self_empty => Some(more),
            (Some(ids), None) if other_empty => Some(ids),
            _ => None,
        };
        self.longitude.extend(other.longitude);
        self.latitude.extend(other.latitude);
        self.value.extend(other.value);
        self.quality.extend(other.quality);
        self.timestamp.extend(other.timestamp);
    }

    /// Consuming form of [`append`](Self::append).
    pub fn concat(mut self, other: PointTable) -> Self {
        self.append(other);
        self
    }

    /// Replace the coordinate columns. Lengths are checked by the caller.
    pub(crate) fn set_coordinates(&mut self, latitude: Vec<f64>, longitude: Vec<f64>) {
        debug_assert_eq!(latitude.len(), self.len());
        debug_assert_eq!(longitude.len(), self.len());
        self.latitude = latitude;
        self.longitude = longitude;
    }
}

impl FromIterator<Point> for PointTable {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        let mut table = PointTable::default();
        table.extend(iter);
        table
    }
}

impl Extend<Point> for PointTable {
    fn extend<I: IntoIterator<Item = Point>>(&mut self, iter: I) {
        for point in iter {
            self.push(point);
        }
    }
}

/// Summary of all points that fell into one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellGroup {
    pub cell_id: CellId,
    /// Earliest member acquisition time.
    pub timestamp: DateTime<Utc>,
    /// Lowest member quality.
    pub quality: f32,
    /// Reduced member value.
    pub value: f64,
    /// Number of member points.
    pub count: usize,
    /// Representative coordinate, once projected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Aggregator output: one row per distinct cell.
///
/// Row order is unspecified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellGroupTable {
    cell_id: Vec<CellId>,
    timestamp: Vec<DateTime<Utc>>,
    quality: Vec<f32>,
    value: Vec<f64>,
    count: Vec<usize>,
    latitude: Option<Vec<f64>>,
    longitude: Option<Vec<f64>>,
}

impl CellGroupTable {
    pub fn len(&self) -> usize {
        self.cell_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_id.is_empty()
    }

    pub fn cell_ids(&self) -> &[CellId] {
        &self.cell_id
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamp
    }

    pub fn quality(&self) -> &[f32] {
        &self.quality
    }

    pub fn values(&self) -> &[f64] {
        &self.value
    }

    pub fn counts(&self) -> &[usize] {
        &self.count
    }

    /// The latitude column, once projected.
    pub fn latitude(&self) -> Option<&[f64]> {
        self.latitude.as_deref()
    }

    /// The longitude column, once projected.
    pub fn longitude(&self) -> Option<&[f64]> {
        self.longitude.as_deref()
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    pub fn get(&self, index: usize) -> Option<CellGroup> {
        (index < self.len()).then(|| self.row(index))
    }

    fn row(&self, index: usize) -> CellGroup {
        CellGroup {
            cell_id: self.cell_id[index],
            timestamp: self.timestamp[index],
            quality: self.quality[index],
            value: self.value[index],
            count: self.count[index],
            latitude: self.latitude.as_ref().map(|c| c[index]),
            longitude: self.longitude.as_ref().map(|c| c[index]),
        }
    }

    /// The group for `cell_id`, if present. Linear scan.
    pub fn find(&self, cell_id: CellId) -> Option<CellGroup> {
        self.cell_id
            .iter()
            .position(|&c| c == cell_id)
            .and_then(|i| self.get(i))
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = CellGroup> + '_ {
        (0..self.len()).map(move |i| self.row(i))
    }

    /// Rows sorted by cell identifier, for reproducible output.
    pub fn sorted_by_cell(&self) -> Vec<CellGroup> {
        let mut rows: Vec<CellGroup> = self.iter().collect();
        rows.sort_by_key(|g| g.cell_id);
        rows
    }

    pub(crate) fn set_coordinates(&mut self, latitude: Vec<f64>, longitude: Vec<f64>) {
        debug_assert_eq!(latitude.len(), self.len());
        debug_assert_eq!(longitude.len(), self.len());
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
    }
}

impl FromIterator<CellGroup> for CellGroupTable {
    /// Coordinate columns are kept only if every row carries both coordinates.
    fn from_iter<I: IntoIterator<Item = CellGroup>>(iter: I) -> Self {
        let rows: Vec<CellGroup> = iter.into_iter().collect();
        let projected = !rows.is_empty()
            && rows
                .iter()
                .all(|g| g.latitude.is_some() && g.longitude.is_some());

        CellGroupTable {
            cell_id: rows.iter().map(|g| g.cell_id).collect(),
            timestamp: rows.iter().map(|g| g.timestamp).collect(),
            quality: rows.iter().map(|g| g.quality).collect(),
            value: rows.iter().map(|g| g.value).collect(),
            count: rows.iter().map(|g| g.count).collect(),
            latitude: projected.then(|| rows.iter().filter_map(|g| g.latitude).collect()),
            longitude: projected.then(|| rows.iter().filter_map(|g| g.longitude).collect()),
        }
    }
}

fn check_len(column: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(BinningError::ColumnLengthMismatch {
            column,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_562_025_600 + secs, 0).unwrap()
    }

    fn table() -> PointTable {
        PointTable::new(
            vec![1.0, 2.0, 3.0],
            vec![10.0, 20.0, 30.0],
            vec![Some(0.5), None, Some(f64::NAN)],
            vec![0.9, 0.1, 0.5],
            vec![t(0), t(1), t(2)],
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_misaligned_columns() {
        let err = PointTable::new(
            vec![1.0, 2.0],
            vec![10.0],
            vec![None, None],
            vec![0.5, 0.5],
            vec![t(0), t(0)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            BinningError::ColumnLengthMismatch {
                column: "latitude",
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_nan_is_stored_as_missing() {
        let table = table();
        assert_eq!(table.values(), &[Some(0.5), None, None]);
    }

    #[test]
    fn test_get_and_iter() {
        let table = table();
        let row = table.get(0).unwrap();
        assert_eq!(row.longitude, 1.0);
        assert_eq!(row.latitude, 10.0);
        assert_eq!(row.cell_id, None);
        assert!(table.get(3).is_none());
        assert_eq!(table.iter().len(), 3);
    }

    #[test]
    fn test_take_preserves_requested_order() {
        let table = table()
            .with_cell_ids(vec![CellId::new(1), CellId::new(2), CellId::new(3)])
            .unwrap();
        let taken = table.take(&[2, 0]);
        assert_eq!(taken.longitude(), &[3.0, 1.0]);
        assert_eq!(taken.cell_ids().unwrap(), &[CellId::new(3), CellId::new(1)]);
    }

    #[test]
    fn test_with_cell_ids_checks_length() {
        assert!(table().with_cell_ids(vec![CellId::new(1)]).is_err());
    }

    #[test]
    fn test_append_merges_scans() {
        let mut merged = table();
        merged.append(table());
        assert_eq!(merged.len(), 6);
        assert!(!merged.has_cell_ids());
    }

    #[test]
    fn test_append_drops_partial_cell_column() {
        let ids = vec![CellId::new(1), CellId::new(2), CellId::new(3)];
        let assigned = table().with_cell_ids(ids.clone()).unwrap();

        let both = assigned.clone().concat(assigned.clone());
        assert_eq!(both.cell_ids().unwrap().len(), 6);

        let mixed = assigned.clone().concat(table());
        assert!(!mixed.has_cell_ids());

        let from_empty = PointTable::default().concat(assigned.clone());
        assert_eq!(from_empty.cell_ids().unwrap(), ids.as_slice());

        let with_empty = assigned.concat(PointTable::default());
        assert_eq!(with_empty.cell_ids().unwrap(), ids.as_slice());
    }

    #[test]
    fn test_collect_points() {
        let cell = CellId::new(42);
        let table: PointTable = (0..4)
            .map(|i| Point::new(i as f64, 0.0, Some(1.0), 0.5, t(i)).with_cell(cell))
            .collect();
        assert_eq!(table.len(), 4);
        assert_eq!(table.cell_ids().unwrap(), &[cell; 4]);

        let mut partial = table.clone();
        partial.push(Point::new(9.0, 0.0, Some(1.0), 0.5, t(9)));
        assert!(!partial.has_cell_ids());
        assert_eq!(partial.len(), 5);
    }

    #[test]
    fn test_point_display() {
        let point = Point::new(1.5, -2.0, None, 0.75, t(0));
        let text = point.to_string();
        assert!(text.starts_with("longitude=1.5 latitude=-2 value=NaN"));
        assert!(text.ends_with("quality=0.75"));

        let text = point.with_cell(CellId::new(255)).to_string();
        assert!(text.ends_with("cell_id=ff"));
    }

    fn group(cell: u64, lat: Option<f64>) -> CellGroup {
        CellGroup {
            cell_id: CellId::new(cell),
            timestamp: t(0),
            quality: 0.5,
            value: 1.0,
            count: 1,
            latitude: lat,
            longitude: lat,
        }
    }

    #[test]
    fn test_group_table_from_rows() {
        let groups: CellGroupTable = vec![group(3, None), group(1, None)].into_iter().collect();
        assert_eq!(groups.len(), 2);
        assert!(!groups.has_coordinates());
        assert_eq!(groups.find(CellId::new(1)).unwrap().cell_id, CellId::new(1));
        assert!(groups.find(CellId::new(7)).is_none());

        let sorted = groups.sorted_by_cell();
        assert_eq!(sorted[0].cell_id, CellId::new(1));
        assert_eq!(sorted[1].cell_id, CellId::new(3));
    }

    #[test]
    fn test_group_table_keeps_complete_coordinates_only() {
        let full: CellGroupTable = vec![group(1, Some(1.0)), group(2, Some(2.0))]
            .into_iter()
            .collect();
        assert_eq!(full.latitude().unwrap(), &[1.0, 2.0]);

        let partial: CellGroupTable = vec![group(1, Some(1.0)), group(2, None)]
            .into_iter()
            .collect();
        assert!(!partial.has_coordinates());
    }

    #[test]
    fn test_cell_group_serializes_without_missing_coordinates() {
        let json = serde_json::to_value(group(255, None)).unwrap();
        assert_eq!(json["cell_id"], "ff");
        assert!(json.get("latitude").is_none());

        let json = serde_json::to_value(group(255, Some(4.0))).unwrap();
        assert_eq!(json["latitude"], 4.0);
    }
}
