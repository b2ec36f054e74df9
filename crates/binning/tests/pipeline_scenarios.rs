//! End-to-end pipeline scenarios on synthetic swaths.

use std::ops::RangeInclusive;

use binning::{
    aggregate, aggregate_by_name, assign_cells, filter_by_quality, project, Binner,
    BinningConfig, BinningError, CellId, GeoIndex, PointTable, Reduction, Stage,
};
use chrono::Utc;
use geo_index::{GeoIndexError, H3Index};
use test_utils::{
    synthetic_swath, SwathLayout, ANTIMERIDIAN_SWATH, REFERENCE_POINTS_ABOVE_HALF,
    REFERENCE_POINT_COUNT, REFERENCE_SWATH,
};

fn swath_table(layout: &SwathLayout) -> PointTable {
    let swath = synthetic_swath(layout);
    PointTable::new(
        swath.longitude,
        swath.latitude,
        swath.value,
        swath.quality,
        swath.timestamp,
    )
    .unwrap()
}

/// Two-cell grid split at the prime meridian: west is "A", east is "B".
struct MockIndex;

const CELL_A: CellId = CellId::new(0xA);
const CELL_B: CellId = CellId::new(0xB);

impl GeoIndex for MockIndex {
    fn to_cell(&self, lat: f64, lon: f64, _resolution: u8) -> geo_index::Result<CellId> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(GeoIndexError::invalid_coordinate(lat, lon));
        }
        Ok(if lon < 0.0 { CELL_A } else { CELL_B })
    }

    fn to_point(&self, cell: CellId) -> geo_index::Result<(f64, f64)> {
        match cell {
            CELL_A => Ok((0.0, -90.0)),
            CELL_B => Ok((0.0, 90.0)),
            other => Err(GeoIndexError::InvalidCell(other.get())),
        }
    }

    fn resolution_range(&self) -> RangeInclusive<u8> {
        0..=0
    }

    fn resolution_of(&self, _cell: CellId) -> geo_index::Result<u8> {
        Ok(0)
    }
}

/// Rows as (lon, value).
fn mock_points(rows: &[(f64, f64)]) -> PointTable {
    let n = rows.len();
    PointTable::new(
        rows.iter().map(|r| r.0).collect(),
        vec![0.0; n],
        rows.iter().map(|r| Some(r.1)).collect(),
        vec![1.0; n],
        vec![Utc::now(); n],
    )
    .unwrap()
}

#[test]
fn test_reference_swath_end_to_end() {
    let points = swath_table(&REFERENCE_SWATH);
    assert_eq!(points.len(), REFERENCE_POINT_COUNT);

    let good = filter_by_quality(&points, 0.5);
    assert_eq!(good.len(), REFERENCE_POINTS_ABOVE_HALF);
    assert!(filter_by_quality(&points, 1.0).is_empty());

    let index = H3Index::new();
    let assigned = assign_cells(&good, 1, &index).unwrap();
    assert_eq!(assigned.len(), good.len());

    let groups = aggregate(&assigned, Reduction::Mean).unwrap();
    assert!(!groups.is_empty());
    assert!(groups.len() < assigned.len());
    assert_eq!(groups.counts().iter().sum::<usize>(), assigned.len());

    let projected = project(&groups, &index).unwrap();
    assert_eq!(projected.len(), groups.len());
    assert!(projected.has_coordinates());
}

#[test]
fn test_reference_swath_unfiltered_means() {
    let points = swath_table(&REFERENCE_SWATH);
    let everything = filter_by_quality(&points, 0.0);
    assert_eq!(everything.len(), REFERENCE_POINT_COUNT);

    // Every reference value is defined
    let assigned = assign_cells(&everything, 1, &H3Index::new()).unwrap();
    assert_eq!(assigned.len(), REFERENCE_POINT_COUNT);

    let groups = aggregate(&assigned, Reduction::Mean).unwrap();
    assert!(groups.len() < REFERENCE_POINT_COUNT);
    assert_eq!(groups.counts().iter().sum::<usize>(), REFERENCE_POINT_COUNT);
}

#[test]
fn test_binner_matches_manual_stages() {
    let points = swath_table(&ANTIMERIDIAN_SWATH);
    let index = H3Index::new();

    let mut config = BinningConfig::new(Reduction::Median);
    config.resolution = 4;
    let report = Binner::new(index, config).unwrap().run(&points).unwrap();

    let manual = project(
        &aggregate(
            &assign_cells(&filter_by_quality(&points, 0.5), 4, &index).unwrap(),
            Reduction::Median,
        )
        .unwrap(),
        &index,
    )
    .unwrap();

    assert_eq!(report.stage, Stage::Projected);
    assert_eq!(report.groups.sorted_by_cell(), manual.sorted_by_cell());
    assert!(report.assigned_points < report.filtered_points);
}

#[test]
fn test_filter_is_monotonic() {
    let points = swath_table(&ANTIMERIDIAN_SWATH);
    let thresholds = [0.0, 0.1, 0.25, 0.5, 0.5, 0.73, 0.99, 1.0];
    for pair in thresholds.windows(2) {
        let loose = filter_by_quality(&points, pair[0]);
        let strict = filter_by_quality(&points, pair[1]);
        assert!(strict.len() <= loose.len());
        for point in strict.iter() {
            assert!(loose.iter().any(|p| p == point));
        }
    }
}

#[test]
fn test_filter_extremes() {
    let points = swath_table(&REFERENCE_SWATH);
    assert_eq!(filter_by_quality(&points, 0.0), points);
    assert!(filter_by_quality(&points, 1.0 + f32::EPSILON).is_empty());
}

#[test]
fn test_assign_drops_exactly_missing_values() {
    let points = swath_table(&ANTIMERIDIAN_SWATH);
    let defined = points.values().iter().filter(|v| v.is_some()).count();
    let index = H3Index::new();

    let assigned = assign_cells(&points, 6, &index).unwrap();
    assert!(assigned.len() <= points.len());
    assert_eq!(assigned.len(), defined);
    assert!(assigned.values().iter().all(Option::is_some));

    for point in assigned.iter() {
        assert_eq!(
            point.cell_id,
            Some(index.to_cell(point.latitude, point.longitude, 6).unwrap())
        );
    }

    let again = assign_cells(&assigned, 6, &index).unwrap();
    assert_eq!(again, assigned);
}

#[test]
fn test_mean_and_median_bounds() {
    let points = swath_table(&ANTIMERIDIAN_SWATH);
    let index = H3Index::new();
    let assigned = assign_cells(&points, 5, &index).unwrap();

    let means = aggregate(&assigned, Reduction::Mean).unwrap();
    let medians = aggregate(&assigned, Reduction::Median).unwrap();

    for group in means.iter() {
        let members: Vec<f64> = assigned
            .iter()
            .filter(|p| p.cell_id == Some(group.cell_id))
            .filter_map(|p| p.value)
            .collect();
        assert_eq!(members.len(), group.count);

        let min = members.iter().copied().fold(f64::INFINITY, f64::min);
        let max = members.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(group.value >= min && group.value <= max);

        let median = medians.find(group.cell_id).unwrap();
        if members.len() % 2 == 1 {
            assert!(members.contains(&median.value));
        }
    }
}

#[test]
fn test_unknown_reduction_always_fails() {
    let points = assign_cells(&swath_table(&REFERENCE_SWATH), 3, &H3Index::new()).unwrap();
    for name in ["max", "Mode", "", "mean ", "avg"] {
        let result = aggregate_by_name(&points, name);
        if name.trim().eq_ignore_ascii_case("mean") {
            assert!(result.is_ok());
        } else {
            assert_eq!(
                result.unwrap_err(),
                BinningError::UnsupportedReduction(name.to_string())
            );
        }
    }
}

#[test]
fn test_projection_stays_in_cell() {
    let index = H3Index::new();
    let points = swath_table(&ANTIMERIDIAN_SWATH);
    for resolution in [0, 3, 7, 10] {
        let groups = aggregate(
            &assign_cells(&points, resolution, &index).unwrap(),
            Reduction::Mean,
        )
        .unwrap();
        let projected = project(&groups, &index).unwrap();

        for group in projected.iter() {
            let level = index.resolution_of(group.cell_id).unwrap();
            assert_eq!(level, resolution);
            let lat = group.latitude.unwrap();
            let lon = group.longitude.unwrap();
            assert_eq!(index.to_cell(lat, lon, level).unwrap(), group.cell_id);
        }
    }
}

#[test]
fn test_grouping_with_mock_index() {
    // A: [10, 20], B: [5, 15]; row order must not matter
    let orders: [&[(f64, f64)]; 2] = [
        &[(-1.0, 10.0), (1.0, 5.0), (-2.0, 20.0), (2.0, 15.0)],
        &[(2.0, 15.0), (-2.0, 20.0), (1.0, 5.0), (-1.0, 10.0)],
    ];

    for rows in orders {
        let assigned = assign_cells(&mock_points(rows), 0, &MockIndex).unwrap();
        let groups = aggregate(&assigned, Reduction::Mean).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.find(CELL_A).unwrap().value, 15.0);
        assert_eq!(groups.find(CELL_B).unwrap().value, 10.0);

        let medians = aggregate(&assigned, Reduction::Median).unwrap();
        assert_eq!(medians.find(CELL_A).unwrap().value, 15.0);
        assert_eq!(medians.find(CELL_B).unwrap().value, 10.0);
    }
}

#[test]
fn test_mock_index_resolution_bounds() {
    let err = assign_cells(&mock_points(&[(1.0, 1.0)]), 1, &MockIndex).unwrap_err();
    assert_eq!(
        err,
        BinningError::InvalidResolution {
            resolution: 1,
            min: 0,
            max: 0
        }
    );
}

#[test]
fn test_merged_scans_bin_together() {
    let first = mock_points(&[(-1.0, 10.0), (1.0, 5.0)]);
    let second = mock_points(&[(-2.0, 20.0), (2.0, 15.0)]);
    let merged = first.concat(second);

    let mut config = BinningConfig::new(Reduction::Mean);
    config.resolution = 0;
    let report = Binner::new(MockIndex, config).unwrap().run(&merged).unwrap();

    assert_eq!(report.input_points, 4);
    let a = report.groups.find(CELL_A).unwrap();
    assert_eq!(a.count, 2);
    assert_eq!(a.value, 15.0);
    assert_eq!((a.latitude, a.longitude), (Some(0.0), Some(-90.0)));
}
