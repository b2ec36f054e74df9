//! The binning pipeline as one configured object.

use std::fmt;

use geo_index::GeoIndex;
use serde::Serialize;
use tracing::{info, instrument};

use crate::aggregate::{aggregate, aggregate_par};
use crate::assign::{assign_cells, assign_cells_par, check_resolution};
use crate::config::BinningConfig;
use crate::error::Result;
use crate::filter::filter_by_quality;
use crate::project::project;
use crate::table::{CellGroupTable, PointTable};

/// Pipeline stages, in the only order they may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    RawLoaded,
    Filtered,
    Assigned,
    Aggregated,
    Projected,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RawLoaded => "raw_loaded",
            Self::Filtered => "filtered",
            Self::Assigned => "assigned",
            Self::Aggregated => "aggregated",
            Self::Projected => "projected",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`Binner::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct BinningReport {
    /// Rows handed to the pipeline.
    pub input_points: usize,
    /// Rows that passed the quality filter.
    pub filtered_points: usize,
    /// Rows that received a cell.
    pub assigned_points: usize,
    /// Last stage that ran: `Aggregated` or `Projected`.
    pub stage: Stage,
    pub groups: CellGroupTable,
}

/// Filter, assign, aggregate and optionally project, with one provider and
/// one configuration.
///
/// ```
/// use binning::{Binner, BinningConfig, PointTable, Reduction};
/// use geo_index::H3Index;
///
/// let binner = Binner::new(H3Index::new(), BinningConfig::new(Reduction::Mean)).unwrap();
/// let report = binner.run(&PointTable::default()).unwrap();
/// assert!(report.groups.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Binner<G> {
    index: G,
    config: BinningConfig,
}

impl<G: GeoIndex> Binner<G> {
    /// Create a binner, rejecting configurations that could never run.
    pub fn new(index: G, config: BinningConfig) -> Result<Self> {
        config.validate()?;
        check_resolution(&index, config.resolution)?;
        Ok(Self { index, config })
    }

    pub fn config(&self) -> &BinningConfig {
        &self.config
    }

    pub fn index(&self) -> &G {
        &self.index
    }

    pub fn filter(&self, points: &PointTable) -> PointTable {
        filter_by_quality(points, self.config.minimal_quality)
    }

    pub fn assign(&self, points: &PointTable) -> Result<PointTable> {
        if self.config.parallel {
            assign_cells_par(points, self.config.resolution, &self.index)
        } else {
            assign_cells(points, self.config.resolution, &self.index)
        }
    }

    pub fn aggregate(&self, points: &PointTable) -> Result<CellGroupTable> {
        if self.config.parallel {
            aggregate_par(points, self.config.reduction)
        } else {
            aggregate(points, self.config.reduction)
        }
    }

    pub fn project(&self, groups: &CellGroupTable) -> Result<CellGroupTable> {
        project(groups, &self.index)
    }

    /// Run every stage in order. Projection is skipped when
    /// [`BinningConfig::project`] is off.
    #[instrument(
        skip_all,
        fields(
            points = points.len(),
            resolution = self.config.resolution,
            reduction = %self.config.reduction,
        )
    )]
    pub fn run(&self, points: &PointTable) -> Result<BinningReport> {
        let filtered = self.filter(points);
        let assigned = self.assign(&filtered)?;
        let mut groups = self.aggregate(&assigned)?;
        let mut stage = Stage::Aggregated;

        if self.config.project {
            groups = self.project(&groups)?;
            stage = Stage::Projected;
        }

        info!(
            input = points.len(),
            filtered = filtered.len(),
            assigned = assigned.len(),
            groups = groups.len(),
            %stage,
            "Binning complete"
        );

        Ok(BinningReport {
            input_points: points.len(),
            filtered_points: filtered.len(),
            assigned_points: assigned.len(),
            stage,
            groups,
        })
    }
}
