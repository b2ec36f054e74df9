//! Spatial binning of satellite ground-pixels onto a discrete global grid.
//!
//! Irregularly spaced swath measurements are reduced to one summary row per
//! grid cell so that overlapping scans can be compared and merged:
//!
//! - **Filter**: drop low-confidence rows (`quality < threshold`)
//! - **Assign**: give each row with a value its cell at a fixed resolution
//! - **Aggregate**: collapse each cell's rows into one [`CellGroup`]
//! - **Project**: attach a representative coordinate to every cell
//!
//! # Architecture
//!
//! ```text
//! PointTable (one or more scans)
//!      │
//!      ▼
//! filter_by_quality(points, q)
//!      │
//!      ▼
//! assign_cells(points, resolution, index)   ◄── GeoIndex provider
//!      │
//!      ▼
//! aggregate(points, Reduction)
//!      │
//!      ▼
//! project(groups, index)                    ◄── GeoIndex provider
//!      │
//!      ▼
//! CellGroupTable
//! ```
//!
//! Every stage borrows its input and returns a new table. Stages may be
//! called one by one or through [`Binner`], which runs them in order from a
//! [`BinningConfig`].
//!
//! # Example
//!
//! ```
//! use binning::{aggregate, assign_cells, filter_by_quality, PointTable, Reduction};
//! use chrono::Utc;
//! use geo_index::H3Index;
//!
//! let points = PointTable::new(
//!     vec![6.10, 6.11],
//!     vec![46.20, 46.20],
//!     vec![Some(0.031), Some(0.035)],
//!     vec![0.9, 0.3],
//!     vec![Utc::now(); 2],
//! )?;
//!
//! let good = filter_by_quality(&points, 0.5);
//! let assigned = assign_cells(&good, 5, &H3Index::new())?;
//! let groups = aggregate(&assigned, Reduction::Mean)?;
//! assert_eq!(groups.len(), 1);
//! # Ok::<(), binning::BinningError>(())
//! ```

pub mod aggregate;
pub mod assign;
pub mod config;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod project;
pub mod table;

// Re-export commonly used types at crate root
pub use aggregate::{aggregate, aggregate_by_name, aggregate_par, Reduction};
pub use assign::{assign_cells, assign_cells_par};
pub use config::{BinningConfig, DEFAULT_RESOLUTION};
pub use error::{BinningError, Result};
pub use filter::{filter_by_quality, DEFAULT_MINIMAL_QUALITY};
pub use pipeline::{Binner, BinningReport, Stage};
pub use project::{project, CellKeyed};
pub use table::{defined_value, CellGroup, CellGroupTable, Point, PointTable};

pub use geo_index::{CellId, GeoIndex};
