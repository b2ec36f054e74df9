//! Scan readers for satellite swath products.
//!
//! A reader turns one product file into a [`Scan`]: a flat
//! [`PointTable`] with one row per ground-pixel and absolute timestamps.
//!
//! Supported inputs:
//!
//! | extension | reader               | notes                               |
//! |-----------|----------------------|-------------------------------------|
//! | `.json`   | [`JsonScanReader`]   | a serialized [`RawScan`]            |
//! | `.nc`     | `NetCdfScanReader`   | Sentinel-5P L2, feature `netcdf`    |
//!
//! # Example
//!
//! ```ignore
//! use scan_reader::reader_for_path;
//! use std::path::Path;
//!
//! let path = Path::new("S5P_OFFL_L2__CO_____20190702.nc");
//! let scan = reader_for_path(path)?.read(path)?;
//! println!("{} points from {}", scan.len(), scan.time_reference);
//! ```

pub mod error;
pub mod json;
#[cfg(feature = "netcdf")]
pub mod native;
pub mod raw;
pub mod time;

use std::path::Path;

use binning::PointTable;
use chrono::{DateTime, Utc};

pub use error::{Result, ScanError};
pub use json::JsonScanReader;
#[cfg(feature = "netcdf")]
pub use native::{silence_hdf5_errors, NetCdfScanReader};
pub use raw::RawScan;
pub use time::parse_time_reference;

/// One decoded satellite scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    /// Start of the acquisition.
    pub time_reference: DateTime<Utc>,
    /// One row per ground-pixel, values already masked.
    pub points: PointTable,
}

impl Scan {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_points(self) -> PointTable {
        self.points
    }
}

/// Decodes a product file into a [`Scan`].
pub trait ScanReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<Scan>;
}

/// Pick a reader by file extension.
pub fn reader_for_path(path: &Path) -> Result<Box<dyn ScanReader>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "json" => Ok(Box::new(JsonScanReader::new())),
        #[cfg(feature = "netcdf")]
        "nc" | "nc4" => Ok(Box::new(NetCdfScanReader::default())),
        #[cfg(not(feature = "netcdf"))]
        "nc" | "nc4" => Err(ScanError::UnsupportedFormat(format!(
            "{}: NetCDF support requires the 'netcdf' feature",
            path.display()
        ))),
        _ => Err(ScanError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Whether [`reader_for_path`] has a reader for this file.
pub fn is_supported(path: &Path) -> bool {
    reader_for_path(path).is_ok()
}
