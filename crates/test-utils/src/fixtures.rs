//! Common test fixtures for swath-binning tests.
//!
//! This module provides pre-defined swath layouts and reference values that
//! represent common scenarios when binning Sentinel-5P ground-pixels.

use crate::generators::SwathLayout;

/// A fixed time reference for tests (2019-07-02T00:00:00Z).
pub const REFERENCE_TIME: &str = "2019-07-02T00:00:00Z";

/// Size of the reference swath used by the end-to-end scenario.
pub const REFERENCE_POINT_COUNT: usize = 226;

/// Points in [`REFERENCE_SWATH`] with `quality >= 0.5`.
pub const REFERENCE_POINTS_ABOVE_HALF: usize = 180;

/// Small swath patch over the Alps: 2 scanlines x 113 ground-pixels.
///
/// Qualities span `[0.0, 0.99]`, every value is defined.
pub const REFERENCE_SWATH: SwathLayout = SwathLayout {
    scanlines: 2,
    ground_pixels: 113,
    origin_lat: 46.0,
    origin_lon: 6.0,
    pixel_spacing_deg: 0.05,
    scanline_spacing_deg: 0.06,
    scanline_interval_ms: 840,
    missing_every: 0,
};

/// A wider patch crossing the antimeridian, with every 7th value missing.
pub const ANTIMERIDIAN_SWATH: SwathLayout = SwathLayout {
    scanlines: 12,
    ground_pixels: 40,
    origin_lat: -20.0,
    origin_lon: 178.5,
    pixel_spacing_deg: 0.07,
    scanline_spacing_deg: 0.06,
    scanline_interval_ms: 840,
    missing_every: 7,
};

/// Product variable names found in Sentinel-5P L2 files.
pub mod products {
    pub const CARBON_MONOXIDE: &str = "carbonmonoxide_total_column";
    pub const METHANE: &str = "methane_mixing_ratio";
}

/// Common coordinates for testing, as `(lat, lon)`.
pub mod coords {
    pub const NULL_ISLAND: (f64, f64) = (0.0, 0.0);
    pub const BERLIN: (f64, f64) = (52.52, 13.405);
    pub const SYDNEY: (f64, f64) = (-33.8688, 151.2093);
    pub const NEAR_NORTH_POLE: (f64, f64) = (89.9, 45.0);
    pub const ANTIMERIDIAN_EAST: (f64, f64) = (10.0, 179.999);
    pub const ANTIMERIDIAN_WEST: (f64, f64) = (10.0, -179.999);
}
