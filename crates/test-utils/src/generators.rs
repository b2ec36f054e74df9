//! Synthetic swath generators.
//!
//! These generators create predictable, verifiable ground-pixel layouts
//! that mimic a Sentinel-5P L2 product: a regular scanline x ground-pixel
//! raster with per-scanline acquisition offsets, a quality value per pixel
//! and the occasional missing measurement.

use chrono::{DateTime, Duration, Utc};

use crate::fixtures::REFERENCE_TIME;

/// Layout of a synthetic swath.
#[derive(Debug, Clone, Copy)]
pub struct SwathLayout {
    /// Number of along-track scanlines.
    pub scanlines: usize,
    /// Number of across-track ground-pixels per scanline.
    pub ground_pixels: usize,
    /// Latitude of the first pixel (degrees).
    pub origin_lat: f64,
    /// Longitude of the first pixel (degrees).
    pub origin_lon: f64,
    /// Across-track spacing in degrees of longitude.
    pub pixel_spacing_deg: f64,
    /// Along-track spacing in degrees of latitude.
    pub scanline_spacing_deg: f64,
    /// Acquisition time between consecutive scanlines (ms).
    pub scanline_interval_ms: i64,
    /// Every n-th pixel has no value; 0 disables.
    pub missing_every: usize,
}

impl SwathLayout {
    /// Total number of ground-pixels.
    pub fn len(&self) -> usize {
        self.scanlines * self.ground_pixels
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Flattened (row-major, scanline first) swath columns.
#[derive(Debug, Clone)]
pub struct SyntheticSwath {
    pub scanlines: usize,
    pub ground_pixels: usize,
    pub longitude: Vec<f64>,
    pub latitude: Vec<f64>,
    pub value: Vec<Option<f64>>,
    pub quality: Vec<f32>,
    pub timestamp: Vec<DateTime<Utc>>,
    pub time_reference: DateTime<Utc>,
    /// Acquisition offset of each scanline relative to `time_reference` (ms).
    pub delta_time_ms: Vec<i64>,
}

impl SyntheticSwath {
    pub fn len(&self) -> usize {
        self.longitude.len()
    }

    pub fn is_empty(&self) -> bool {
        self.longitude.is_empty()
    }

    /// Values with missing entries replaced by `fill`, as a product file stores them.
    pub fn values_with_fill(&self, fill: f32) -> Vec<f32> {
        self.value
            .iter()
            .map(|v| v.map(|v| v as f32).unwrap_or(fill))
            .collect()
    }

    /// Number of pixels carrying a value.
    pub fn defined_count(&self) -> usize {
        self.value.iter().filter(|v| v.is_some()).count()
    }
}

/// The fixed time reference used by all synthetic swaths.
pub fn reference_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(REFERENCE_TIME)
        .expect("REFERENCE_TIME is valid RFC 3339")
        .with_timezone(&Utc)
}

/// Generate a swath following `layout`.
///
/// Qualities are deterministic: one fifth of the pixels (rounded up) get a
/// quality in `[0.00, 0.49]`, the rest in `[0.50, 0.99]`, scattered over the
/// swath by a fixed permutation. Pixel 0 always has quality `0.0`.
///
/// Values look like CO total columns (mol/m²): `0.030 + 0.001 * k`, `k < 17`.
pub fn synthetic_swath(layout: &SwathLayout) -> SyntheticSwath {
    let n = layout.len();
    let time_reference = reference_time();
    let n_low = n - n * 4 / 5;
    let stride = coprime_stride(n);

    let delta_time_ms: Vec<i64> = (0..layout.scanlines)
        .map(|s| s as i64 * layout.scanline_interval_ms)
        .collect();

    let mut swath = SyntheticSwath {
        scanlines: layout.scanlines,
        ground_pixels: layout.ground_pixels,
        longitude: Vec::with_capacity(n),
        latitude: Vec::with_capacity(n),
        value: Vec::with_capacity(n),
        quality: Vec::with_capacity(n),
        timestamp: Vec::with_capacity(n),
        time_reference,
        delta_time_ms: delta_time_ms.clone(),
    };

    for scanline in 0..layout.scanlines {
        let acquired = time_reference + Duration::milliseconds(delta_time_ms[scanline]);
        for pixel in 0..layout.ground_pixels {
            let i = scanline * layout.ground_pixels + pixel;

            swath.latitude.push(layout.origin_lat + scanline as f64 * layout.scanline_spacing_deg);
            swath
                .longitude
                .push(wrap_longitude(layout.origin_lon + pixel as f64 * layout.pixel_spacing_deg));

            let missing = layout.missing_every > 0 && (i + 1) % layout.missing_every == 0;
            swath.value.push(if missing {
                None
            } else {
                Some(0.030 + 0.001 * ((i * 13) % 17) as f64)
            });

            let rank = (i * stride) % n;
            let quality = if rank < n_low {
                (rank % 50) as f32 / 100.0
            } else {
                0.5 + ((rank - n_low) % 50) as f32 / 100.0
            };
            swath.quality.push(quality);
            swath.timestamp.push(acquired);
        }
    }

    swath
}

/// Wrap a longitude into `[-180, 180)`.
pub fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Smallest stride >= 7 that is coprime with `n`, so `i * stride % n` permutes `0..n`.
fn coprime_stride(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    (7..).find(|&s| gcd(s, n) == 1).unwrap_or(1)
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ANTIMERIDIAN_SWATH, REFERENCE_SWATH};

    #[test]
    fn test_swath_columns_are_aligned() {
        let swath = synthetic_swath(&REFERENCE_SWATH);
        assert_eq!(swath.len(), REFERENCE_SWATH.len());
        assert_eq!(swath.latitude.len(), swath.len());
        assert_eq!(swath.value.len(), swath.len());
        assert_eq!(swath.quality.len(), swath.len());
        assert_eq!(swath.timestamp.len(), swath.len());
        assert_eq!(swath.delta_time_ms.len(), REFERENCE_SWATH.scanlines);
    }

    #[test]
    fn test_quality_is_a_permutation() {
        let swath = synthetic_swath(&ANTIMERIDIAN_SWATH);
        let n = swath.len();
        let low = swath.quality.iter().filter(|&&q| q < 0.5).count();
        assert_eq!(low, n - n * 4 / 5);
    }

    #[test]
    fn test_missing_values() {
        let swath = synthetic_swath(&ANTIMERIDIAN_SWATH);
        assert_eq!(swath.len() - swath.defined_count(), swath.len() / 7);

        let filled = swath.values_with_fill(-1.0);
        assert_eq!(filled[6], -1.0);
        assert!(filled[0] > 0.0);
    }

    #[test]
    fn test_longitudes_wrap() {
        let swath = synthetic_swath(&ANTIMERIDIAN_SWATH);
        assert!(swath.longitude.iter().all(|&l| (-180.0..180.0).contains(&l)));
        assert!(swath.longitude.iter().any(|&l| l < 0.0));
    }

    #[test]
    fn test_timestamps_follow_scanlines() {
        let swath = synthetic_swath(&REFERENCE_SWATH);
        assert_eq!(swath.timestamp[0], swath.time_reference);
        let second_line = swath.timestamp[REFERENCE_SWATH.ground_pixels];
        assert_eq!(
            (second_line - swath.time_reference).num_milliseconds(),
            REFERENCE_SWATH.scanline_interval_ms
        );
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(7, 226), 1);
        assert_eq!(coprime_stride(226), 7);
        assert_eq!(coprime_stride(7 * 11), 8);
    }
}
