//! Decoded but unvalidated swath arrays.

use binning::PointTable;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScanError};
use crate::time::parse_time_reference;
use crate::Scan;

/// A swath as stored in a product: 2-D arrays (scanline x ground-pixel),
/// flattened row-major, plus one acquisition offset per scanline.
///
/// This is also the JSON dump format read by
/// [`JsonScanReader`](crate::JsonScanReader).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawScan {
    /// Start of the acquisition; see [`parse_time_reference`] for accepted forms.
    pub time_reference: String,
    pub scanlines: usize,
    pub ground_pixels: usize,
    pub longitude: Vec<f64>,
    pub latitude: Vec<f64>,
    /// Measured values; `null`, non-finite or `fill_value` entries are missing.
    pub value: Vec<Option<f64>>,
    pub quality: Vec<f32>,
    /// Milliseconds since `time_reference`, one per scanline. A `null`
    /// scanline has no acquisition time and all its values are missing.
    pub delta_time: Vec<Option<i64>>,
    /// Sentinel used by the product for missing values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<f64>,
}

impl RawScan {
    /// Number of ground-pixels the dimensions describe.
    pub fn expected_len(&self) -> Result<usize> {
        self.scanlines
            .checked_mul(self.ground_pixels)
            .ok_or_else(|| {
                ScanError::InvalidFormat(format!(
                    "swath of {} scanlines x {} ground pixels is too large",
                    self.scanlines, self.ground_pixels
                ))
            })
    }

    /// Check shapes against the dimensions.
    pub fn validate(&self) -> Result<()> {
        let expected = self.expected_len()?;
        check_shape("longitude", expected, self.longitude.len())?;
        check_shape("latitude", expected, self.latitude.len())?;
        check_shape("value", expected, self.value.len())?;
        check_shape("quality", expected, self.quality.len())?;
        check_shape("delta_time", self.scanlines, self.delta_time.len())?;
        Ok(())
    }

    /// Validate and flatten into a [`Scan`].
    ///
    /// Every ground-pixel of scanline `s` gets the timestamp
    /// `time_reference + delta_time[s]` milliseconds. Untimed scanlines keep
    /// `time_reference` and lose their values.
    pub fn into_scan(self) -> Result<Scan> {
        self.validate()?;
        let time_reference = parse_time_reference(&self.time_reference)?;

        let ground_pixels = self.ground_pixels;
        let acquired = self
            .delta_time
            .iter()
            .map(|&ms| ms.map(|ms| offset(time_reference, ms)).transpose())
            .collect::<Result<Vec<_>>>()?;
        let timestamps = acquired
            .iter()
            .flat_map(|&t| std::iter::repeat(t.unwrap_or(time_reference)).take(ground_pixels))
            .collect();

        let fill = self.fill_value;
        let values: Vec<Option<f64>> = self
            .value
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                let timed = acquired[i / ground_pixels].is_some();
                v.filter(|v| timed && v.is_finite() && Some(*v) != fill)
            })
            .collect();
        let missing = values.iter().filter(|v| v.is_none()).count();

        let points = PointTable::new(
            self.longitude,
            self.latitude,
            values,
            self.quality,
            timestamps,
        )?;

        debug!(
            scanlines = self.scanlines,
            ground_pixels,
            points = points.len(),
            missing,
            %time_reference,
            "Decoded swath"
        );

        Ok(Scan {
            time_reference,
            points,
        })
    }
}

fn offset(time_reference: DateTime<Utc>, ms: i64) -> Result<DateTime<Utc>> {
    TimeDelta::try_milliseconds(ms)
        .and_then(|delta| time_reference.checked_add_signed(delta))
        .ok_or_else(|| {
            ScanError::InvalidFormat(format!(
                "delta_time {ms} ms is out of range for {time_reference}"
            ))
        })
}

fn check_shape(variable: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(ScanError::shape_mismatch(variable, expected, actual));
    }
    Ok(())
}
