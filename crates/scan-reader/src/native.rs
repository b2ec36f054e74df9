//! Native Sentinel-5P L2 reading using the netcdf library.
//!
//! L2 products keep their swath in the `PRODUCT` group with dimensions
//! `(time, scanline, ground_pixel)`. Only the first time step is read; S5P
//! files carry exactly one.

use std::path::Path;
use std::sync::Once;

use tracing::debug;

use crate::error::{Result, ScanError};
use crate::raw::RawScan;
use crate::{Scan, ScanReader};

/// Default product variable.
pub const CARBON_MONOXIDE: &str = "carbonmonoxide_total_column";

const PRODUCT_GROUP: &str = "PRODUCT";
const TIME_REFERENCE_ATTRS: [&str; 2] = ["time_reference", "NC_GLOBAL#time_reference"];

/// Silence HDF5's automatic error printing to stderr.
///
/// HDF5 reports every failed lookup of an optional attribute, even when the
/// caller handles it. Safe to call more than once.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable the default error stack printer.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Reads Sentinel-5P L2 NetCDF-4 products.
#[derive(Debug, Clone)]
pub struct NetCdfScanReader {
    product: String,
}

impl Default for NetCdfScanReader {
    fn default() -> Self {
        Self::new(CARBON_MONOXIDE)
    }
}

impl NetCdfScanReader {
    /// Reader for the product variable `product` (e.g. `methane_mixing_ratio`).
    pub fn new(product: impl Into<String>) -> Self {
        Self {
            product: product.into(),
        }
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    fn read_raw(&self, path: &Path) -> Result<RawScan> {
        silence_hdf5_errors();

        let file = netcdf::open(path)
            .map_err(|e| ScanError::InvalidFormat(format!("failed to open NetCDF: {e}")))?;
        let group = file
            .group(PRODUCT_GROUP)
            .map_err(|e| ScanError::InvalidFormat(format!("failed to open group: {e}")))?
            .ok_or_else(|| ScanError::missing(format!("{PRODUCT_GROUP} group")))?;

        let value_var = variable(&group, &self.product)?;
        let (scanlines, ground_pixels) = swath_shape(&value_var)?;
        let n = scanlines.checked_mul(ground_pixels).ok_or_else(|| {
            ScanError::InvalidFormat(format!("{scanlines} x {ground_pixels} swath is too large"))
        })?;

        let value = read_scaled(&value_var, n)?;
        let longitude = read_scaled(&variable(&group, "longitude")?, n)?;
        let latitude = read_scaled(&variable(&group, "latitude")?, n)?;
        let quality = read_scaled(&variable(&group, "qa_value")?, n)?;

        let delta_var = variable(&group, "delta_time")?;
        let delta_time: Vec<i64> = delta_var
            .get_values(..)
            .map_err(|e| ScanError::InvalidFormat(format!("failed to read delta_time: {e}")))?;
        let delta_time = mask_fill(
            first_step(delta_time, scanlines, "delta_time")?,
            get_i64_attr(&delta_var, "_FillValue"),
        );

        let time_reference = time_reference(&file)?;

        Ok(RawScan {
            time_reference,
            scanlines,
            ground_pixels,
            longitude: longitude.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
            latitude: latitude.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
            value,
            quality: quality
                .into_iter()
                .map(|v| v.map_or(f32::NAN, |q| q as f32))
                .collect(),
            delta_time,
            fill_value: None,
        })
    }
}

impl ScanReader for NetCdfScanReader {
    fn read(&self, path: &Path) -> Result<Scan> {
        debug!(path = %path.display(), product = %self.product, "Reading NetCDF scan");
        self.read_raw(path)?.into_scan()
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

fn variable<'g>(group: &'g netcdf::Group<'_>, name: &str) -> Result<netcdf::Variable<'g>> {
    group
        .variable(name)
        .ok_or_else(|| ScanError::missing(format!("{PRODUCT_GROUP}/{name} variable")))
}

/// `(scanline, ground_pixel)` lengths from the trailing two dimensions.
fn swath_shape(var: &netcdf::Variable) -> Result<(usize, usize)> {
    let dims = var.dimensions();
    match dims {
        [.., scanline, ground_pixel] => Ok((scanline.len(), ground_pixel.len())),
        _ => Err(ScanError::InvalidFormat(format!(
            "variable '{}' has {} dimensions, expected at least 2",
            var.name(),
            dims.len()
        ))),
    }
}

/// Read the first time step of a packed variable, unpacking
/// `scale_factor`/`add_offset` and masking `_FillValue` as `None`.
fn read_scaled(var: &netcdf::Variable, n: usize) -> Result<Vec<Option<f64>>> {
    let raw: Vec<f32> = var
        .get_values(..)
        .map_err(|e| ScanError::InvalidFormat(format!("failed to read {}: {e}", var.name())))?;
    let raw = first_step(raw, n, &var.name())?;

    let scale_factor = get_f64_attr(var, "scale_factor").unwrap_or(1.0);
    let add_offset = get_f64_attr(var, "add_offset").unwrap_or(0.0);
    let fill_value = get_f32_attr(var, "_FillValue");

    Ok(raw
        .into_iter()
        .map(|v| {
            if !v.is_finite() || Some(v) == fill_value {
                None
            } else {
                Some(v as f64 * scale_factor + add_offset)
            }
        })
        .collect())
}

fn mask_fill(data: Vec<i64>, fill_value: Option<i64>) -> Vec<Option<i64>> {
    data.into_iter()
        .map(|v| Some(v).filter(|&v| Some(v) != fill_value))
        .collect()
}

/// Keep the first `n` elements of a `(time, ...)` array.
fn first_step<T>(mut data: Vec<T>, n: usize, name: &str) -> Result<Vec<T>> {
    if data.len() < n {
        return Err(ScanError::shape_mismatch(name, n, data.len()));
    }
    data.truncate(n);
    Ok(data)
}

fn time_reference(file: &netcdf::File) -> Result<String> {
    for name in TIME_REFERENCE_ATTRS {
        let Some(attr) = file.attribute(name) else {
            continue;
        };
        let value = attr
            .value()
            .map_err(|e| ScanError::InvalidFormat(format!("failed to read {name}: {e}")))?;
        return match value {
            netcdf::AttributeValue::Str(s) => Ok(s),
            other => Err(ScanError::InvalidFormat(format!(
                "{name} is not a string: {other:?}"
            ))),
        };
    }
    Err(ScanError::missing("time_reference attribute"))
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f32_attr(var: &netcdf::Variable, name: &str) -> Option<f32> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f32::try_from(attr_value).ok()
}

fn get_i64_attr(var: &netcdf::Variable, name: &str) -> Option<i64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    i64::try_from(attr_value).ok()
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}
