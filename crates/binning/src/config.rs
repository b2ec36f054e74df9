//! Configuration for the binning pipeline.

use serde::{Deserialize, Serialize};

use crate::aggregate::Reduction;
use crate::error::{BinningError, Result};
use crate::filter::DEFAULT_MINIMAL_QUALITY;

/// Default grid resolution (H3 level 7, cells of roughly 5 km²).
pub const DEFAULT_RESOLUTION: u8 = 7;

/// Configuration for a [`Binner`](crate::Binner) run.
///
/// `reduction` has no default and must always be given, in code via
/// [`BinningConfig::new`] or as a key in YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinningConfig {
    /// Grid resolution passed to the geo-index provider.
    #[serde(default = "default_resolution")]
    pub resolution: u8,

    /// Rows with a lower quality are dropped before assignment.
    #[serde(default = "default_minimal_quality")]
    pub minimal_quality: f32,

    /// How member values collapse into a cell value.
    pub reduction: Reduction,

    /// Fill in representative coordinates for each cell group.
    #[serde(default = "default_true")]
    pub project: bool,

    /// Use the rayon pool for assignment and reduction.
    #[serde(default)]
    pub parallel: bool,
}

fn default_resolution() -> u8 {
    DEFAULT_RESOLUTION
}

fn default_minimal_quality() -> f32 {
    DEFAULT_MINIMAL_QUALITY
}

fn default_true() -> bool {
    true
}

impl BinningConfig {
    pub fn new(reduction: Reduction) -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            minimal_quality: DEFAULT_MINIMAL_QUALITY,
            reduction,
            project: true,
            parallel: false,
        }
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| BinningError::config(e.to_string()))
    }

    /// Override fields from `BINNING_*` environment variables.
    ///
    /// Variables that are set but do not parse are an error.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// [`apply_env`](Self::apply_env) with a custom variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("BINNING_RESOLUTION") {
            self.resolution = parse_env("BINNING_RESOLUTION", &val)?;
        }

        if let Some(val) = lookup("BINNING_MIN_QUALITY") {
            self.minimal_quality = parse_env("BINNING_MIN_QUALITY", &val)?;
        }

        if let Some(val) = lookup("BINNING_REDUCTION") {
            self.reduction = val.parse()?;
        }

        if let Some(val) = lookup("BINNING_PROJECT") {
            self.project = parse_flag("BINNING_PROJECT", &val)?;
        }

        if let Some(val) = lookup("BINNING_PARALLEL") {
            self.parallel = parse_flag("BINNING_PARALLEL", &val)?;
        }

        Ok(())
    }

    /// Validate the configuration.
    ///
    /// The resolution range depends on the provider and is checked by
    /// [`Binner::new`](crate::Binner::new).
    pub fn validate(&self) -> Result<()> {
        if !self.minimal_quality.is_finite() {
            return Err(BinningError::config(format!(
                "minimal_quality must be finite, got {}",
                self.minimal_quality
            )));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, val: &str) -> Result<T> {
    val.trim()
        .parse()
        .map_err(|_| BinningError::config(format!("{key}: cannot parse '{val}'")))
}

fn parse_flag(key: &str, val: &str) -> Result<bool> {
    match val.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BinningError::config(format!(
            "{key}: expected a boolean, got '{val}'"
        ))),
    }
}
