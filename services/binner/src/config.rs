//! Configuration loading for the binner.
//!
//! Layers, lowest first: built-in defaults, YAML file, `BINNING_*`
//! environment variables, command-line flags. The YAML file supports
//! `${VAR}` and `${VAR:-default}` substitution.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use binning::{BinningConfig, Reduction};

/// Command-line overrides; `None`/`false` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub resolution: Option<u8>,
    pub minimal_quality: Option<f32>,
    pub reduction: Option<Reduction>,
    pub no_project: bool,
    pub parallel: bool,
}

/// Build the effective configuration.
pub fn resolve_config(file: Option<&Path>, overrides: &Overrides) -> Result<BinningConfig> {
    resolve_config_with(file, overrides, |key| std::env::var(key).ok())
}

/// [`resolve_config`] with a custom environment lookup.
pub fn resolve_config_with<F>(
    file: Option<&Path>,
    overrides: &Overrides,
    lookup: F,
) -> Result<BinningConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match file {
        Some(path) => load_config_file(path, &lookup)?,
        None => {
            // Without a file the reduction has to come from a higher layer
            let reduction = match (overrides.reduction, lookup("BINNING_REDUCTION")) {
                (Some(reduction), _) => reduction,
                (None, Some(name)) => name.parse()?,
                (None, None) => anyhow::bail!(
                    "no reduction configured: pass --reduction, set BINNING_REDUCTION or use --config"
                ),
            };
            BinningConfig::new(reduction)
        }
    };

    config.apply_env_from(&lookup)?;

    if let Some(resolution) = overrides.resolution {
        config.resolution = resolution;
    }
    if let Some(minimal_quality) = overrides.minimal_quality {
        config.minimal_quality = minimal_quality;
    }
    if let Some(reduction) = overrides.reduction {
        config.reduction = reduction;
    }
    if overrides.no_project {
        config.project = false;
    }
    if overrides.parallel {
        config.parallel = true;
    }

    config.validate()?;
    Ok(config)
}

/// Load a YAML configuration file.
pub fn load_config_file<F>(path: &Path, lookup: F) -> Result<BinningConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {:?}", path))?;

    let expanded = expand_env_vars(&content, &lookup)?;

    BinningConfig::from_yaml_str(&expanded)
        .with_context(|| format!("Failed to parse config from {:?}", path))
}

/// Substitute `${VAR}` and `${VAR:-default}` references.
fn expand_env_vars<F>(content: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr, &lookup)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_var_expr<F>(expr: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some((var_name, default)) = expr.split_once(":-") {
        match lookup(var_name.trim()) {
            Some(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        lookup(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}
