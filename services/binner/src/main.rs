//! Swath binning command-line tool.
//!
//! Reads one or more Sentinel-5P scans, filters them by quality, bins the
//! ground-pixels onto the H3 grid and writes one JSON record per cell.

mod config;
mod inputs;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use binning::{Binner, Reduction};
use clap::Parser;
use geo_index::H3Index;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use config::{resolve_config, Overrides};

#[derive(Parser, Debug)]
#[command(name = "binner")]
#[command(about = "Bin satellite swath products onto a hexagonal global grid")]
struct Args {
    /// Scan files or directories to search for scans
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// YAML configuration file
    #[arg(short, long, env = "BINNER_CONFIG")]
    config: Option<PathBuf>,

    /// H3 resolution (0-15)
    #[arg(short, long)]
    resolution: Option<u8>,

    /// Minimal quality a ground-pixel needs to be kept
    #[arg(short = 'q', long)]
    min_quality: Option<f32>,

    /// Per-cell reduction: mean or median
    #[arg(long)]
    reduction: Option<Reduction>,

    /// Skip the cell-to-point projection
    #[arg(long)]
    no_project: bool,

    /// Assign and aggregate on all cores
    #[arg(long)]
    parallel: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.json_logs)?;

    let overrides = Overrides {
        resolution: args.resolution,
        minimal_quality: args.min_quality,
        reduction: args.reduction,
        no_project: args.no_project,
        parallel: args.parallel,
    };
    let config = resolve_config(args.config.as_deref(), &overrides)?;
    info!(
        resolution = config.resolution,
        minimal_quality = config.minimal_quality,
        reduction = %config.reduction,
        project = config.project,
        parallel = config.parallel,
        "Loaded configuration"
    );

    let files = inputs::collect_inputs(&args.inputs)?;
    anyhow::ensure!(!files.is_empty(), "No scan files found in {:?}", args.inputs);

    let points = inputs::load_scans(&files)?;
    info!(scans = files.len(), points = points.len(), "Merged scans");

    let binner = Binner::new(H3Index::new(), config).context("Invalid binning configuration")?;
    let report = binner.run(&points)?;

    output::write_groups(&report.groups, args.output.as_deref())?;
    info!(
        cells = report.groups.len(),
        stage = %report.stage,
        output = ?args.output,
        "Wrote cell groups"
    );

    Ok(())
}

/// Logs go to stderr so stdout can carry the JSON output.
fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .with_context(|| format!("Invalid log level '{}'", log_level))?;

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}
