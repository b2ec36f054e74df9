//! Input discovery and multi-scan loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use binning::PointTable;
use scan_reader::reader_for_path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const SCAN_EXTENSIONS: [&str; 3] = ["json", "nc", "nc4"];

/// Expand the command-line inputs into a sorted list of scan files.
///
/// Files are taken as given; directories are walked recursively for
/// `.json`/`.nc` files.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).follow_links(true) {
                let entry = entry.with_context(|| format!("Failed to walk {:?}", input))?;
                if entry.file_type().is_file() && has_scan_extension(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        } else if input.exists() {
            files.push(input.clone());
        } else {
            anyhow::bail!("Input {:?} does not exist", input);
        }
    }

    files.sort();
    files.dedup();
    debug!(count = files.len(), "Collected scan files");
    Ok(files)
}

fn has_scan_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SCAN_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Read every file and merge all ground-pixels into one table.
pub fn load_scans(files: &[PathBuf]) -> Result<PointTable> {
    let mut points = PointTable::default();

    for path in files {
        let reader = reader_for_path(path)?;
        let scan = reader
            .read(path)
            .with_context(|| format!("Failed to read scan {:?}", path))?;

        if scan.is_empty() {
            warn!(path = %path.display(), "Scan has no ground-pixels");
        }
        info!(
            path = %path.display(),
            points = scan.len(),
            time_reference = %scan.time_reference,
            "Loaded scan"
        );
        points.append(scan.into_points());
    }

    Ok(points)
}
