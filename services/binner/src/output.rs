//! JSON output of cell groups.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use binning::CellGroupTable;

/// Write `groups` as a JSON array sorted by cell id, to `path` or stdout.
pub fn write_groups(groups: &CellGroupTable, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output {:?}", path))?;
            write_json(groups, BufWriter::new(file))
                .with_context(|| format!("Failed to write output {:?}", path))
        }
        None => write_json(groups, io::stdout().lock()),
    }
}

fn write_json<W: Write>(groups: &CellGroupTable, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, &groups.sorted_by_cell())?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
