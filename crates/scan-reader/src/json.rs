//! JSON scan dumps.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::raw::RawScan;
use crate::{Scan, ScanReader};

/// Reads a [`RawScan`] serialized as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonScanReader;

impl JsonScanReader {
    pub fn new() -> Self {
        Self
    }

    /// Decode a dump without touching the filesystem.
    pub fn read_str(&self, json: &str) -> Result<Scan> {
        let raw: RawScan = serde_json::from_str(json)?;
        raw.into_scan()
    }

    /// Write `raw` as a dump readable by [`ScanReader::read`].
    pub fn write(raw: &RawScan, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, raw)?;
        writer.flush()?;
        Ok(())
    }
}

impl ScanReader for JsonScanReader {
    fn read(&self, path: &Path) -> Result<Scan> {
        debug!(path = %path.display(), "Reading JSON scan");
        let reader = BufReader::new(File::open(path)?);
        let raw: RawScan = serde_json::from_reader(reader)?;
        raw.into_scan()
    }
}
