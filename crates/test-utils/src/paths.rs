//! Locating sample products and scratch space for tests.
//!
//! Real S5P products are large and not checked in. Tests that need one look
//! it up with [`find_test_file`] and skip when it is absent.

use std::path::PathBuf;

/// Directories searched for sample products, relative to the workspace root.
const SAMPLE_DIRS: [&str; 3] = ["crates/scan-reader/testdata", "crates/binning/testdata", "testdata"];

/// Workspace root: two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .map(PathBuf::from)
        .unwrap_or(manifest_dir)
}

/// Find a sample product by file name.
///
/// `SAMPLE_DATA_DIR` (if set) is searched before the in-tree directories.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let root = workspace_root();
    std::env::var_os("SAMPLE_DATA_DIR")
        .map(PathBuf::from)
        .into_iter()
        .chain(SAMPLE_DIRS.iter().map(|dir| root.join(dir)))
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
}

/// Scratch directory removed when dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}
