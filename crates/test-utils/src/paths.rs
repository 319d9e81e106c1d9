//! Path utilities for scratch directories used by tests.

use std::path::PathBuf;

use tempfile::TempDir;

/// Scratch directory laid out like one pipeline run.
///
/// The directory is automatically cleaned up when dropped.
pub struct RunDirs {
    /// Keeps the directory alive.
    pub root: TempDir,
    /// Where the 5-minute raw store is staged.
    pub five_minute: PathBuf,
    /// Where the 15-minute raw store is staged.
    pub fifteen_minute: PathBuf,
    /// Where the canonical store is written.
    pub canonical: PathBuf,
}

/// Creates a fresh scratch directory for one pipeline run.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
pub fn run_dirs() -> RunDirs {
    let root = tempfile::tempdir().expect("Failed to create temp directory");
    let base = root.path().to_path_buf();
    RunDirs {
        root,
        five_minute: base.join("sat_5_min.zarr"),
        fifteen_minute: base.join("sat_15_min.zarr"),
        canonical: base.join("sat.zarr"),
    }
}
