//! Local staging of the raw stores.
//!
//! Upstream publishes the newest data as `latest.zarr` (5-minute) and
//! `latest_15.zarr` (15-minute). Each run clears whatever the previous run
//! left in the work directory, then copies the stores that exist upstream.

use std::path::Path;

use anyhow::{Context, Result};
use sat_preprocess::SourcePaths;
use sat_store::{copy_store, reject_zipped, remove_store, store_exists};
use serde::Serialize;
use tracing::{info, warn};

/// Upstream name of the 5-minute store.
pub const UPSTREAM_FIVE_MINUTE: &str = "latest.zarr";
/// Upstream name of the 15-minute store.
pub const UPSTREAM_FIFTEEN_MINUTE: &str = "latest_15.zarr";

/// Which raw stores were staged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StagingReport {
    pub five_minute: bool,
    pub fifteen_minute: bool,
}

/// Remove the raw and canonical stores from a previous run.
pub fn clear_local(paths: &SourcePaths) -> Result<()> {
    for path in [&paths.five_minute, &paths.fifteen_minute, &paths.canonical] {
        remove_store(path).with_context(|| format!("failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Copy the upstream stores that exist into their well-known local paths.
pub fn stage_raw_stores(upstream_dir: &Path, paths: &SourcePaths) -> Result<StagingReport> {
    clear_local(paths)?;

    let mut report = StagingReport::default();
    for (name, target, staged) in [
        (UPSTREAM_FIVE_MINUTE, &paths.five_minute, &mut report.five_minute),
        (UPSTREAM_FIFTEEN_MINUTE, &paths.fifteen_minute, &mut report.fifteen_minute),
    ] {
        let source = upstream_dir.join(name);
        if !store_exists(&source) {
            let zipped = source.with_extension("zarr.zip");
            if zipped.is_file() {
                reject_zipped(&zipped)
                    .with_context(|| format!("failed to stage {}", zipped.display()))?;
            }
            warn!(source = %source.display(), "Upstream satellite store not found, skipping");
            continue;
        }
        let bytes = copy_store(&source, target)
            .with_context(|| format!("failed to stage {}", source.display()))?;
        info!(source = %source.display(), target = %target.display(), bytes, "Staged satellite store");
        *staged = true;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fake_store(path: &Path) {
        fs::create_dir_all(path).unwrap();
        fs::write(path.join("zarr.json"), "{}").unwrap();
    }

    #[test]
    fn test_stages_available_stores() {
        let upstream = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        fake_store(&upstream.path().join(UPSTREAM_FIVE_MINUTE));

        let paths = SourcePaths::in_dir(work.path());
        let report = stage_raw_stores(upstream.path(), &paths).unwrap();

        assert_eq!(
            report,
            StagingReport {
                five_minute: true,
                fifteen_minute: false
            }
        );
        assert!(paths.five_minute.join("zarr.json").exists());
        assert!(!paths.fifteen_minute.exists());
    }

    #[test]
    fn test_zipped_upstream_store_rejected() {
        let upstream = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        fs::write(upstream.path().join("latest.zarr.zip"), b"PK").unwrap();

        let paths = SourcePaths::in_dir(work.path());
        let err = stage_raw_stores(upstream.path(), &paths).unwrap_err();

        let message = format!("{:#}", err);
        assert!(message.contains("latest.zarr.zip"), "{message}");
        assert!(message.contains("unzip"), "{message}");
        assert!(!paths.five_minute.exists());
    }

    #[test]
    fn test_stale_local_copies_are_cleared() {
        let upstream = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let paths = SourcePaths::in_dir(work.path());
        fake_store(&paths.fifteen_minute);
        fake_store(&paths.canonical);
        fake_store(&upstream.path().join(UPSTREAM_FIVE_MINUTE));

        stage_raw_stores(upstream.path(), &paths).unwrap();

        assert!(paths.five_minute.exists());
        assert!(!paths.fifteen_minute.exists());
        assert!(!paths.canonical.exists());
    }
}
