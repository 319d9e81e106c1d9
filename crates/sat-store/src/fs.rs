//! Filesystem handling for directory stores: copying, removal, and scoped
//! replacement of a store in place.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, StoreError};

/// Whether a store directory exists at `path`.
pub fn store_exists(path: &Path) -> bool {
    path.is_dir()
}

/// Fail with [`StoreError::ZippedStore`] for a `.zip` path.
pub fn reject_zipped(path: &Path) -> Result<()> {
    let zipped = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    if zipped {
        return Err(StoreError::ZippedStore(path.to_path_buf()));
    }
    Ok(())
}

/// Remove a store directory if it exists.
pub fn remove_store(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
        debug!(path = %path.display(), "Removed store");
    }
    Ok(())
}

/// Recursively copy the store at `src` to `dst`, replacing anything at `dst`.
///
/// Returns the number of bytes copied.
pub fn copy_store(src: &Path, dst: &Path) -> Result<u64> {
    reject_zipped(src)?;
    if !store_exists(src) {
        return Err(StoreError::NotFound(src.to_path_buf()));
    }

    let staging = PartialStore::begin(dst)?;
    let mut bytes = 0u64;

    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| StoreError::Io(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| StoreError::invalid_layout(e.to_string()))?;
        let target = staging.path().join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            bytes += fs::copy(entry.path(), &target)?;
        }
    }

    staging.commit()?;
    debug!(src = %src.display(), dst = %dst.display(), bytes, "Copied store");
    Ok(bytes)
}

/// A store being built next to its final location.
///
/// The store is written into `<name>.partial`. [`PartialStore::commit`] swaps it
/// into place; dropping the guard without committing removes the partial
/// directory, so a failed write never leaves a half-built store behind and
/// never disturbs the store that was already there.
#[derive(Debug)]
pub struct PartialStore {
    target: PathBuf,
    partial: PathBuf,
    committed: bool,
}

impl PartialStore {
    /// Start building a store that will replace `target`.
    pub fn begin(target: &Path) -> Result<Self> {
        let mut name = target
            .file_name()
            .ok_or_else(|| {
                StoreError::invalid_layout(format!("store path {} has no name", target.display()))
            })?
            .to_os_string();
        name.push(".partial");
        let partial = target.with_file_name(name);

        remove_store(&partial)?;
        fs::create_dir_all(&partial)?;

        Ok(Self {
            target: target.to_path_buf(),
            partial,
            committed: false,
        })
    }

    /// Directory to write the new store into.
    pub fn path(&self) -> &Path {
        &self.partial
    }

    /// Replace the target with the finished store.
    pub fn commit(mut self) -> Result<()> {
        remove_store(&self.target)?;
        fs::rename(&self.partial, &self.target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialStore {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = fs::remove_dir_all(&self.partial) {
                warn!(path = %self.partial.display(), error = %e, "Failed to clean up partial store");
            }
        }
    }
}
