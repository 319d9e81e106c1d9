//! Padding of the time axis up to the forecast issue time.

use std::path::Path;

use chrono::{DateTime, Utc};
use sat_store::{canonical_cadence, floor_to_grid, SatelliteDataset, SatelliteStore, StoreConfig, StoreWriter};
use tracing::{info, warn};

use crate::error::Result;

/// Append all-missing frames every 5 minutes after the last frame, up to and
/// including `t0`.
///
/// There is no cap on how many frames are appended; judging whether the data
/// is too old is left to the availability check. Nothing happens when `t0` is
/// not later than the last frame, or when the dataset is empty. An issue time
/// off the 5-minute grid is padded up to the grid point just before it.
///
/// Returns the number of frames appended.
pub fn extend_to(dataset: &mut SatelliteDataset, t0: DateTime<Utc>) -> Result<usize> {
    let Some(last) = dataset.last_time() else {
        warn!("Cannot extend an empty satellite dataset");
        return Ok(0);
    };

    let target = floor_to_grid(t0, canonical_cadence());
    if target != t0 {
        warn!(%t0, %target, "Issue time is off the 5-minute grid, extending to the grid point before it");
    }

    let mut appended = 0usize;
    let mut t = last + canonical_cadence();
    while t <= target {
        dataset.push_missing_frame(t)?;
        appended += 1;
        t += canonical_cadence();
    }

    if appended > 0 {
        info!(%last, %t0, appended, "Extended satellite data with missing frames");
        metrics::counter!("satellite_frames_appended_total").increment(appended as u64);
    }
    Ok(appended)
}

/// Extend the store at `path` in place, keeping its encoding.
pub fn extend_store(path: &Path, t0: DateTime<Utc>, config: &StoreConfig) -> Result<usize> {
    let store = SatelliteStore::open(path)?;
    let encoding = store.encoding();
    let mut dataset = store.read()?;
    drop(store);

    let appended = extend_to(&mut dataset, t0)?;
    if appended > 0 {
        StoreWriter::new(config.clone()).write(path, &dataset, encoding)?;
    }
    Ok(appended)
}
