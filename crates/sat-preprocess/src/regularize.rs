//! Repair of irregular time axes onto the canonical 5-minute grid.
//!
//! Planning and pixel arithmetic are kept apart: [`fillable_intervals`] and
//! [`plan_grid`] decide from timestamps alone which grid points exist and where
//! their values come from, and [`regularize`] then applies that plan to the
//! pixel data.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use sat_store::{canonical_cadence, grid_range, SatelliteDataset, SatelliteStore, StoreConfig, StoreWriter};
use tracing::{debug, info};

use crate::error::Result;

/// Two consecutive real frames close enough together to interpolate between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillInterval {
    /// Index of the earlier frame.
    pub before: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Consecutive pairs of `times` whose spacing is at most `max_gap`.
///
/// `times` must be strictly increasing. Pairs further apart are outages: no
/// values are invented between them.
pub fn fillable_intervals(times: &[DateTime<Utc>], max_gap: Duration) -> Vec<FillInterval> {
    times
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[1] - pair[0] <= max_gap)
        .map(|(before, pair)| FillInterval {
            before,
            start: pair[0],
            end: pair[1],
        })
        .collect()
}

/// Where the value of one output grid point comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridSource {
    /// Copied verbatim from real frame `index`.
    Observed(usize),
    /// Blended from frames `before` and `before + 1`; `weight` is the share of
    /// the later frame.
    Interpolated { before: usize, weight: f64 },
}

/// Output time axis for `times`, with the source of every point.
///
/// Grid points lying inside an unfillable interval are left out.
pub fn plan_grid(times: &[DateTime<Utc>], max_gap: Duration) -> Vec<(DateTime<Utc>, GridSource)> {
    let (Some(&first), Some(&last)) = (times.first(), times.last()) else {
        return Vec::new();
    };
    let intervals = fillable_intervals(times, max_gap);

    grid_range(first, last, canonical_cadence())
        .into_iter()
        .filter_map(|t| match times.binary_search(&t) {
            Ok(index) => Some((t, GridSource::Observed(index))),
            Err(next) => {
                // `t` lies strictly inside (times[next - 1], times[next]).
                let before = next.checked_sub(1)?;
                let interval = intervals
                    .binary_search_by_key(&before, |iv| iv.before)
                    .ok()
                    .map(|i| intervals[i])?;
                let span = (interval.end - interval.start).num_milliseconds() as f64;
                let offset = (t - interval.start).num_milliseconds() as f64;
                Some((
                    t,
                    GridSource::Interpolated {
                        before,
                        weight: offset / span,
                    },
                ))
            }
        })
        .collect()
}

/// Reindex `dataset` onto the canonical 5-minute grid.
///
/// Grid points that coincide with a real frame keep its values exactly; points
/// between two real frames at most `max_gap` apart are linearly interpolated
/// pixel by pixel (a missing bound gives a missing result); all other points
/// are omitted. Applying this to an already gridded dataset returns it
/// unchanged.
pub fn regularize(dataset: &SatelliteDataset, max_gap: Duration) -> Result<SatelliteDataset> {
    let plan = plan_grid(dataset.times(), max_gap);
    let frame_len = dataset.frame_len();

    let mut times = Vec::with_capacity(plan.len());
    let mut data = Vec::with_capacity(plan.len() * frame_len);
    let mut interpolated = 0usize;

    for (t, source) in &plan {
        times.push(*t);
        match *source {
            GridSource::Observed(index) => {
                data.extend_from_slice(&dataset.data()[index * frame_len..(index + 1) * frame_len]);
            }
            GridSource::Interpolated { before, weight } => {
                let lo = &dataset.data()[before * frame_len..(before + 1) * frame_len];
                let hi = &dataset.data()[(before + 1) * frame_len..(before + 2) * frame_len];
                data.extend(lo.iter().zip(hi).map(|(&a, &b)| {
                    (f64::from(a) * (1.0 - weight) + f64::from(b) * weight) as f32
                }));
                interpolated += 1;
            }
        }
    }

    let observed = plan.len() - interpolated;
    let span_points = match (dataset.first_time(), dataset.last_time()) {
        (Some(first), Some(last)) => grid_range(first, last, canonical_cadence()).len(),
        _ => 0,
    };
    info!(
        input_frames = dataset.len(),
        observed,
        interpolated,
        unfilled = span_points - plan.len(),
        dropped_off_grid = dataset.len() - observed,
        "Regularized time axis to 5-minute grid"
    );

    Ok(SatelliteDataset::new(
        times,
        dataset.frame_shape().to_vec(),
        dataset.dimensions().to_vec(),
        data,
    )?)
}

/// Regularize the store at `path` in place, keeping its encoding.
pub fn regularize_store(path: &Path, max_gap: Duration, config: &StoreConfig) -> Result<()> {
    let store = SatelliteStore::open(path)?;
    let encoding = store.encoding();
    let dataset = store.read()?;
    drop(store);

    let regular = regularize(&dataset, max_gap)?;
    StoreWriter::new(config.clone()).write(path, &regular, encoding)?;
    debug!(path = %path.display(), frames = regular.len(), "Rewrote regularized store");
    Ok(())
}
