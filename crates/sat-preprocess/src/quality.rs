//! Degenerate-data check on the most recent frames.
//!
//! A sensor or ingestion failure typically shows up as frames full of zeros or
//! full of missing values. The check measures the share of pixels equal to a
//! flagged value across the last few frames and stops the run when that share
//! reaches the configured threshold. Pixel variance is not considered, so a
//! uniform but physical scene (say, solid cloud cover) passes.

use std::fmt;

use sat_store::{SatelliteDataset, SatelliteStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::QualityGateConfig;
use crate::error::{PreprocessError, Result};

/// A pixel value that indicates failed acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlaggedValue {
    /// Pixels within `tolerance` of `value`.
    Value { value: f32, tolerance: f32 },
    /// Missing (NaN) pixels.
    Missing,
}

impl FlaggedValue {
    /// Exactly zero.
    pub fn zero() -> Self {
        Self::Value {
            value: 0.0,
            tolerance: 0.0,
        }
    }

    /// Whether `pixel` carries this flag.
    pub fn matches(&self, pixel: f32) -> bool {
        match *self {
            Self::Value { value, tolerance } => (pixel - value).abs() <= tolerance,
            Self::Missing => pixel.is_nan(),
        }
    }
}

impl fmt::Display for FlaggedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value { value, tolerance } if *tolerance > 0.0 => {
                write!(f, "{} (±{})", value, tolerance)
            }
            Self::Value { value, .. } => write!(f, "{}", value),
            Self::Missing => write!(f, "NaN"),
        }
    }
}

/// Share of pixels in the last `window_frames` frames that carry `flagged`.
///
/// An empty window counts as fully flagged: there is nothing usable in it.
pub fn flagged_fraction(dataset: &SatelliteDataset, flagged: FlaggedValue, window_frames: usize) -> f64 {
    let pixels = dataset.recent_data(window_frames);
    if pixels.is_empty() {
        return 1.0;
    }
    let hits = pixels.iter().filter(|&&p| flagged.matches(p)).count();
    hits as f64 / pixels.len() as f64
}

/// Fail if the share of `flagged` pixels in the recent window reaches `threshold`.
pub fn check_flagged_values(
    dataset: &SatelliteDataset,
    flagged: FlaggedValue,
    window_frames: usize,
    threshold: f64,
) -> Result<()> {
    let fraction = flagged_fraction(dataset, flagged, window_frames);
    let window_frames = window_frames.min(dataset.len());

    if fraction >= threshold {
        error!(
            flagged = %flagged,
            fraction,
            threshold,
            window_frames,
            "Satellite data is degenerate"
        );
        metrics::counter!("satellite_quality_failures_total", "flagged" => flagged.to_string())
            .increment(1);
        return Err(PreprocessError::DataQuality {
            flagged: flagged.to_string(),
            fraction,
            threshold,
            window_frames,
        });
    }

    debug!(flagged = %flagged, fraction, window_frames, "Quality pass ok");
    Ok(())
}

/// Run every configured pass, stopping at the first failure.
pub fn check_quality(dataset: &SatelliteDataset, config: &QualityGateConfig) -> Result<()> {
    for &flagged in &config.flagged {
        check_flagged_values(dataset, flagged, config.window_frames, config.threshold)?;
    }
    Ok(())
}

/// Run the check against a store, reading only the frames it inspects.
pub fn check_store_quality(store: &SatelliteStore, config: &QualityGateConfig) -> Result<()> {
    let recent = store.read_recent(config.window_frames)?;
    check_quality(&recent, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use sat_store::default_dimensions;
    use test_utils::{create_alternating_stack, create_constant_frame, create_frame_stack};

    fn dataset(frames: usize, data: Vec<f32>) -> SatelliteDataset {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let times = (0..frames as i64).map(|i| start + Duration::minutes(5 * i)).collect();
        SatelliteDataset::new(times, vec![2, 3], default_dimensions(), data).unwrap()
    }

    #[test]
    fn test_normal_data_passes() {
        let ds = dataset(12, create_frame_stack(12, 3, 2, 1.0));
        assert!(check_quality(&ds, &QualityGateConfig::default()).is_ok());
    }

    #[test]
    fn test_uniform_scene_passes() {
        let data = (0..12).flat_map(|_| create_constant_frame(3, 2, 0.62)).collect();
        let ds = dataset(12, data);
        assert!(check_quality(&ds, &QualityGateConfig::default()).is_ok());
    }

    #[test]
    fn test_all_zero_fails() {
        let ds = dataset(12, vec![0.0; 72]);
        let err = check_quality(&ds, &QualityGateConfig::default()).unwrap_err();
        match err {
            PreprocessError::DataQuality { fraction, flagged, .. } => {
                assert_eq!(fraction, 1.0);
                assert_eq!(flagged, "0");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_half_zero_fails() {
        let ds = dataset(12, create_alternating_stack(12, 3, 2, 0.0));
        assert_eq!(flagged_fraction(&ds, FlaggedValue::zero(), 12), 0.5);
        assert!(check_quality(&ds, &QualityGateConfig::default()).is_err());
    }

    #[test]
    fn test_all_nan_fails_on_missing_pass() {
        let ds = dataset(12, vec![f32::NAN; 72]);
        assert!(check_flagged_values(&ds, FlaggedValue::zero(), 12, 0.5).is_ok());
        let err = check_flagged_values(&ds, FlaggedValue::Missing, 12, 0.5).unwrap_err();
        assert!(matches!(err, PreprocessError::DataQuality { ref flagged, .. } if flagged == "NaN"));
    }

    #[test]
    fn test_only_recent_window_is_inspected() {
        // Old frames are all zero, the latest four are fine.
        let mut data = vec![0.0; 8 * 6];
        data.extend(create_frame_stack(4, 3, 2, 1.0));
        let ds = dataset(12, data);

        assert!(check_flagged_values(&ds, FlaggedValue::zero(), 4, 0.5).is_ok());
        assert!(check_flagged_values(&ds, FlaggedValue::zero(), 12, 0.5).is_err());
    }

    #[test]
    fn test_near_zero_tolerance() {
        let ds = dataset(2, vec![0.001; 12]);
        let near_zero = FlaggedValue::Value {
            value: 0.0,
            tolerance: 0.01,
        };
        assert!(check_flagged_values(&ds, FlaggedValue::zero(), 2, 0.5).is_ok());
        assert!(check_flagged_values(&ds, near_zero, 2, 0.5).is_err());
    }

    #[test]
    fn test_empty_dataset_fails() {
        let ds = SatelliteDataset::empty(vec![2, 3], default_dimensions()).unwrap();
        assert!(check_quality(&ds, &QualityGateConfig::default()).is_err());
    }
}
