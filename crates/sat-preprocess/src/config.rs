//! Configuration for satellite preprocessing.
//!
//! Everything a run needs is carried explicitly in [`PipelineConfig`], built
//! once by the orchestrator and passed to each component.

use std::path::{Path, PathBuf};

use chrono::Duration;
use sat_store::StoreConfig;
use serde::{Deserialize, Serialize};

use crate::quality::FlaggedValue;

/// File name of the staged 5-minute raw store.
pub const FIVE_MINUTE_STORE: &str = "sat_5_min.zarr";
/// File name of the staged 15-minute raw store.
pub const FIFTEEN_MINUTE_STORE: &str = "sat_15_min.zarr";
/// File name of the canonical store.
pub const CANONICAL_STORE: &str = "sat.zarr";

/// Local store locations for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePaths {
    /// Raw store at the native 5-minute cadence.
    pub five_minute: PathBuf,
    /// Raw store at the native 15-minute cadence.
    pub fifteen_minute: PathBuf,
    /// The single store consumed downstream.
    pub canonical: PathBuf,
}

impl SourcePaths {
    /// The well-known store names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            five_minute: dir.join(FIVE_MINUTE_STORE),
            fifteen_minute: dir.join(FIFTEEN_MINUTE_STORE),
            canonical: dir.join(CANONICAL_STORE),
        }
    }
}

/// Configuration for the degenerate-data check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityGateConfig {
    /// How many of the most recent frames are inspected.
    pub window_frames: usize,

    /// Fraction of flagged pixels (0-1) at which the check fails.
    pub threshold: f64,

    /// Values checked in turn; each is a separate pass.
    pub flagged: Vec<FlaggedValue>,
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self {
            window_frames: 12,
            threshold: 0.5,
            flagged: vec![FlaggedValue::zero(), FlaggedValue::Missing],
        }
    }
}

impl QualityGateConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SAT_QUALITY_WINDOW_FRAMES") {
            if let Ok(frames) = val.parse() {
                config.window_frames = frames;
            }
        }

        if let Ok(val) = std::env::var("SAT_QUALITY_THRESHOLD") {
            if let Ok(threshold) = val.parse() {
                config.threshold = threshold;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.window_frames == 0 {
            return Err("quality window_frames must be > 0".to_string());
        }

        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err("quality threshold must be in (0, 1]".to_string());
        }

        Ok(())
    }
}

/// Configuration for a preprocessing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Raw and canonical store locations.
    pub paths: SourcePaths,

    /// How far the latest 5-minute frame may lag the issue time before the
    /// 15-minute source is used instead.
    pub staleness_tolerance_minutes: i64,

    /// Largest spacing between real frames that is bridged by interpolation.
    pub max_gap_minutes: i64,

    /// Degenerate-data check settings.
    pub quality: QualityGateConfig,

    /// Canonical store encoding.
    pub store: StoreConfig,
}

impl PipelineConfig {
    /// Create a configuration with default processing settings.
    ///
    /// The staleness tolerance has no default; it is deployment specific.
    pub fn new(paths: SourcePaths, staleness_tolerance_minutes: i64) -> Self {
        Self {
            paths,
            staleness_tolerance_minutes,
            max_gap_minutes: 15,
            quality: QualityGateConfig::default(),
            store: StoreConfig::default(),
        }
    }

    pub fn staleness_tolerance(&self) -> Duration {
        Duration::minutes(self.staleness_tolerance_minutes)
    }

    pub fn max_gap(&self) -> Duration {
        Duration::minutes(self.max_gap_minutes)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.staleness_tolerance_minutes < 0 {
            return Err("staleness_tolerance_minutes must be >= 0".to_string());
        }

        if self.max_gap_minutes < 0 {
            return Err("max_gap_minutes must be >= 0".to_string());
        }

        if self.paths.five_minute == self.paths.canonical
            || self.paths.fifteen_minute == self.paths.canonical
        {
            return Err("canonical store must not share a path with a raw store".to_string());
        }

        self.quality.validate()?;
        self.store.validate()?;

        Ok(())
    }
}
