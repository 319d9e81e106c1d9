//! One preprocessing run for a single forecast issue time.
//!
//! ```text
//! select_source ──► read canonical ──► observed times ──► quality gate
//!                                                              │
//!     write canonical ◄── extend_to(t0) ◄── truncate_after(t0) ◄── regularize
//! ```

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use sat_store::{SatelliteStore, StoreSummary, StoreWriter};
use serde::Serialize;
use tracing::{info, warn};

use crate::availability::{is_available, AvailabilityRequirement};
use crate::config::PipelineConfig;
use crate::error::{PreprocessError, Result};
use crate::freshness::extend_to;
use crate::model_config::ModelInputConfig;
use crate::quality::check_quality;
use crate::regularize::regularize;
use crate::selector::{select_source, Selection};

/// What a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessOutcome {
    pub t0: DateTime<Utc>,
    /// The store downstream steps read.
    pub canonical_path: PathBuf,
    pub selection: Selection,
    /// Timestamps of real frames before any repair, used for availability.
    pub observed_times: Vec<DateTime<Utc>>,
    /// Frames dropped for lying after `t0`.
    pub truncated_frames: usize,
    /// Missing frames appended to reach `t0`.
    pub appended_frames: usize,
    /// Summary of the canonical store as written.
    pub summary: StoreSummary,
}

impl PreprocessOutcome {
    /// Whether a model with `requirement` can run; `None` means the model has
    /// no satellite input and is always available.
    pub fn model_available(&self, requirement: Option<&AvailabilityRequirement>) -> bool {
        match requirement {
            Some(requirement) => is_available(requirement, self.t0, &self.observed_times),
            None => true,
        }
    }

    /// [`Self::model_available`] for a loaded model input file.
    pub fn model_config_available(&self, model: &ModelInputConfig) -> bool {
        self.model_available(model.satellite_requirement().as_ref())
    }
}

/// Runs every preprocessing step over the configured stores.
#[derive(Debug, Clone)]
pub struct SatellitePipeline {
    config: PipelineConfig,
}

impl SatellitePipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate().map_err(PreprocessError::InvalidConfig)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Produce the canonical store for issue time `t0`.
    ///
    /// Fails only when no raw store exists, when the data is degenerate, or on
    /// I/O errors. A failed run may leave the selected raw copy at the
    /// canonical path but never a half-written store.
    pub fn run(&self, t0: DateTime<Utc>) -> Result<PreprocessOutcome> {
        let paths = &self.config.paths;
        info!(%t0, canonical = %paths.canonical.display(), "Starting satellite preprocessing");

        let selection = select_source(paths, t0, self.config.staleness_tolerance())?;

        let store = SatelliteStore::open(&paths.canonical)?;
        let encoding = self.config.store.canonical_encoding(store.encoding());
        let raw = store.read()?;
        drop(store);
        let observed_times = raw.observed_times();

        check_quality(&raw, &self.config.quality)?;

        let mut dataset = regularize(&raw, self.config.max_gap())?;
        drop(raw);

        let truncated_frames = dataset.truncate_after(t0);
        if truncated_frames > 0 {
            warn!(%t0, truncated_frames, "Dropped satellite frames later than the issue time");
        }

        let appended_frames = extend_to(&mut dataset, t0)?;

        let summary =
            StoreWriter::new(self.config.store.clone()).write(&paths.canonical, &dataset, encoding)?;

        info!(
            %t0,
            source = %selection.source,
            observed = observed_times.len(),
            frames = summary.frames,
            appended_frames,
            "Satellite preprocessing complete"
        );

        Ok(PreprocessOutcome {
            t0,
            canonical_path: paths.canonical.clone(),
            selection,
            observed_times,
            truncated_frames,
            appended_frames,
            summary,
        })
    }
}
