//! Runner configuration.

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use sat_preprocess::{PipelineConfig, QualityGateConfig, SourcePaths};
use sat_store::{canonical_cadence, floor_to_grid, StoreConfig};

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Forecast issue time.
    pub t0: DateTime<Utc>,

    /// Directory holding the raw and canonical stores.
    pub work_dir: PathBuf,

    /// Directory the raw stores are staged from, if staging is wanted.
    pub upstream_dir: Option<PathBuf>,

    /// Directory of model input YAML files.
    pub models_dir: Option<PathBuf>,

    /// Where to write the JSON report in addition to stdout.
    pub report_path: Option<PathBuf>,

    pub pipeline: PipelineConfig,
}

impl RunnerConfig {
    /// Build a configuration for `work_dir`, taking processing settings from
    /// the environment.
    pub fn new(t0: DateTime<Utc>, work_dir: PathBuf, staleness_tolerance_minutes: i64) -> Self {
        let mut pipeline =
            PipelineConfig::new(SourcePaths::in_dir(&work_dir), staleness_tolerance_minutes);
        pipeline.quality = QualityGateConfig::from_env();
        pipeline.store = StoreConfig::from_env();

        Self {
            t0,
            work_dir,
            upstream_dir: None,
            models_dir: None,
            report_path: None,
            pipeline,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if let Some(upstream) = &self.upstream_dir {
            if upstream == &self.work_dir {
                bail!("upstream directory must differ from the work directory");
            }
        }

        if let Err(e) = self.pipeline.validate() {
            bail!("invalid pipeline configuration: {}", e);
        }

        Ok(())
    }
}

/// Issue time used when none is given: now, floored to the 5-minute grid.
pub fn default_t0(now: DateTime<Utc>) -> DateTime<Utc> {
    floor_to_grid(now, canonical_cadence())
}
