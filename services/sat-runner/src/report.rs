//! Per-run availability report.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use sat_preprocess::{missing_timestamps, PreprocessOutcome, SourceDecision, SourceKind};
use serde::Serialize;

use crate::models::NamedModel;
use crate::staging::StagingReport;

/// Availability verdict for one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelAvailability {
    pub name: String,
    pub uses_satellite: bool,
    pub available: bool,
    /// Expected timestamps with no real frame.
    pub missing: Vec<DateTime<Utc>>,
}

/// Summary of one run, printed as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub t0: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging: Option<StagingReport>,
    pub decision: SourceDecision,
    pub source: SourceKind,
    pub canonical_path: PathBuf,
    pub frames: usize,
    pub first_time: Option<DateTime<Utc>>,
    pub last_time: Option<DateTime<Utc>>,
    pub observed_frames: usize,
    pub appended_frames: usize,
    pub models: Vec<ModelAvailability>,
}

impl RunReport {
    pub fn new(outcome: &PreprocessOutcome, staging: Option<StagingReport>, models: &[NamedModel]) -> Self {
        let models = models
            .iter()
            .map(|model| {
                let missing = model
                    .config
                    .satellite_requirement()
                    .map(|req| missing_timestamps(&req, outcome.t0, &outcome.observed_times))
                    .unwrap_or_default();
                ModelAvailability {
                    name: model.name.clone(),
                    uses_satellite: model.config.uses_satellite(),
                    available: outcome.model_config_available(&model.config),
                    missing,
                }
            })
            .collect();

        Self {
            t0: outcome.t0,
            staging,
            decision: outcome.selection.decision,
            source: outcome.selection.source,
            canonical_path: outcome.canonical_path.clone(),
            frames: outcome.summary.frames,
            first_time: outcome.summary.first_time,
            last_time: outcome.summary.last_time,
            observed_frames: outcome.observed_times.len(),
            appended_frames: outcome.appended_frames,
            models,
        }
    }

    /// Names of models that cannot run.
    pub fn unavailable_models(&self) -> Vec<&str> {
        self.models
            .iter()
            .filter(|m| !m.available)
            .map(|m| m.name.as_str())
            .collect()
    }
}
