//! Choice of the raw store that becomes the canonical store.
//!
//! The 5-minute source is preferred. The 15-minute source is used when it is
//! the only one present, or when the 5-minute data lags the issue time by more
//! than the staleness tolerance.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use sat_store::{copy_store, store_exists, SatelliteStore};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::SourcePaths;
use crate::error::{PreprocessError, Result};

/// One of the two raw sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    FiveMinute,
    FifteenMinute,
}

impl SourceKind {
    /// Cadence the source is acquired at.
    pub fn native_cadence(&self) -> Duration {
        match self {
            Self::FiveMinute => Duration::minutes(5),
            Self::FifteenMinute => Duration::minutes(15),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FiveMinute => "5_minute",
            Self::FifteenMinute => "15_minute",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of comparing the two sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceDecision {
    OnlyFiveMinute,
    OnlyFifteenMinute,
    /// Both present and the 5-minute data is fresh.
    BothFresh,
    /// Both present but the 5-minute data is stale.
    BothStaleFallback,
    Neither,
}

impl SourceDecision {
    /// Decide from what is on disk.
    ///
    /// `five_minute_latest` is `None` when the 5-minute store is absent and
    /// `Some(None)` when it exists but holds no frames; an empty store counts
    /// as stale. The 5-minute data is stale when `t0 - latest` exceeds
    /// `tolerance`; a lag exactly equal to the tolerance is fresh.
    pub fn classify(
        five_minute_latest: Option<Option<DateTime<Utc>>>,
        fifteen_minute_present: bool,
        t0: DateTime<Utc>,
        tolerance: Duration,
    ) -> Self {
        match (five_minute_latest, fifteen_minute_present) {
            (None, false) => Self::Neither,
            (None, true) => Self::OnlyFifteenMinute,
            (Some(_), false) => Self::OnlyFiveMinute,
            (Some(latest), true) => {
                let stale = latest.map_or(true, |latest| t0 - latest > tolerance);
                if stale {
                    Self::BothStaleFallback
                } else {
                    Self::BothFresh
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnlyFiveMinute => "only_5_minute",
            Self::OnlyFifteenMinute => "only_15_minute",
            Self::BothFresh => "both_fresh",
            Self::BothStaleFallback => "both_stale_fallback",
            Self::Neither => "neither",
        }
    }

    /// The source this decision selects.
    pub fn chosen(&self) -> Option<SourceKind> {
        match self {
            Self::OnlyFiveMinute | Self::BothFresh => Some(SourceKind::FiveMinute),
            Self::OnlyFifteenMinute | Self::BothStaleFallback => Some(SourceKind::FifteenMinute),
            Self::Neither => None,
        }
    }
}

/// Result of a successful selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub decision: SourceDecision,
    pub source: SourceKind,
    /// Path of the raw store that was copied.
    pub source_path: PathBuf,
    /// Latest 5-minute timestamp, when that store was present and non-empty.
    pub five_minute_latest: Option<DateTime<Utc>>,
}

/// Pick a raw store and copy it to the canonical location.
///
/// Any previous canonical store is replaced. Both raw stores are left in
/// place.
pub fn select_source(paths: &SourcePaths, t0: DateTime<Utc>, tolerance: Duration) -> Result<Selection> {
    let five_minute_latest = if store_exists(&paths.five_minute) {
        Some(SatelliteStore::open(&paths.five_minute)?.latest_time()?)
    } else {
        None
    };
    let fifteen_minute_present = store_exists(&paths.fifteen_minute);

    let decision = SourceDecision::classify(five_minute_latest, fifteen_minute_present, t0, tolerance);
    let Some(source) = decision.chosen() else {
        metrics::counter!("satellite_source_selected_total", "decision" => decision.as_str())
            .increment(1);
        return Err(PreprocessError::NoSatelliteSource {
            five_minute: paths.five_minute.clone(),
            fifteen_minute: paths.fifteen_minute.clone(),
        });
    };

    let latest = five_minute_latest.flatten();
    if decision == SourceDecision::BothStaleFallback {
        warn!(
            %t0,
            five_minute_latest = ?latest,
            tolerance_minutes = tolerance.num_minutes(),
            "5-minute satellite data is stale, using 15-minute data instead"
        );
    }

    let source_path = match source {
        SourceKind::FiveMinute => paths.five_minute.clone(),
        SourceKind::FifteenMinute => paths.fifteen_minute.clone(),
    };
    let bytes = copy_store(&source_path, &paths.canonical)?;

    info!(
        decision = decision.as_str(),
        source = %source,
        from = %source_path.display(),
        to = %paths.canonical.display(),
        bytes,
        "Selected satellite source"
    );
    metrics::counter!(
        "satellite_source_selected_total",
        "decision" => decision.as_str(),
        "source" => source.as_str()
    )
    .increment(1);

    Ok(Selection {
        decision,
        source,
        source_path,
        five_minute_latest: latest,
    })
}
