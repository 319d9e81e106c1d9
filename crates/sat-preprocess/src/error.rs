//! Error types for satellite preprocessing.

use std::path::PathBuf;

use sat_store::StoreError;
use thiserror::Error;

/// Errors that abort a preprocessing run.
///
/// Staleness fallbacks, unfillable gaps and insufficient history are not
/// errors; they surface as data (a [`crate::SourceDecision`], missing
/// timestamps, a `false` availability verdict).
#[derive(Error, Debug)]
pub enum PreprocessError {
    /// Neither raw store exists after download.
    #[error("no satellite data found at {} or {}", .five_minute.display(), .fifteen_minute.display())]
    NoSatelliteSource {
        five_minute: PathBuf,
        fifteen_minute: PathBuf,
    },

    /// The most recent frames are dominated by a flagged value.
    #[error(
        "satellite data quality check failed: {:.1}% of pixels in the last {} frames are {} (threshold {:.1}%)",
        .fraction * 100.0, .window_frames, .flagged, .threshold * 100.0
    )]
    DataQuality {
        flagged: String,
        fraction: f64,
        threshold: f64,
        window_frames: usize,
    },

    /// Store access failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invalid pipeline configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A model's input configuration could not be loaded.
    #[error("invalid model configuration: {0}")]
    ModelConfig(String),
}

/// Result type for preprocessing operations.
pub type Result<T> = std::result::Result<T, PreprocessError>;
