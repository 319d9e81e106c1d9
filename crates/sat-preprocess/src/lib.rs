//! Satellite input preparation for nowcasting.
//!
//! Turns one or two raw satellite stores into a single canonical store on a
//! regular 5-minute grid that reaches the forecast issue time, and decides for
//! each model whether enough real history exists to run it.
//!
//! # Components
//!
//! - [`selector`]: chooses between the 5-minute and 15-minute sources
//! - [`quality`]: rejects frames dominated by zeros or missing values
//! - [`regularize`]: reindexes onto the 5-minute grid, bridging short gaps
//! - [`freshness`]: pads the time axis up to the issue time
//! - [`availability`]: checks a model's history requirement
//! - [`pipeline`]: runs the above in order for one issue time
//!
//! # Example
//!
//! ```ignore
//! use sat_preprocess::{PipelineConfig, SatellitePipeline, SourcePaths};
//!
//! let config = PipelineConfig::new(SourcePaths::in_dir(Path::new("/data")), 120);
//! let outcome = SatellitePipeline::new(config)?.run(t0)?;
//! let ok = outcome.model_available(requirement.as_ref());
//! ```

pub mod availability;
pub mod config;
pub mod error;
pub mod freshness;
pub mod model_config;
pub mod pipeline;
pub mod quality;
pub mod regularize;
pub mod selector;

pub use availability::{is_available, missing_timestamps, AvailabilityRequirement};
pub use config::{
    PipelineConfig, QualityGateConfig, SourcePaths, CANONICAL_STORE, FIFTEEN_MINUTE_STORE,
    FIVE_MINUTE_STORE,
};
pub use error::{PreprocessError, Result};
pub use freshness::{extend_store, extend_to};
pub use model_config::{InputDataConfig, ModelInputConfig, SatelliteInputConfig};
pub use pipeline::{PreprocessOutcome, SatellitePipeline};
pub use quality::{
    check_flagged_values, check_quality, check_store_quality, flagged_fraction, FlaggedValue,
};
pub use regularize::{fillable_intervals, plan_grid, regularize, regularize_store, FillInterval, GridSource};
pub use selector::{select_source, Selection, SourceDecision, SourceKind};
