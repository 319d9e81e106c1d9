//! Satellite Store Access with Zarr V3
//!
//! This crate reads and writes the on-disk satellite image stacks that the
//! preprocessing pipeline consumes and produces. A store is a Zarr V3
//! directory holding:
//!
//! - **`time`**: epoch seconds, strictly increasing
//! - **`data`**: `(time, y, x[, channel])` pixels, one chunk per frame,
//!   either `float32` or packed `int16` with a stated scale
//! - **root group attributes**: a consolidated [`StoreSummary`] for fast reopen
//!
//! # Architecture
//!
//! ```text
//! raw store ──► SatelliteStore::read() ──► SatelliteDataset (f32, NaN = missing)
//!                                                │
//!                                          transformations
//!                                                │
//!                                                ▼
//!               StoreWriter::write() ──► <path>.partial ──► rename ──► <path>
//! ```
//!
//! # Example
//!
//! ```ignore
//! use sat_store::{SatelliteStore, StoreConfig, StoreWriter};
//!
//! let store = SatelliteStore::open(Path::new("sat.zarr"))?;
//! let dataset = store.read()?;
//!
//! let config = StoreConfig::default();
//! let encoding = config.canonical_encoding(store.encoding());
//! StoreWriter::new(config).write(Path::new("sat.zarr"), &dataset, encoding)?;
//! ```

pub mod config;
pub mod error;
pub mod fs;
pub mod reader;
pub mod time;
pub mod types;
pub mod writer;

// Re-export commonly used types at crate root
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use fs::{copy_store, reject_zipped, remove_store, store_exists, PartialStore};
pub use reader::SatelliteStore;
pub use time::{
    canonical_cadence, ceil_to_grid, floor_to_grid, grid_range, infer_cadence, is_on_grid,
    parse_time, TimeParseError, TimeUnits, CANONICAL_CADENCE_MINUTES,
};
pub use types::{default_dimensions, DataEncoding, SatelliteDataset, StoreSummary, TIME_DIMENSION};
pub use writer::StoreWriter;
