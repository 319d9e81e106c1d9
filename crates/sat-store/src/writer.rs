//! Zarr V3 writer for satellite stores.
//!
//! A store is written as a root group carrying the consolidated
//! [`StoreSummary`], a 1-D `time` array of epoch seconds and a `data` array
//! chunked one frame per chunk.

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::GroupBuilder;
use zarrs::storage::{ReadableStorageTraits, WritableStorageTraits};
use zarrs_filesystem::FilesystemStore;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::fs::PartialStore;
use crate::time::to_epoch_seconds;
use crate::types::{DataEncoding, SatelliteDataset, StoreSummary};

/// Path of the time coordinate array inside a store.
pub const TIME_ARRAY: &str = "/time";
/// Path of the pixel array inside a store.
pub const DATA_ARRAY: &str = "/data";
/// Group attribute holding the consolidated summary.
pub const SUMMARY_ATTRIBUTE: &str = "satellite";
/// Units of the stored time coordinate.
pub const TIME_UNITS: &str = "seconds since 1970-01-01T00:00:00Z";
/// Attribute naming the dimensions of an array.
pub const DIMENSIONS_ATTRIBUTE: &str = "_ARRAY_DIMENSIONS";

/// Writer for satellite stores on the local filesystem.
pub struct StoreWriter {
    config: StoreConfig,
}

impl StoreWriter {
    /// Create a new StoreWriter with the given configuration.
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Write `dataset` to a store at `path`, replacing any existing store.
    ///
    /// The new store is assembled beside `path` and only swapped in once it is
    /// complete, so on error the previous store is left untouched.
    pub fn write(
        &self,
        path: &Path,
        dataset: &SatelliteDataset,
        encoding: DataEncoding,
    ) -> Result<StoreSummary> {
        let staging = PartialStore::begin(path)?;
        let store = FilesystemStore::new(staging.path()).map_err(StoreError::zarr)?;
        let summary = self.write_to(store, dataset, encoding)?;
        staging.commit()?;

        info!(
            path = %path.display(),
            frames = summary.frames,
            encoding = %encoding,
            first_time = ?summary.first_time,
            last_time = ?summary.last_time,
            "Wrote satellite store"
        );
        Ok(summary)
    }

    /// Write `dataset` into an empty storage backend.
    pub fn write_to<S: ReadableStorageTraits + WritableStorageTraits + 'static>(
        &self,
        storage: S,
        dataset: &SatelliteDataset,
        encoding: DataEncoding,
    ) -> Result<StoreSummary> {
        let store = Arc::new(storage);
        let summary = dataset.summary(encoding);

        let mut attrs = serde_json::Map::new();
        attrs.insert(SUMMARY_ATTRIBUTE.to_string(), summary.to_json());
        let group = GroupBuilder::new()
            .attributes(attrs)
            .build(store.clone(), "/")
            .map_err(StoreError::zarr)?;
        group.store_metadata().map_err(StoreError::zarr)?;

        self.write_time(store.clone(), dataset)?;
        self.write_data(store, dataset, encoding)?;

        Ok(summary)
    }

    fn write_time<S: ReadableStorageTraits + WritableStorageTraits + 'static>(
        &self,
        store: Arc<S>,
        dataset: &SatelliteDataset,
    ) -> Result<()> {
        let len = dataset.len() as u64;

        let mut attrs = serde_json::Map::new();
        attrs.insert("units".to_string(), serde_json::json!(TIME_UNITS));
        attrs.insert(DIMENSIONS_ATTRIBUTE.to_string(), serde_json::json!(["time"]));

        let chunk_grid: zarrs::array::ChunkGrid = vec![self.config.time_chunk.max(1) as u64]
            .try_into()
            .map_err(|e| StoreError::Config(format!("{:?}", e)))?;

        let array = ArrayBuilder::new(vec![len], DataType::Int64, chunk_grid, FillValue::from(0i64))
            .attributes(attrs)
            .build(store, TIME_ARRAY)
            .map_err(StoreError::zarr)?;
        array.store_metadata().map_err(StoreError::zarr)?;

        if len > 0 {
            let seconds: Vec<i64> = dataset.times().iter().map(|t| to_epoch_seconds(*t)).collect();
            let subset = ArraySubset::new_with_start_shape(vec![0], vec![len])
                .map_err(StoreError::zarr)?;
            array
                .store_array_subset_elements(&subset, &seconds)
                .map_err(StoreError::zarr)?;
        }

        Ok(())
    }

    fn write_data<S: ReadableStorageTraits + WritableStorageTraits + 'static>(
        &self,
        store: Arc<S>,
        dataset: &SatelliteDataset,
        encoding: DataEncoding,
    ) -> Result<()> {
        let mut shape = vec![dataset.len() as u64];
        shape.extend_from_slice(dataset.frame_shape());

        // One chunk per frame.
        let mut chunk_shape = vec![1u64];
        chunk_shape.extend_from_slice(dataset.frame_shape());
        let chunk_grid: zarrs::array::ChunkGrid = chunk_shape
            .try_into()
            .map_err(|e| StoreError::Config(format!("{:?}", e)))?;

        let mut attrs = serde_json::Map::new();
        attrs.insert(
            DIMENSIONS_ATTRIBUTE.to_string(),
            serde_json::json!(dataset.dimensions()),
        );

        let (data_type, fill_value) = match encoding {
            DataEncoding::Float32 => (DataType::Float32, FillValue::from(f32::NAN)),
            DataEncoding::ScaledInt16 {
                scale_factor,
                add_offset,
            } => {
                attrs.insert("scale_factor".to_string(), serde_json::json!(scale_factor));
                attrs.insert("add_offset".to_string(), serde_json::json!(add_offset));
                attrs.insert(
                    "missing_value".to_string(),
                    serde_json::json!(DataEncoding::INT16_MISSING),
                );
                (
                    DataType::Int16,
                    FillValue::from(DataEncoding::INT16_MISSING),
                )
            }
        };

        let array = ArrayBuilder::new(shape.clone(), data_type, chunk_grid, fill_value)
            .attributes(attrs)
            .build(store, DATA_ARRAY)
            .map_err(StoreError::zarr)?;
        array.store_metadata().map_err(StoreError::zarr)?;

        if dataset.is_empty() {
            return Ok(());
        }

        let subset = ArraySubset::new_with_start_shape(vec![0; shape.len()], shape)
            .map_err(StoreError::zarr)?;

        match encoding {
            DataEncoding::Float32 => array
                .store_array_subset_elements(&subset, dataset.data())
                .map_err(StoreError::zarr)?,
            DataEncoding::ScaledInt16 {
                scale_factor,
                add_offset,
            } => {
                let packed: Vec<i16> = dataset
                    .data()
                    .iter()
                    .map(|&v| DataEncoding::pack_i16(v, scale_factor, add_offset))
                    .collect();
                array
                    .store_array_subset_elements(&subset, &packed)
                    .map_err(StoreError::zarr)?
            }
        }

        Ok(())
    }
}
