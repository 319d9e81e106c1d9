//! Read access to satellite stores.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use zarrs::array::{Array, DataType};
use zarrs::array_subset::ArraySubset;
use zarrs::group::Group;
use zarrs_filesystem::FilesystemStore;

use crate::error::{Result, StoreError};
use crate::fs::{reject_zipped, store_exists};
use crate::time::TimeUnits;
use crate::types::{DataEncoding, SatelliteDataset, StoreSummary, TIME_DIMENSION};
use crate::writer::{DATA_ARRAY, DIMENSIONS_ATTRIBUTE, SUMMARY_ATTRIBUTE, TIME_ARRAY};

/// An opened satellite store.
///
/// Opening reads only array metadata; pixel data is fetched on demand.
pub struct SatelliteStore {
    path: PathBuf,
    storage: Arc<FilesystemStore>,
    time: Array<FilesystemStore>,
    time_units: TimeUnits,
    data: Array<FilesystemStore>,
    encoding: DataEncoding,
    missing_value: i16,
    dimensions: Vec<String>,
}

impl SatelliteStore {
    /// Open the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        reject_zipped(path)?;
        if !store_exists(path) {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }

        let storage = Arc::new(FilesystemStore::new(path).map_err(StoreError::zarr)?);
        let time = Array::open(storage.clone(), TIME_ARRAY).map_err(StoreError::zarr)?;
        let data = Array::open(storage.clone(), DATA_ARRAY).map_err(StoreError::zarr)?;

        if time.shape().len() != 1 || !matches!(time.data_type(), DataType::Int64) {
            return Err(StoreError::invalid_layout("time must be a 1-D int64 array"));
        }
        let Some(units) = time.attributes().get("units").and_then(|v| v.as_str()) else {
            return Err(StoreError::invalid_layout("time array has no units attribute"));
        };
        let time_units = TimeUnits::parse(units)
            .map_err(|e| StoreError::invalid_layout(format!("time array: {}", e)))?;
        if data.shape().len() < 2 {
            return Err(StoreError::invalid_layout(
                "data must have a time dimension and at least one spatial dimension",
            ));
        }
        if data.shape()[0] != time.shape()[0] {
            return Err(StoreError::invalid_layout(format!(
                "data has {} frames but time has {} entries",
                data.shape()[0],
                time.shape()[0]
            )));
        }

        let attrs = data.attributes();
        let float_attr = |name: &str, default: f32| {
            attrs
                .get(name)
                .and_then(|v| v.as_f64())
                .map(|v| v as f32)
                .unwrap_or(default)
        };

        let encoding = match data.data_type() {
            DataType::Float32 => DataEncoding::Float32,
            DataType::Int16 => DataEncoding::ScaledInt16 {
                scale_factor: float_attr("scale_factor", 1.0),
                add_offset: float_attr("add_offset", 0.0),
            },
            other => {
                return Err(StoreError::invalid_layout(format!(
                    "unsupported data type {:?}",
                    other
                )))
            }
        };

        let missing_value = attrs
            .get("missing_value")
            .and_then(|v| v.as_i64())
            .and_then(|v| i16::try_from(v).ok())
            .unwrap_or(DataEncoding::INT16_MISSING);

        let dimensions = Self::dimension_names(attrs, data.shape().len())?;

        debug!(
            path = %path.display(),
            shape = ?data.shape(),
            encoding = %encoding,
            "Opened satellite store"
        );

        Ok(Self {
            path: path.to_path_buf(),
            storage,
            time,
            time_units,
            data,
            encoding,
            missing_value,
            dimensions,
        })
    }

    fn dimension_names(
        attrs: &serde_json::Map<String, serde_json::Value>,
        ndim: usize,
    ) -> Result<Vec<String>> {
        let Some(names) = attrs.get(DIMENSIONS_ATTRIBUTE).and_then(|v| v.as_array()) else {
            let mut names = vec![TIME_DIMENSION.to_string()];
            names.extend(["y", "x", "channel"].iter().take(ndim - 1).map(|s| s.to_string()));
            names.extend((names.len()..ndim).map(|i| format!("dim_{}", i)));
            return Ok(names);
        };

        let names: Vec<String> = names
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        if names.len() != ndim || names[0] != TIME_DIMENSION {
            return Err(StoreError::invalid_layout(format!(
                "dimension names {:?} do not match a {}-D (time, ...) array",
                names, ndim
            )));
        }
        Ok(names)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// On-disk encoding of the pixel data.
    pub fn encoding(&self) -> DataEncoding {
        self.encoding
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// Number of frames in the store.
    pub fn len(&self) -> usize {
        self.time.shape()[0] as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shape of one frame.
    pub fn frame_shape(&self) -> Vec<u64> {
        self.data.shape()[1..].to_vec()
    }

    /// Consolidated summary from the root group, if the store has one.
    pub fn summary(&self) -> Result<Option<StoreSummary>> {
        let group = Group::open(self.storage.clone(), "/").map_err(StoreError::zarr)?;
        group
            .attributes()
            .get(SUMMARY_ATTRIBUTE)
            .map(StoreSummary::from_json)
            .transpose()
    }

    /// The full time axis.
    pub fn times(&self) -> Result<Vec<DateTime<Utc>>> {
        self.read_times(0, self.len())
    }

    /// The last timestamp, reading only that element of the time array.
    pub fn latest_time(&self) -> Result<Option<DateTime<Utc>>> {
        let len = self.len();
        if len == 0 {
            return Ok(None);
        }
        Ok(self.read_times(len - 1, 1)?.pop())
    }

    fn read_times(&self, start: usize, count: usize) -> Result<Vec<DateTime<Utc>>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let subset = ArraySubset::new_with_start_shape(vec![start as u64], vec![count as u64])
            .map_err(StoreError::zarr)?;
        let values: Vec<i64> = self
            .time
            .retrieve_array_subset_elements(&subset)
            .map_err(StoreError::zarr)?;

        values
            .into_iter()
            .map(|v| {
                self.time_units.decode(v).ok_or_else(|| {
                    StoreError::invalid_layout(format!("time value {} is out of range", v))
                })
            })
            .collect()
    }

    /// Read every frame.
    pub fn read(&self) -> Result<SatelliteDataset> {
        self.read_frames(0, self.len())
    }

    /// Read only the most recent `n` frames.
    pub fn read_recent(&self, n: usize) -> Result<SatelliteDataset> {
        let count = n.min(self.len());
        self.read_frames(self.len() - count, count)
    }

    fn read_frames(&self, start: usize, count: usize) -> Result<SatelliteDataset> {
        let times = self.read_times(start, count)?;
        let frame_shape = self.frame_shape();

        let values = if count == 0 {
            Vec::new()
        } else {
            let mut subset_start = vec![0u64; frame_shape.len() + 1];
            subset_start[0] = start as u64;
            let mut subset_shape = vec![count as u64];
            subset_shape.extend_from_slice(&frame_shape);
            let subset = ArraySubset::new_with_start_shape(subset_start, subset_shape)
                .map_err(StoreError::zarr)?;

            match self.encoding {
                DataEncoding::Float32 => self
                    .data
                    .retrieve_array_subset_elements::<f32>(&subset)
                    .map_err(StoreError::zarr)?,
                DataEncoding::ScaledInt16 {
                    scale_factor,
                    add_offset,
                } => self
                    .data
                    .retrieve_array_subset_elements::<i16>(&subset)
                    .map_err(StoreError::zarr)?
                    .into_iter()
                    .map(|raw| {
                        if raw == self.missing_value {
                            f32::NAN
                        } else {
                            DataEncoding::unpack_i16(raw, scale_factor, add_offset)
                        }
                    })
                    .collect(),
            }
        };

        SatelliteDataset::new(times, frame_shape, self.dimensions.clone(), values)
    }
}
