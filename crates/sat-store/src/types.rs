//! Core types for satellite stores.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::time::infer_cadence;

/// Name of the leading dimension of every `data` array.
pub const TIME_DIMENSION: &str = "time";

/// Default dimension names for a single-channel image stack.
pub fn default_dimensions() -> Vec<String> {
    vec![TIME_DIMENSION.to_string(), "y".to_string(), "x".to_string()]
}

/// How pixel values are stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", rename_all = "snake_case")]
pub enum DataEncoding {
    /// Plain 32-bit floats; missing pixels are NaN.
    Float32,
    /// Packed 16-bit integers: `value = raw * scale_factor + add_offset`.
    ScaledInt16 { scale_factor: f32, add_offset: f32 },
}

impl DataEncoding {
    /// Integer sentinel for a missing pixel in the packed encoding.
    pub const INT16_MISSING: i16 = i16::MIN;

    /// Pack a physical value.
    ///
    /// NaN maps to [`Self::INT16_MISSING`]; everything else is rounded and
    /// clamped to the representable range, never onto the sentinel.
    pub fn pack_i16(value: f32, scale_factor: f32, add_offset: f32) -> i16 {
        if value.is_nan() {
            return Self::INT16_MISSING;
        }
        let raw = ((value - add_offset) / scale_factor).round();
        raw.clamp(f32::from(i16::MIN + 1), f32::from(i16::MAX)) as i16
    }

    /// Unpack a stored integer.
    pub fn unpack_i16(raw: i16, scale_factor: f32, add_offset: f32) -> f32 {
        if raw == Self::INT16_MISSING {
            f32::NAN
        } else {
            f32::from(raw) * scale_factor + add_offset
        }
    }

    /// Short name used in logs and the consolidated summary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Float32 => "float32",
            Self::ScaledInt16 { .. } => "int16",
        }
    }
}

impl std::fmt::Display for DataEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stack of satellite frames held in memory.
///
/// Pixel values are stored frame after frame (time-major), each frame in
/// row-major order over the non-time dimensions. Missing pixels are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteDataset {
    times: Vec<DateTime<Utc>>,
    frame_shape: Vec<u64>,
    dimensions: Vec<String>,
    data: Vec<f32>,
}

impl SatelliteDataset {
    /// Create a dataset, checking that the pieces agree with each other.
    pub fn new(
        times: Vec<DateTime<Utc>>,
        frame_shape: Vec<u64>,
        dimensions: Vec<String>,
        data: Vec<f32>,
    ) -> Result<Self> {
        if dimensions.len() != frame_shape.len() + 1 {
            return Err(StoreError::invalid_layout(format!(
                "{} dimension names for a {}-D frame",
                dimensions.len(),
                frame_shape.len()
            )));
        }
        if dimensions[0] != TIME_DIMENSION {
            return Err(StoreError::invalid_layout(format!(
                "leading dimension must be '{}', found '{}'",
                TIME_DIMENSION, dimensions[0]
            )));
        }
        if frame_shape.is_empty() || frame_shape.contains(&0) {
            return Err(StoreError::invalid_layout(format!(
                "frame shape {:?} has no pixels",
                frame_shape
            )));
        }
        if let Some(pair) = times.windows(2).find(|pair| pair[1] <= pair[0]) {
            return Err(StoreError::invalid_layout(format!(
                "time axis is not strictly increasing at {}",
                pair[1]
            )));
        }

        let frame_len = frame_shape.iter().product::<u64>() as usize;
        if data.len() != times.len() * frame_len {
            return Err(StoreError::invalid_layout(format!(
                "expected {} values for {} frames, found {}",
                times.len() * frame_len,
                times.len(),
                data.len()
            )));
        }

        Ok(Self {
            times,
            frame_shape,
            dimensions,
            data,
        })
    }

    /// An empty dataset with the given frame layout.
    pub fn empty(frame_shape: Vec<u64>, dimensions: Vec<String>) -> Result<Self> {
        Self::new(Vec::new(), frame_shape, dimensions, Vec::new())
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn frame_shape(&self) -> &[u64] {
        &self.frame_shape
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Number of pixels in one frame.
    pub fn frame_len(&self) -> usize {
        self.frame_shape.iter().product::<u64>() as usize
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn first_time(&self) -> Option<DateTime<Utc>> {
        self.times.first().copied()
    }

    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.times.last().copied()
    }

    /// Pixel values of frame `index`.
    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        let len = self.frame_len();
        self.data.get(index * len..(index + 1) * len)
    }

    /// Iterate over `(time, pixels)` pairs.
    pub fn frames(&self) -> impl Iterator<Item = (DateTime<Utc>, &[f32])> {
        self.times
            .iter()
            .copied()
            .zip(self.data.chunks_exact(self.frame_len()))
    }

    /// Pixel values of the most recent `n` frames (fewer if the dataset is shorter).
    pub fn recent_data(&self, n: usize) -> &[f32] {
        let start = self.len().saturating_sub(n) * self.frame_len();
        &self.data[start..]
    }

    /// Append a frame after the current last timestamp.
    pub fn push_frame(&mut self, time: DateTime<Utc>, pixels: &[f32]) -> Result<()> {
        if pixels.len() != self.frame_len() {
            return Err(StoreError::invalid_layout(format!(
                "frame has {} pixels, expected {}",
                pixels.len(),
                self.frame_len()
            )));
        }
        if let Some(last) = self.last_time() {
            if time <= last {
                return Err(StoreError::invalid_layout(format!(
                    "cannot append {} after {}",
                    time, last
                )));
            }
        }
        self.times.push(time);
        self.data.extend_from_slice(pixels);
        Ok(())
    }

    /// Append an all-missing frame.
    pub fn push_missing_frame(&mut self, time: DateTime<Utc>) -> Result<()> {
        let pixels = vec![f32::NAN; self.frame_len()];
        self.push_frame(time, &pixels)
    }

    /// Drop every frame later than `t`, returning how many were removed.
    pub fn truncate_after(&mut self, t: DateTime<Utc>) -> usize {
        let keep = self.times.partition_point(|&time| time <= t);
        let removed = self.len() - keep;
        self.times.truncate(keep);
        self.data.truncate(keep * self.frame_len());
        removed
    }

    /// Whether every pixel of frame `index` is missing.
    pub fn is_frame_missing(&self, index: usize) -> bool {
        self.frame(index)
            .map(|pixels| pixels.iter().all(|v| v.is_nan()))
            .unwrap_or(true)
    }

    /// Timestamps of frames that carry at least one real pixel.
    pub fn observed_times(&self) -> Vec<DateTime<Utc>> {
        self.frames()
            .filter(|(_, pixels)| pixels.iter().any(|v| !v.is_nan()))
            .map(|(time, _)| time)
            .collect()
    }

    /// Most common spacing of the time axis.
    pub fn cadence(&self) -> Option<Duration> {
        infer_cadence(&self.times)
    }

    /// Build the consolidated summary for this dataset.
    pub fn summary(&self, encoding: DataEncoding) -> StoreSummary {
        StoreSummary {
            frames: self.len(),
            first_time: self.first_time(),
            last_time: self.last_time(),
            cadence_minutes: self.cadence().map(|d| d.num_minutes()),
            frame_shape: self.frame_shape.clone(),
            dimensions: self.dimensions.clone(),
            encoding,
        }
    }
}

/// Consolidated description of a store, kept in the root group attributes so
/// a store can be described without reading any chunk data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSummary {
    /// Number of frames on the time axis.
    pub frames: usize,
    /// First timestamp, if any.
    pub first_time: Option<DateTime<Utc>>,
    /// Last timestamp, if any.
    pub last_time: Option<DateTime<Utc>>,
    /// Most common frame spacing in minutes.
    pub cadence_minutes: Option<i64>,
    /// Shape of one frame (all dimensions after `time`).
    pub frame_shape: Vec<u64>,
    /// Dimension names, `time` first.
    pub dimensions: Vec<String>,
    /// On-disk encoding of `data`.
    pub encoding: DataEncoding,
}

impl StoreSummary {
    /// Serialize to JSON for the group attributes.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Deserialize from JSON.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }
}
