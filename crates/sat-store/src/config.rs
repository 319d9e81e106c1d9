//! Configuration for writing satellite stores.

use serde::{Deserialize, Serialize};

use crate::types::DataEncoding;

/// Configuration for satellite store output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Physical value of one integer step when canonical output is forced to
    /// packed `int16`. `None` keeps the encoding of the source store.
    pub scale_factor: Option<f32>,

    /// Physical value of integer zero when `scale_factor` is set.
    pub add_offset: f32,

    /// Chunk length of the 1-D `time` array.
    pub time_chunk: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            scale_factor: None,
            add_offset: 0.0,
            time_chunk: 1024,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SAT_SCALE_FACTOR") {
            if let Ok(scale) = val.parse() {
                config.scale_factor = Some(scale);
            }
        }

        if let Ok(val) = std::env::var("SAT_ADD_OFFSET") {
            if let Ok(offset) = val.parse() {
                config.add_offset = offset;
            }
        }

        if let Ok(val) = std::env::var("SAT_TIME_CHUNK") {
            if let Ok(chunk) = val.parse() {
                config.time_chunk = chunk;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(scale) = self.scale_factor {
            if !scale.is_finite() || scale <= 0.0 {
                return Err("scale_factor must be a positive finite number".to_string());
            }
        }

        if !self.add_offset.is_finite() {
            return Err("add_offset must be finite".to_string());
        }

        if self.time_chunk == 0 {
            return Err("time_chunk must be > 0".to_string());
        }

        Ok(())
    }

    /// Encoding for a canonical store derived from a store in `source`.
    ///
    /// An explicit `scale_factor` packs the output into `int16` with that
    /// scale; otherwise the source encoding, including its scale, is kept.
    pub fn canonical_encoding(&self, source: DataEncoding) -> DataEncoding {
        match self.scale_factor {
            Some(scale_factor) => DataEncoding::ScaledInt16 {
                scale_factor,
                add_offset: self.add_offset,
            },
            None => source,
        }
    }
}
