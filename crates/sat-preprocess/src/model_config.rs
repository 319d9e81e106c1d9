//! Model input configuration.
//!
//! Each model describes the satellite history it consumes in a YAML file:
//!
//! ```yaml
//! input_data:
//!   satellite:
//!     history_minutes: 90
//!     time_resolution_minutes: 5
//!     live_delay_minutes: 30
//!     dropout_timedeltas_minutes: [-30]
//!     dropout_fraction: 1.0
//! ```
//!
//! A model without a `satellite` section does not use satellite data.

use std::fs;
use std::path::Path;

use chrono::Duration;
use serde::Deserialize;
use tracing::debug;

use crate::availability::AvailabilityRequirement;
use crate::error::{PreprocessError, Result};

/// Top level of a model input file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModelInputConfig {
    #[serde(default)]
    pub input_data: InputDataConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InputDataConfig {
    #[serde(default)]
    pub satellite: Option<SatelliteInputConfig>,
}

/// Satellite section of a model input file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SatelliteInputConfig {
    pub history_minutes: i64,

    #[serde(default = "default_time_resolution")]
    pub time_resolution_minutes: i64,

    /// How long after acquisition frames usually become available.
    #[serde(default)]
    pub live_delay_minutes: i64,

    /// Offsets (non-positive) at which the model was trained with simulated
    /// outages.
    #[serde(default)]
    pub dropout_timedeltas_minutes: Vec<i64>,

    /// Share of training samples that had a dropout applied.
    #[serde(default)]
    pub dropout_fraction: f64,
}

fn default_time_resolution() -> i64 {
    5
}

impl SatelliteInputConfig {
    /// Delay the model tolerates at inference time.
    ///
    /// A model trained with dropouts tolerates data ending as early as its
    /// largest dropout offset, so that offset replaces a shorter live delay.
    pub fn effective_delay_minutes(&self) -> i64 {
        let dropout = if self.dropout_fraction > 0.0 {
            self.dropout_timedeltas_minutes
                .iter()
                .map(|m| m.abs())
                .max()
                .unwrap_or(0)
        } else {
            0
        };
        self.live_delay_minutes.max(dropout)
    }

    fn validate(&self) -> Result<()> {
        if self.history_minutes <= 0 {
            return Err(PreprocessError::ModelConfig(
                "satellite history_minutes must be > 0".to_string(),
            ));
        }
        if self.time_resolution_minutes <= 0 {
            return Err(PreprocessError::ModelConfig(
                "satellite time_resolution_minutes must be > 0".to_string(),
            ));
        }
        if self.live_delay_minutes < 0 {
            return Err(PreprocessError::ModelConfig(
                "satellite live_delay_minutes must be >= 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.dropout_fraction) {
            return Err(PreprocessError::ModelConfig(
                "satellite dropout_fraction must be in [0, 1]".to_string(),
            ));
        }
        Ok(())
    }

    pub fn requirement(&self) -> AvailabilityRequirement {
        AvailabilityRequirement::new(
            Duration::minutes(self.history_minutes),
            Duration::minutes(self.time_resolution_minutes),
        )
        .with_live_delay(Duration::minutes(self.effective_delay_minutes()))
    }
}

impl ModelInputConfig {
    /// Parse and validate a model input file's contents.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(contents)
            .map_err(|e| PreprocessError::ModelConfig(e.to_string()))?;
        if let Some(satellite) = &config.input_data.satellite {
            satellite.validate()?;
        }
        Ok(config)
    }

    /// Load a model input file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            PreprocessError::ModelConfig(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml_str(&contents).map_err(|e| match e {
            PreprocessError::ModelConfig(msg) => {
                PreprocessError::ModelConfig(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        debug!(path = %path.display(), uses_satellite = config.uses_satellite(), "Loaded model input config");
        Ok(config)
    }

    pub fn uses_satellite(&self) -> bool {
        self.input_data.satellite.is_some()
    }

    /// Satellite requirement, or `None` when the model takes no satellite input.
    pub fn satellite_requirement(&self) -> Option<AvailabilityRequirement> {
        self.input_data
            .satellite
            .as_ref()
            .map(SatelliteInputConfig::requirement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_section() {
        let yaml = r#"
input_data:
  satellite:
    history_minutes: 90
    time_resolution_minutes: 5
    live_delay_minutes: 30
"#;
        let config = ModelInputConfig::from_yaml_str(yaml).unwrap();
        let req = config.satellite_requirement().unwrap();
        assert_eq!(req.history, Duration::minutes(90));
        assert_eq!(req.cadence, Duration::minutes(5));
        assert_eq!(req.live_delay, Duration::minutes(30));
    }

    #[test]
    fn test_defaults() {
        let yaml = "input_data:\n  satellite:\n    history_minutes: 60\n";
        let config = ModelInputConfig::from_yaml_str(yaml).unwrap();
        let req = config.satellite_requirement().unwrap();
        assert_eq!(req.cadence, Duration::minutes(5));
        assert_eq!(req.live_delay, Duration::zero());
    }

    #[test]
    fn test_no_satellite_section() {
        let config = ModelInputConfig::from_yaml_str("input_data:\n  nwp: {}\n").unwrap();
        assert!(!config.uses_satellite());
        assert!(config.satellite_requirement().is_none());
    }

    #[test]
    fn test_dropout_extends_delay() {
        let section = SatelliteInputConfig {
            history_minutes: 90,
            time_resolution_minutes: 5,
            live_delay_minutes: 15,
            dropout_timedeltas_minutes: vec![-30, -45],
            dropout_fraction: 1.0,
        };
        assert_eq!(section.effective_delay_minutes(), 45);

        let unused = SatelliteInputConfig {
            dropout_fraction: 0.0,
            ..section
        };
        assert_eq!(unused.effective_delay_minutes(), 15);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let yaml = "input_data:\n  satellite:\n    history_minutes: 0\n";
        assert!(matches!(
            ModelInputConfig::from_yaml_str(yaml),
            Err(PreprocessError::ModelConfig(_))
        ));
        assert!(ModelInputConfig::from_yaml_str("input_data: [").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pvnet.yaml");
        fs::write(&path, "input_data:\n  satellite:\n    history_minutes: 30\n").unwrap();
        let config = ModelInputConfig::from_file(&path).unwrap();
        assert!(config.uses_satellite());

        let err = ModelInputConfig::from_file(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(err.to_string().contains("missing.yaml"));
    }
}
