//! Queue configuration.
//!
//! Capacity limits and thresholds default to the clinic's standing policy and
//! can be overridden from a TOML file:
//!
//! ```toml
//! emergency_capacity = 10
//! senior_capacity = 15
//! regular_capacity = 25
//! total_capacity = 50
//! senior_age = 75
//! warning_threshold = 0.80
//! critical_threshold = 0.95
//! reject_duplicate_names = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::MAX_AGE;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Queue limits and classification thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum waiting emergency patients
    pub emergency_capacity: usize,
    /// Maximum waiting senior patients
    pub senior_capacity: usize,
    /// Maximum waiting regular patients
    pub regular_capacity: usize,
    /// Maximum waiting patients across all tiers
    pub total_capacity: usize,
    /// Minimum age for the senior tier
    pub senior_age: u32,
    /// Fill ratio at which a queue is reported as near capacity
    pub warning_threshold: f64,
    /// Fill ratio at which a queue is reported as critical
    pub critical_threshold: f64,
    /// Refuse intake when a waiting patient already has the same name
    pub reject_duplicate_names: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            emergency_capacity: 10,
            senior_capacity: 15,
            regular_capacity: 25,
            total_capacity: 50,
            senior_age: 75,
            warning_threshold: 0.80,
            critical_threshold: 0.95,
            reject_duplicate_names: false,
        }
    }
}

impl QueueConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: QueueConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded queue config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Check limits and thresholds for consistency.
    pub fn validate(&self) -> ConfigResult<()> {
        for (field, value) in [
            ("emergency_capacity", self.emergency_capacity),
            ("senior_capacity", self.senior_capacity),
            ("regular_capacity", self.regular_capacity),
            ("total_capacity", self.total_capacity),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be greater than 0", field)));
            }
        }

        if self.senior_age > MAX_AGE {
            return Err(ConfigError::Invalid(format!(
                "senior_age must be at most {}",
                MAX_AGE
            )));
        }

        let in_unit = |v: f64| v > 0.0 && v <= 1.0;
        if !in_unit(self.warning_threshold) || !in_unit(self.critical_threshold) {
            return Err(ConfigError::Invalid(
                "thresholds must be within (0, 1]".into(),
            ));
        }
        if self.warning_threshold > self.critical_threshold {
            return Err(ConfigError::Invalid(
                "warning_threshold must not exceed critical_threshold".into(),
            ));
        }

        Ok(())
    }
}
