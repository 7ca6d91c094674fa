//! Service configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config:
//!
//! ```json
//! {
//!   "predictor": { "min_records": 10, "test_ratio": 0.2, "seed": 42, "price_floor": 10000.0 },
//!   "recommender": { "min_records": 5, "max_neighbors": 6, "similar_per_favorite": 3 }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Fewest usable records a training run accepts.
    pub min_records: usize,
    /// Share of records held out for candidate comparison.
    pub test_ratio: f64,
    /// Seed for the held-out split and the random forest.
    pub seed: u64,
    /// Lowest price `predict` ever returns.
    pub price_floor: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            min_records: 10,
            test_ratio: 0.2,
            seed: 42,
            price_floor: 10_000.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    pub min_records: usize,
    /// Upper bound on neighbors fetched per query; the index uses
    /// `min(max_neighbors, record count)`.
    pub max_neighbors: usize,
    /// Similar listings taken per favorite in personalised recommendations.
    pub similar_per_favorite: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            min_records: 5,
            max_neighbors: 6,
            similar_per_favorite: 3,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlConfig {
    pub predictor: PredictorConfig,
    pub recommender: RecommenderConfig,
}

impl MlConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.predictor;
        if p.min_records < 2 {
            return Err(ConfigError::Invalid(format!(
                "predictor.min_records must be at least 2, got {}",
                p.min_records
            )));
        }
        if !(p.test_ratio > 0.0 && p.test_ratio < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "predictor.test_ratio must be in (0, 1), got {}",
                p.test_ratio
            )));
        }
        if !p.price_floor.is_finite() || p.price_floor < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "predictor.price_floor must be a non-negative number, got {}",
                p.price_floor
            )));
        }

        let r = &self.recommender;
        if r.min_records == 0 || r.max_neighbors < 2 {
            return Err(ConfigError::Invalid(
                "recommender.min_records must be positive and max_neighbors at least 2"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
