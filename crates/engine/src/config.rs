//! Engine configuration.
//!
//! Every section has defaults, so a partial (or empty) serialized config
//! deserializes into a usable one.

use crate::error::EngineError;
use data_loader::PreprocessConfig;
use recommenders::{CollaborativeConfig, ContentConfig, PopularityConfig};
use serde::{Deserialize, Serialize};

/// Tolerance for the hybrid weight sum check
const WEIGHT_SUM_TOLERANCE: f32 = 1e-6;

/// Hybrid blending settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    /// Weight of the collaborative list
    pub w_cf: f32,
    /// Weight of the content list
    pub w_content: f32,
    /// Ratings at or above this count as "liked"
    pub min_like: f32,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            w_cf: 0.6,
            w_content: 0.4,
            min_like: 4.0,
        }
    }
}

impl HybridConfig {
    pub fn with_weights(mut self, w_cf: f32, w_content: f32) -> Self {
        self.w_cf = w_cf;
        self.w_content = w_content;
        self
    }

    pub fn with_min_like(mut self, min_like: f32) -> Self {
        self.min_like = min_like;
        self
    }
}

/// Settings for every strategy the engine fits
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub popularity: PopularityConfig,
    pub content: ContentConfig,
    pub collaborative: CollaborativeConfig,
    pub hybrid: HybridConfig,
    pub preprocess: PreprocessConfig,
}

impl EngineConfig {
    /// Check the settings the individual `fit` calls do not check themselves.
    ///
    /// Hybrid weights must be finite, non-negative and sum to 1.
    pub fn validate(&self) -> Result<(), EngineError> {
        let HybridConfig {
            w_cf,
            w_content,
            min_like,
        } = self.hybrid;

        if !w_cf.is_finite() || !w_content.is_finite() || w_cf < 0.0 || w_content < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "hybrid weights must be finite and non-negative (w_cf = {w_cf}, w_content = {w_content})"
            )));
        }
        if ((w_cf + w_content) - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(EngineError::InvalidConfig(format!(
                "hybrid weights must sum to 1.0, got {}",
                w_cf + w_content
            )));
        }
        if !min_like.is_finite() {
            return Err(EngineError::InvalidConfig(format!(
                "min_like must be finite, got {min_like}"
            )));
        }

        let smoothing = self.popularity.smoothing;
        if !smoothing.is_finite() || smoothing < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "popularity smoothing must be finite and non-negative, got {smoothing}"
            )));
        }
        Ok(())
    }
}
