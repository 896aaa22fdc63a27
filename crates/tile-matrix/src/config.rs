//! Configuration for tile matrix set construction.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, TileMatrixError};
use crate::iteration::IterationPolicy;

/// Defaults applied to a [`crate::TileMatrixSetBuilder`] before any explicit setter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Tile size in cells on the first two axes. Further axes default to 1.
    pub tile_size: u32,

    /// Ratio between the scales of consecutive levels.
    pub scale_factor: f64,

    /// Bottom-to-top iteration stops before a level where every axis has
    /// fewer tiles than this.
    pub nb_tile_threshold: u64,

    /// How the sequence of scales is generated.
    pub iteration: IterationPolicy,

    /// Relative tolerance for scale comparisons and tile count rounding.
    pub epsilon: f64,

    /// Hard cap on the number of generated levels.
    pub max_levels: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            tile_size: 256,
            scale_factor: 2.0,
            nb_tile_threshold: 1,
            iteration: IterationPolicy::TopToBottomExtrapolate,
            epsilon: 1e-9,
            max_levels: 64,
        }
    }
}

impl BuilderConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("TMS_TILE_SIZE") {
            if let Ok(size) = val.parse() {
                config.tile_size = size;
            }
        }

        if let Ok(val) = std::env::var("TMS_SCALE_FACTOR") {
            if let Ok(factor) = val.parse() {
                config.scale_factor = factor;
            }
        }

        if let Ok(val) = std::env::var("TMS_NB_TILE_THRESHOLD") {
            if let Ok(threshold) = val.parse() {
                config.nb_tile_threshold = threshold;
            }
        }

        if let Ok(val) = std::env::var("TMS_ITERATION") {
            match val.parse() {
                Ok(policy) => config.iteration = policy,
                Err(e) => warn!(value = %val, error = %e, "Ignoring TMS_ITERATION"),
            }
        }

        if let Ok(val) = std::env::var("TMS_EPSILON") {
            if let Ok(epsilon) = val.parse() {
                config.epsilon = epsilon;
            }
        }

        if let Ok(val) = std::env::var("TMS_MAX_LEVELS") {
            if let Ok(levels) = val.parse() {
                config.max_levels = levels;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(TileMatrixError::invalid_config("tile_size must be > 0"));
        }

        validate_scale_factor(self.scale_factor)?;

        if self.nb_tile_threshold == 0 {
            return Err(TileMatrixError::invalid_config(
                "nb_tile_threshold must be >= 1",
            ));
        }

        validate_epsilon(self.epsilon)?;

        if self.max_levels == 0 {
            return Err(TileMatrixError::invalid_config("max_levels must be >= 1"));
        }

        Ok(())
    }
}

pub(crate) fn validate_scale_factor(factor: f64) -> Result<()> {
    if !factor.is_finite() || factor <= 1.0 {
        return Err(TileMatrixError::invalid_config(format!(
            "scale_factor must be a finite number > 1, got {}",
            factor
        )));
    }
    Ok(())
}

pub(crate) fn validate_epsilon(epsilon: f64) -> Result<()> {
    if !epsilon.is_finite() || !(0.0..0.5).contains(&epsilon) {
        return Err(TileMatrixError::invalid_config(format!(
            "epsilon must be in [0, 0.5), got {}",
            epsilon
        )));
    }
    Ok(())
}

/// Tolerances used when merging grid geometries into one tiling scheme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileOptions {
    /// Relative tolerance on the linear part of the grid-to-CRS transforms.
    pub scale_tolerance: f64,

    /// Maximum distance, in cells, between a grid origin and the nearest
    /// integer offset.
    pub offset_tolerance: f64,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            scale_tolerance: 1e-9,
            offset_tolerance: 1e-6,
        }
    }
}

impl ReconcileOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.scale_tolerance.is_finite() || self.scale_tolerance < 0.0 {
            return Err(TileMatrixError::invalid_config(
                "scale_tolerance must be finite and >= 0",
            ));
        }
        if !self.offset_tolerance.is_finite() || !(0.0..0.5).contains(&self.offset_tolerance) {
            return Err(TileMatrixError::invalid_config(
                "offset_tolerance must be in [0, 0.5)",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = BuilderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tile_size, 256);
        assert_eq!(config.iteration, IterationPolicy::TopToBottomExtrapolate);
    }

    #[test]
    fn test_validate_rejects_bad_factor() {
        let config = BuilderConfig {
            scale_factor: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TileMatrixError::InvalidConfiguration(_))
        ));

        let config = BuilderConfig {
            scale_factor: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let config = BuilderConfig {
            nb_tile_threshold: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: BuilderConfig =
            serde_json::from_str(r#"{"tile_size": 512, "iteration": "bottom-to-top"}"#).unwrap();
        assert_eq!(config.tile_size, 512);
        assert_eq!(config.iteration, IterationPolicy::BottomToTop);
        assert!((config.scale_factor - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_reconcile_options() {
        assert!(ReconcileOptions::default().validate().is_ok());
        let options = ReconcileOptions {
            offset_tolerance: 0.5,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }
}
