//! Editor configuration.

use crate::snap::{GRID_SIZE, Snapper};
use crate::viewport::{RESIZE_DEBOUNCE, SIZE_CHANGE_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Grid size must be a positive finite number, got {0}")]
    GridSize(f64),
    #[error("Resize threshold must be finite and non-negative, got {0}")]
    Threshold(f64),
}

/// Settings for one editor session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Grid cell size in canvas units.
    pub grid_size: f64,
    pub snap_to_grid: bool,
    /// Fit content into the container on resize.
    pub auto_fit: bool,
    /// Quiet period before a container resize is applied.
    pub resize_debounce_ms: u64,
    /// Minimum container size change (either axis) that triggers a recompute.
    pub resize_threshold: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            snap_to_grid: true,
            auto_fit: true,
            resize_debounce_ms: RESIZE_DEBOUNCE.as_millis() as u64,
            resize_threshold: SIZE_CHANGE_THRESHOLD,
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            return Err(ConfigError::GridSize(self.grid_size));
        }
        if !(self.resize_threshold.is_finite() && self.resize_threshold >= 0.0) {
            return Err(ConfigError::Threshold(self.resize_threshold));
        }
        Ok(())
    }

    pub fn snapper(&self) -> Snapper {
        Snapper::new(self.grid_size, self.snap_to_grid)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}
