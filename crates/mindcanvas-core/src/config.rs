//! Tunable constants for the canvas engine.

use crate::entities::SerializableColor;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Layout, ink, persistence and interaction parameters.
///
/// Every field has a default, so a config file may specify any subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Distance of the four starter children from the central node.
    pub starter_radius: f64,
    /// Forward offset of children created by a side expansion.
    pub branch_forward: f64,
    /// Perpendicular spread of the two children created by a side expansion.
    pub branch_spread: f64,
    /// Erase radius, compared against world-space distance.
    pub erase_radius: f64,
    /// Quiet period before a requested save is written.
    pub save_debounce_ms: u64,
    /// Snapshots larger than this are not written.
    pub max_snapshot_bytes: usize,
    /// World-space radius used to hit-test nodes under the pointer.
    pub node_hit_radius: f64,
    /// Multiplicative zoom applied per wheel notch or zoom key.
    pub wheel_zoom_step: f64,
    /// Initial pen colour.
    pub default_pen_color: SerializableColor,
    /// Initial pen width.
    pub default_pen_size: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            starter_radius: 320.0,
            branch_forward: 260.0,
            branch_spread: 160.0,
            erase_radius: 25.0,
            save_debounce_ms: 300,
            max_snapshot_bytes: 8 * 1024 * 1024,
            node_hit_radius: 60.0,
            wheel_zoom_step: 1.1,
            default_pen_color: SerializableColor::new(0x1f, 0x29, 0x37, 255),
            default_pen_size: 3.0,
        }
    }
}

impl CanvasConfig {
    /// The debounce window as a [`Duration`].
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    /// Parse a config from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}
