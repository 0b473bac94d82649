// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{APP_NAME, timing};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where color and depth frames come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Generated scene using the intrinsics of a known camera
    Synthetic {
        /// Camera model or device label (e.g., "SR300")
        camera: String,
        width: u32,
        height: u32,
        fps: u32,
    },
    /// Recorded color image + 16-bit depth image
    Files {
        color: PathBuf,
        depth: PathBuf,
        /// Label used to look up the calibration
        camera_label: String,
    },
}

impl SourceConfig {
    /// Synthetic SR300 at 640x480
    pub fn default_synthetic() -> Self {
        SourceConfig::Synthetic {
            camera: "SR300".to_string(),
            width: 640,
            height: 480,
            fps: timing::SYNTHETIC_FPS,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::default_synthetic()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stream source opened at startup
    pub source: SourceConfig,
    /// Time between render iterations (milliseconds)
    pub frame_interval_ms: u64,
    /// Background color (RGBA, 0.0 - 1.0)
    pub clear_color: [f64; 4],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            frame_interval_ms: timing::FRAME_INTERVAL.as_millis() as u64,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl Config {
    /// Default config file location (`~/.config/depthview/config.json` on Linux)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.json"))
    }

    /// Read a config file
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load from `path` (or the default location), falling back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => return Self::default(),
        };

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.frame_interval_ms.max(1))
    }
}
