// SPDX-License-Identifier: GPL-3.0-only

//! Kiosk configuration
//!
//! Nothing is read unless `--config <path>` is given. Every field has a
//! default, so a config file only needs the keys it changes:
//!
//! ```json
//! { "camera": { "device": "/dev/video2" }, "export": { "format": "jpeg" } }
//! ```

use crate::backends::camera::{CameraBackendType, StreamRequest};
use crate::constants::{camera, export, timing};
use crate::pipelines::photo::EncodingFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera: CameraSettings,
    pub timing: TimingSettings,
    pub export: ExportSettings,
    /// Ring the terminal bell for coin and shutter
    pub feedback_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: CameraSettings::default(),
            timing: TimingSettings::default(),
            export: ExportSettings::default(),
            feedback_enabled: true,
        }
    }
}

/// Camera selection and preferred stream size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub backend: CameraBackendType,
    /// Device path (e.g., /dev/video0), first capture device if unset
    pub device: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            backend: CameraBackendType::default(),
            device: None,
            width: camera::PREFERRED_WIDTH,
            height: camera::PREFERRED_HEIGHT,
        }
    }
}

impl CameraSettings {
    pub fn stream_request(&self) -> StreamRequest {
        StreamRequest {
            width: self.width,
            height: self.height,
            device: self.device.clone(),
        }
    }
}

/// Session timings in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Coin trigger to payment accepted
    pub settle_ms: u64,
    /// Each countdown step
    pub countdown_step_ms: u64,
    /// Filter notification lifetime
    pub toast_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            settle_ms: timing::COIN_SETTLE.as_millis() as u64,
            countdown_step_ms: timing::COUNTDOWN_STEP.as_millis() as u64,
            toast_ms: timing::TOAST.as_millis() as u64,
        }
    }
}

impl TimingSettings {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn countdown_step(&self) -> Duration {
        Duration::from_millis(self.countdown_step_ms)
    }

    pub fn toast(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }
}

/// Where and how downloads are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Target directory; defaults to `<Downloads>/Photobooth`
    pub directory: Option<PathBuf>,
    pub format: EncodingFormat,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            directory: None,
            format: EncodingFormat::Png,
        }
    }
}

impl ExportSettings {
    /// Resolved download directory
    pub fn directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(|| {
            dirs::download_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join(export::DEFAULT_SUBDIRECTORY)
        })
    }
}

impl Config {
    /// Load configuration from a JSON file, or defaults if no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Config::default());
        };

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", .path.display())]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}
