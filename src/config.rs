// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON in `$XDG_CONFIG_HOME/camera-session/config.json`. Only
//! preferences live here; capture state is never persisted.

use crate::backends::camera::PlatformType;
use crate::constants::{APP_ID, DEFAULT_SETTINGS_URI, paths};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capture platform to use
    pub backend: PlatformType,
    /// Device id the platform should treat as its default (e.g. /dev/video2)
    pub preferred_device: Option<String>,
    /// Draw the rule-of-thirds grid over the preview
    pub show_grid: bool,
    /// Mirror camera preview horizontally (selfie mode)
    pub mirror_preview: bool,
    /// Target of the "open settings" action on the permission error panel
    pub settings_uri: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: PlatformType::default(),
            preferred_device: None,
            show_grid: true,
            mirror_preview: true, // Default to mirrored (selfie mode)
            settings_uri: DEFAULT_SETTINGS_URI.to_string(),
        }
    }
}

impl Config {
    /// Default config file location, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_ID).join(paths::CONFIG_FILE))
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let config: Config = serde_json::from_str(&contents).map_err(|e| {
                    AppError::Config(format!("{}: {}", path.display(), e))
                })?;
                debug!(path = %path.display(), "Loaded config");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(AppError::Config(format!("{}: {}", path.display(), e))),
        }
    }

    /// Load from the default location
    pub fn load() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }
}
