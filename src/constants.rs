// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use crate::backends::camera::DeviceKind;
use std::time::Duration;

/// Application identifier used for config and cache directories
pub const APP_ID: &str = "camera-session";

/// Device kinds considered during discovery, in fallback order
///
/// Wide-angle first (every camera has one), then dual, then ultra-wide.
pub const DEVICE_PREFERENCE: [DeviceKind; 3] = [
    DeviceKind::WideAngle,
    DeviceKind::Dual,
    DeviceKind::UltraWide,
];

/// Where the "open settings" action points when nothing is configured
pub const DEFAULT_SETTINGS_URI: &str = "https://wiki.archlinux.org/title/Webcam_setup";

/// File and directory names
pub mod paths {
    /// Config file inside the per-app config directory
    pub const CONFIG_FILE: &str = "config.json";

    /// Log file written while the terminal UI is active
    pub const LOG_FILE: &str = "camera-session.log";
}

/// Terminal UI constants
pub mod ui {
    use super::Duration;

    /// Input poll interval; also bounds the preview refresh rate
    pub const POLL_INTERVAL: Duration = Duration::from_millis(16);

    /// How long a status bar message hides the key help
    pub const MESSAGE_TIMEOUT: Duration = Duration::from_secs(3);

    /// The grid splits the preview into this many columns and rows
    pub const GRID_DIVISIONS: u16 = 3;

    /// Shutter ring width in cells
    pub const SHUTTER_OUTER_WIDTH: u16 = 9;

    /// Shutter ring height in cells
    pub const SHUTTER_OUTER_HEIGHT: u16 = 3;

    /// Rows kept free below the shutter
    pub const SHUTTER_BOTTOM_PADDING: u16 = 1;

    /// Error panel width (cells), clamped to the screen
    pub const ERROR_PANEL_WIDTH: u16 = 56;

    /// Error panel height (cells), clamped to the screen
    pub const ERROR_PANEL_HEIGHT: u16 = 9;

    /// Device picker sheet height as a share of the screen (percent)
    pub const PICKER_HEIGHT_PERCENT: u16 = 40;
}
