// SPDX-License-Identifier: GPL-3.0-only
// Shared types for the capture platform abstraction

//! Shared types for capture platforms

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Capture platform type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlatformType {
    /// Video4Linux2 devices (real hardware)
    #[default]
    V4l2,
    /// In-process simulated devices
    Simulated,
}

impl std::fmt::Display for PlatformType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformType::V4l2 => write!(f, "v4l2"),
            PlatformType::Simulated => write!(f, "simulated"),
        }
    }
}

impl std::str::FromStr for PlatformType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v4l2" => Ok(PlatformType::V4l2),
            "simulated" | "sim" => Ok(PlatformType::Simulated),
            other => Err(format!(
                "unknown backend '{}' (expected 'v4l2' or 'simulated')",
                other
            )),
        }
    }
}

/// Physical kind of a camera unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    /// Standard single wide-angle lens
    WideAngle,
    /// Dual-lens module
    Dual,
    /// Ultra-wide lens
    UltraWide,
    /// Anything else (external, depth, IR, ...)
    External,
}

impl DeviceKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            DeviceKind::WideAngle => "Wide",
            DeviceKind::Dual => "Dual",
            DeviceKind::UltraWide => "Ultra Wide",
            DeviceKind::External => "External",
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Stable identifier of an input device (device node path, or a synthetic id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A camera unit exposed by the platform
///
/// This is a snapshot taken at discovery time; the platform owns the
/// underlying device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDevice {
    pub unique_id: DeviceId,
    pub display_name: String,
    pub kind: DeviceKind,
}

impl InputDevice {
    pub fn new(unique_id: impl Into<String>, display_name: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            unique_id: DeviceId::new(unique_id),
            display_name: display_name.into(),
            kind,
        }
    }
}

impl std::fmt::Display for InputDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name, self.kind)
    }
}

/// Authorization state of the camera capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    /// Access granted
    Authorized,
    /// The user has not been asked yet
    NotDetermined,
    /// The user refused access
    Denied,
    /// Access blocked by system policy; the user cannot grant it
    Restricted,
}

/// Output sink attached to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputKind {
    /// Still-image capture
    Photo,
}

/// Callback invoked once the user answers a permission prompt.
///
/// May run on any thread.
pub type AccessCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// Pixel layout of a preview frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed 8-bit RGB
    Rgb24,
    /// Packed YUV 4:2:2 (Y0 U Y1 V)
    Yuyv,
    /// 8-bit luma only
    Gray8,
}

/// A single preview frame
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row
    pub stride: u32,
    pub format: PixelFormat,
    pub data: Arc<[u8]>,
    /// Monotonic frame counter since the pipeline started
    pub sequence: u64,
}

impl PreviewFrame {
    /// Sample a pixel as RGB, clamping coordinates to the frame.
    ///
    /// Out-of-range buffer reads yield black.
    pub fn sample_rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let data = &self.data[..];

        match self.format {
            PixelFormat::Rgb24 => {
                let idx = (y * self.stride + x * 3) as usize;
                if idx + 2 < data.len() {
                    (data[idx], data[idx + 1], data[idx + 2])
                } else {
                    (0, 0, 0)
                }
            }
            PixelFormat::Gray8 => {
                let idx = (y * self.stride + x) as usize;
                match data.get(idx) {
                    Some(&v) => (v, v, v),
                    None => (0, 0, 0),
                }
            }
            PixelFormat::Yuyv => {
                // Two pixels share chroma: Y0 U Y1 V
                let pair_x = (x & !1) as usize;
                let base = (y as usize) * (self.stride as usize) + pair_x * 2;
                if base + 3 >= data.len() {
                    return (0, 0, 0);
                }
                let luma = if x & 1 == 0 {
                    data[base]
                } else {
                    data[base + 2]
                };
                yuv_to_rgb(luma, data[base + 1], data[base + 3])
            }
        }
    }
}

/// Convert YUV (BT.601) to RGB
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}

/// Read-only view of the latest frame produced by a running pipeline
///
/// Cloning is cheap; all clones observe the same slot. Only the platform
/// that created the handle can publish into it.
#[derive(Debug, Clone, Default)]
pub struct PreviewHandle {
    latest: Arc<Mutex<Option<PreviewFrame>>>,
}

impl PreviewHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent frame, if the pipeline has produced one since it started
    pub fn latest(&self) -> Option<PreviewFrame> {
        self.latest.lock().ok().and_then(|guard| guard.clone())
    }

    pub(crate) fn publish(&self, frame: PreviewFrame) {
        if let Ok(mut guard) = self.latest.lock() {
            *guard = Some(frame);
        }
    }

    pub(crate) fn clear(&self) {
        if let Ok(mut guard) = self.latest.lock() {
            *guard = None;
        }
    }
}

/// Result type for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Error types for platform operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Device is not known to the platform
    DeviceNotFound(String),
    /// Device exists but could not be opened as an input
    OpenFailed(String),
    /// The session refused the input or output
    Rejected(String),
    /// The hardware stream could not be started
    StreamFailed(String),
    /// General I/O error
    Io(String),
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            PlatformError::OpenFailed(msg) => write!(f, "Failed to open device: {}", msg),
            PlatformError::Rejected(msg) => write!(f, "Rejected by session: {}", msg),
            PlatformError::StreamFailed(msg) => write!(f, "Stream failed: {}", msg),
            PlatformError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for PlatformError {}

impl From<std::io::Error> for PlatformError {
    fn from(err: std::io::Error) -> Self {
        PlatformError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_type_parses_case_insensitively() {
        assert_eq!("V4L2".parse::<PlatformType>(), Ok(PlatformType::V4l2));
        assert_eq!("sim".parse::<PlatformType>(), Ok(PlatformType::Simulated));
        assert!("gstreamer".parse::<PlatformType>().is_err());
    }

    #[test]
    fn yuyv_sampling_uses_shared_chroma() {
        // Two pixels: Y0=200, Y1=50, neutral chroma
        let frame = PreviewFrame {
            width: 2,
            height: 1,
            stride: 4,
            format: PixelFormat::Yuyv,
            data: Arc::from(vec![200u8, 128, 50, 128]),
            sequence: 0,
        };
        assert_eq!(frame.sample_rgb(0, 0), (200, 200, 200));
        assert_eq!(frame.sample_rgb(1, 0), (50, 50, 50));
        // Clamped to the last column
        assert_eq!(frame.sample_rgb(9, 3), (50, 50, 50));
    }

    #[test]
    fn preview_handle_clones_share_latest_frame() {
        let handle = PreviewHandle::new();
        let reader = handle.clone();
        assert!(reader.latest().is_none());

        handle.publish(PreviewFrame {
            width: 1,
            height: 1,
            stride: 3,
            format: PixelFormat::Rgb24,
            data: Arc::from(vec![1u8, 2, 3]),
            sequence: 7,
        });
        assert_eq!(reader.latest().map(|f| f.sequence), Some(7));

        handle.clear();
        assert!(reader.latest().is_none());
    }
}
