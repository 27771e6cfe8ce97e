// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture session

use crate::backends::camera::PlatformError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Why a capture configuration attempt failed
///
/// The set is closed; equality compares the kind only, so status
/// comparisons never depend on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureError {
    /// No usable camera device was found
    DeviceUnavailable,
    /// No device could be bound as the session input
    InputSetupFailed,
    /// The still-image output could not be attached
    OutputSetupFailed,
    /// The hardware pipeline refused to start
    StartCaptureFailed,
    /// Camera access is not authorized
    PermissionDenied,
}

impl CaptureError {
    pub const ALL: [CaptureError; 5] = [
        CaptureError::DeviceUnavailable,
        CaptureError::InputSetupFailed,
        CaptureError::OutputSetupFailed,
        CaptureError::StartCaptureFailed,
        CaptureError::PermissionDenied,
    ];

    /// Human-readable explanation
    pub fn description(&self) -> &'static str {
        match self {
            CaptureError::DeviceUnavailable => "The camera device is unavailable.",
            CaptureError::InputSetupFailed => "Failed to set up camera input.",
            CaptureError::OutputSetupFailed => "Failed to set up camera output.",
            CaptureError::StartCaptureFailed => "Failed to start camera capture.",
            CaptureError::PermissionDenied => {
                "Camera access was denied. Please enable camera access in the settings."
            }
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl std::error::Error for CaptureError {}

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Capture session errors
    Capture(CaptureError),
    /// Platform errors surfaced outside the session (e.g. CLI listing)
    Platform(PlatformError),
    /// Configuration errors
    Config(String),
    /// Terminal or filesystem errors
    Io(String),
    /// Generic error with message
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Platform(e) => write!(f, "Platform error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<PlatformError> for AppError {
    fn from(err: PlatformError) -> Self {
        AppError::Platform(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}
