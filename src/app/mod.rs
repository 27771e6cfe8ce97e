// SPDX-License-Identifier: GPL-3.0-only

//! Presentation layer
//!
//! Maps the session status onto what the user sees. The view layer only reads
//! controller state and sends commands; it never touches the platform.

pub mod device_picker;
pub mod error_panel;
pub mod overlay;
pub mod preview;

use crate::errors::CaptureError;
use crate::session::CaptureStatus;

/// User-facing copy and iconography for a capture error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusInfo {
    /// Short title
    pub label: &'static str,
    /// Freedesktop icon name
    pub icon: &'static str,
    /// Single glyph for the terminal
    pub glyph: &'static str,
    /// Full explanation
    pub description: &'static str,
}

impl StatusInfo {
    pub fn for_error(error: CaptureError) -> Self {
        let (label, icon, glyph) = match error {
            CaptureError::PermissionDenied => ("Permission Denied", "security-high-symbolic", "⛔"),
            CaptureError::DeviceUnavailable => ("Device Unavailable", "camera-disabled-symbolic", "⊘"),
            CaptureError::InputSetupFailed => ("Input Setup Failed", "camera-switch-symbolic", "⟳"),
            CaptureError::OutputSetupFailed => ("Output Setup Failed", "camera-photo-symbolic", "⟳"),
            CaptureError::StartCaptureFailed => ("Start Capture Failed", "camera-web-symbolic", "…"),
        };
        Self {
            label,
            icon,
            glyph,
            description: error.description(),
        }
    }
}

/// Action offered next to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationAction {
    /// Send the user to the system camera-permission settings
    OpenSettings,
}

impl PresentationAction {
    pub fn label(&self) -> &'static str {
        match self {
            PresentationAction::OpenSettings => "Open Settings",
        }
    }
}

/// What the main area shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Waiting for the first configuration attempt to finish
    Connecting,
    /// Live preview with grid and shutter
    Preview,
    /// Error panel; the preview surface is hidden
    Error {
        error: CaptureError,
        info: StatusInfo,
        action: Option<PresentationAction>,
    },
}

impl Screen {
    pub fn for_status(status: CaptureStatus) -> Self {
        match status {
            CaptureStatus::Unconfigured => Screen::Connecting,
            CaptureStatus::Configured => Screen::Preview,
            CaptureStatus::Failed(error) => Screen::Error {
                error,
                info: StatusInfo::for_error(error),
                action: (error == CaptureError::PermissionDenied)
                    .then_some(PresentationAction::OpenSettings),
            },
        }
    }

    pub fn shows_preview(&self) -> bool {
        matches!(self, Screen::Preview)
    }

    pub fn action(&self) -> Option<PresentationAction> {
        match self {
            Screen::Error { action, .. } => *action,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_error_maps_to_distinct_label() {
        let labels: std::collections::HashSet<_> = CaptureError::ALL
            .iter()
            .map(|e| StatusInfo::for_error(*e).label)
            .collect();
        assert_eq!(labels.len(), CaptureError::ALL.len());
    }

    #[test]
    fn only_permission_denied_offers_settings() {
        for error in CaptureError::ALL {
            let screen = Screen::for_status(CaptureStatus::Failed(error));
            let expected = (error == CaptureError::PermissionDenied)
                .then_some(PresentationAction::OpenSettings);
            assert_eq!(screen.action(), expected, "{:?}", error);
            assert!(!screen.shows_preview());
        }
    }

    #[test]
    fn configured_shows_preview() {
        assert!(Screen::for_status(CaptureStatus::Configured).shows_preview());
        assert_eq!(Screen::for_status(CaptureStatus::Unconfigured), Screen::Connecting);
    }
}
