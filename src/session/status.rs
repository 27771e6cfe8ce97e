// SPDX-License-Identifier: GPL-3.0-only

//! Session status and permission decisions

use crate::backends::camera::AuthorizationStatus;
use crate::errors::CaptureError;

/// Observable state of the capture session
///
/// Transitions: `Unconfigured → {Configured | Failed}`, `Configured → Failed`
/// on a failed input switch or re-configuration. Nothing returns to
/// `Unconfigured`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaptureStatus {
    /// No configuration attempt has finished yet
    #[default]
    Unconfigured,
    /// Input and photo output are bound
    Configured,
    /// The last attempt failed
    Failed(CaptureError),
}

impl CaptureStatus {
    pub fn is_configured(&self) -> bool {
        matches!(self, CaptureStatus::Configured)
    }

    /// The failure reason, if any
    pub fn error(&self) -> Option<CaptureError> {
        match self {
            CaptureStatus::Failed(e) => Some(*e),
            _ => None,
        }
    }

    /// Access was refused; only a new permission check can leave this state
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, CaptureStatus::Failed(CaptureError::PermissionDenied))
    }
}

impl std::fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureStatus::Unconfigured => write!(f, "unconfigured"),
            CaptureStatus::Configured => write!(f, "configured"),
            CaptureStatus::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// What a permission check does next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionAction {
    /// Access is granted; configure the session
    Configure,
    /// Ask the user, then configure or fail depending on the answer
    Prompt,
    /// Access was refused before; fail without asking again
    Deny,
}

impl PermissionAction {
    pub fn for_status(status: AuthorizationStatus) -> Self {
        match status {
            AuthorizationStatus::Authorized => PermissionAction::Configure,
            AuthorizationStatus::NotDetermined => PermissionAction::Prompt,
            // Re-prompting after a refusal is not allowed
            AuthorizationStatus::Denied | AuthorizationStatus::Restricted => PermissionAction::Deny,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_unconfigured() {
        assert_eq!(CaptureStatus::default(), CaptureStatus::Unconfigured);
        assert!(CaptureStatus::default().error().is_none());
    }

    #[test]
    fn failed_statuses_compare_structurally() {
        let a = CaptureStatus::Failed(CaptureError::InputSetupFailed);
        let b = CaptureStatus::Failed(CaptureError::InputSetupFailed);
        assert_eq!(a, b);
        assert_ne!(a, CaptureStatus::Failed(CaptureError::DeviceUnavailable));
        assert_ne!(a, CaptureStatus::Configured);
    }

    #[test]
    fn permission_actions() {
        use AuthorizationStatus::*;
        assert_eq!(PermissionAction::for_status(Authorized), PermissionAction::Configure);
        assert_eq!(PermissionAction::for_status(NotDetermined), PermissionAction::Prompt);
        assert_eq!(PermissionAction::for_status(Denied), PermissionAction::Deny);
        assert_eq!(PermissionAction::for_status(Restricted), PermissionAction::Deny);
    }

    #[test]
    fn display_includes_reason() {
        let status = CaptureStatus::Failed(CaptureError::OutputSetupFailed);
        assert_eq!(status.to_string(), "failed: Failed to set up camera output.");
    }
}
