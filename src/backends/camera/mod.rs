// SPDX-License-Identifier: GPL-3.0-only

//! Capture platform abstraction
//!
//! The session controller never talks to camera hardware directly. Everything
//! it needs from the host (permission, discovery, input/output binding,
//! start/stop) goes through [`CapturePlatform`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │ Presentation (terminal)  │
//! └────────────┬─────────────┘
//!              │ commands / watches
//!              ▼
//! ┌──────────────────────────┐
//! │ CaptureSessionController │  ← serial worker, status machine
//! └────────────┬─────────────┘
//!              │
//!              ▼
//! ┌──────────────────────────┐
//! │  CapturePlatform trait   │  ← host capability boundary
//! └────────────┬─────────────┘
//!              │
//!        ┌─────┴──────┐
//!        ▼            ▼
//!    ┌──────┐   ┌───────────┐
//!    │ V4L2 │   │ Simulated │
//!    └──────┘   └───────────┘
//! ```

pub mod simulated;
pub mod types;
pub mod v4l2;

pub use simulated::{SimulatedPlatform, SimulatedProbe};
pub use types::*;
pub use v4l2::V4l2Platform;

/// Host camera capability
///
/// Implementations are owned by exactly one session worker and are only
/// called from that worker's thread, except for the [`AccessCallback`]
/// passed to [`request_access`](Self::request_access), which may fire from
/// any thread.
pub trait CapturePlatform: Send + 'static {
    // ===== Permission =====

    /// Current authorization state for video capture
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Prompt the user for camera access
    ///
    /// The callback receives `true` if access was granted. It is invoked
    /// exactly once, possibly on a different thread.
    fn request_access(&self, callback: AccessCallback);

    // ===== Discovery =====

    /// Enumerate input devices whose kind is listed in `kinds`
    fn discover(&self, kinds: &[DeviceKind]) -> Vec<InputDevice>;

    /// The device the platform would pick on its own, if any
    fn default_device(&self) -> Option<InputDevice>;

    // ===== Configuration transaction =====

    /// Start batching input/output changes
    fn begin_configuration(&mut self);

    /// Apply the batched changes
    fn commit_configuration(&mut self);

    // ===== Inputs =====

    /// Pre-flight check: could `device` be added to the session right now?
    fn can_add_input(&self, device: &InputDevice) -> bool;

    /// Open `device` and bind it as the session input
    fn add_input(&mut self, device: &InputDevice) -> PlatformResult<()>;

    /// Unbind an input; unknown ids are ignored
    fn remove_input(&mut self, id: &DeviceId);

    /// Currently bound inputs
    fn inputs(&self) -> Vec<DeviceId>;

    // ===== Outputs =====

    /// Pre-flight check for an output sink
    fn can_add_output(&self, kind: OutputKind) -> bool;

    /// Attach an output sink
    fn add_output(&mut self, kind: OutputKind) -> PlatformResult<()>;

    /// Currently attached outputs
    fn outputs(&self) -> Vec<OutputKind>;

    // ===== Hardware =====

    /// Start the hardware pipeline
    fn start_running(&mut self) -> PlatformResult<()>;

    /// Stop the hardware pipeline; no-op when not running
    fn stop_running(&mut self);

    /// Whether the hardware pipeline is running
    fn is_running(&self) -> bool;

    // ===== Preview =====

    /// Read-only handle to the live video surface, if this platform has one
    fn preview(&self) -> Option<PreviewHandle>;

    // ===== Metadata =====

    fn platform_type(&self) -> PlatformType;
}

/// Create a platform instance of the given type
///
/// `preferred_device` is used by the V4L2 platform as its default device when
/// that node exists.
pub fn get_platform_for_type(
    platform_type: PlatformType,
    preferred_device: Option<&str>,
) -> Box<dyn CapturePlatform> {
    match platform_type {
        PlatformType::V4l2 => Box::new(V4l2Platform::new(preferred_device.map(str::to_string))),
        PlatformType::Simulated => Box::new(SimulatedPlatform::with_builtin_devices()),
    }
}
