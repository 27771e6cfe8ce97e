// SPDX-License-Identifier: GPL-3.0-only

//! Camera Session - a camera capture session controller with a terminal live preview
//!
//! The crate keeps all capture state in one owner, the
//! [`CaptureSessionController`], which drives a host camera through the
//! [`CapturePlatform`](backends::camera::CapturePlatform) capability trait.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`session`]: Capture session controller and status machine
//! - [`backends`]: Capture platform abstraction (V4L2, simulated)
//! - [`app`]: Presentation of session state (preview, overlay, errors, picker)
//! - [`terminal`]: Terminal front end
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```no_run
//! use camera_session::backends::camera::SimulatedPlatform;
//! use camera_session::CaptureSessionController;
//!
//! let controller = CaptureSessionController::new(Box::new(SimulatedPlatform::with_builtin_devices()))?;
//! controller.check_permission();
//! controller.wait_idle();
//! println!("{}", controller.status());
//! # Ok::<(), camera_session::errors::AppError>(())
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod session;
pub mod terminal;

// Re-export commonly used types
pub use config::Config;
pub use errors::{AppError, AppResult, CaptureError};
pub use session::{CaptureSessionController, CaptureStatus, PermissionAction};
