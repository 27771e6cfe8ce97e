// SPDX-License-Identifier: GPL-3.0-only

//! Capture session controller
//!
//! The controller is the single owner of one capture pipeline (one input
//! device plus a still-image output). Callers issue commands; a dedicated
//! worker thread applies them strictly in order against the platform. State
//! flows back out through `tokio::sync::watch` channels, so readers on other
//! threads see the latest published status without locking the session.
//!
//! Re-entrancy: commands never run inline. A command issued while another is
//! in flight is queued behind it, including a second `configure()`.

mod status;
mod worker;

pub use status::{CaptureStatus, PermissionAction};

use crate::backends::camera::{CapturePlatform, InputDevice, PlatformType, PreviewHandle};
use crate::errors::AppResult;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};
use worker::{SessionCommand, SessionPublishers, SessionWorker};

/// Owner of the capture session
pub struct CaptureSessionController {
    commands: Sender<SessionCommand>,
    status: watch::Receiver<CaptureStatus>,
    devices: watch::Receiver<Vec<InputDevice>>,
    current_input: watch::Receiver<Option<InputDevice>>,
    preview: Option<PreviewHandle>,
    platform_type: PlatformType,
    worker: Option<JoinHandle<()>>,
}

impl CaptureSessionController {
    /// Take ownership of `platform` and start the session worker
    pub fn new(platform: Box<dyn CapturePlatform>) -> AppResult<Self> {
        let platform_type = platform.platform_type();
        let preview = platform.preview();

        let (status_tx, status_rx) = watch::channel(CaptureStatus::Unconfigured);
        let (devices_tx, devices_rx) = watch::channel(Vec::new());
        let (input_tx, input_rx) = watch::channel(None);
        let (command_tx, command_rx) = mpsc::channel();

        let worker = SessionWorker::new(
            platform,
            command_tx.clone(),
            SessionPublishers {
                status: status_tx,
                devices: devices_tx,
                current_input: input_tx,
            },
        );
        let handle = std::thread::Builder::new()
            .name("capture-session".into())
            .spawn(move || worker.run(command_rx))?;

        info!(platform = %platform_type, "Capture session controller created");

        Ok(Self {
            commands: command_tx,
            status: status_rx,
            devices: devices_rx,
            current_input: input_rx,
            preview,
            platform_type,
            worker: Some(handle),
        })
    }

    fn send(&self, command: SessionCommand) {
        if self.commands.send(command).is_err() {
            warn!("Session worker is not running; command dropped");
        }
    }

    // ===== Commands =====

    /// Check camera authorization and configure, prompt, or fail accordingly
    pub fn check_permission(&self) {
        self.send(SessionCommand::CheckPermission);
    }

    /// Bind an input device and a photo output, then start the pipeline
    ///
    /// Ignored while access is denied; run [`check_permission`](Self::check_permission)
    /// instead.
    pub fn configure(&self) {
        self.send(SessionCommand::Configure);
    }

    /// Replace the bound input with `device`
    pub fn switch_input(&self, device: InputDevice) {
        self.send(SessionCommand::SwitchInput(device));
    }

    /// Halt the hardware pipeline; no-op if it is not running
    pub fn stop(&self) {
        self.send(SessionCommand::Stop);
    }

    /// Block until every command issued so far has been applied
    pub fn wait_idle(&self) {
        let (ack_tx, ack_rx) = mpsc::sync_channel(1);
        self.send(SessionCommand::Barrier(ack_tx));
        // Err means the worker is gone, which is idle enough
        let _ = ack_rx.recv();
    }

    /// Wait until the published status satisfies `predicate`
    ///
    /// Returns `false` if `timeout` elapses first. Needed when an answer
    /// arrives asynchronously (permission prompts), where
    /// [`wait_idle`](Self::wait_idle) alone cannot know about it yet.
    pub fn wait_for_status(
        &self,
        timeout: Duration,
        predicate: impl Fn(&CaptureStatus) -> bool,
    ) -> bool {
        let mut receiver = self.status.clone();
        if predicate(&receiver.borrow_and_update()) {
            return true;
        }

        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "Failed to build runtime for status wait");
                return false;
            }
        };

        runtime.block_on(async move {
            matches!(
                tokio::time::timeout(timeout, receiver.wait_for(|s| predicate(s))).await,
                Ok(Ok(_))
            )
        })
    }

    // ===== Observation =====

    /// Latest published status
    pub fn status(&self) -> CaptureStatus {
        *self.status.borrow()
    }

    /// Subscribe to status changes
    pub fn watch_status(&self) -> watch::Receiver<CaptureStatus> {
        self.status.clone()
    }

    /// Devices found by the last configuration attempt
    pub fn available_input_devices(&self) -> Vec<InputDevice> {
        self.devices.borrow().clone()
    }

    /// The input currently bound, if any
    pub fn current_input(&self) -> Option<InputDevice> {
        self.current_input.borrow().clone()
    }

    /// Live video surface
    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    pub fn platform_type(&self) -> PlatformType {
        self.platform_type
    }

    /// Stop the pipeline and join the worker
    pub fn shutdown(mut self) {
        self.join_worker();
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            self.send(SessionCommand::Shutdown);
            if handle.join().is_err() {
                warn!("Session worker panicked");
            }
        }
    }
}

impl Drop for CaptureSessionController {
    fn drop(&mut self) {
        self.join_worker();
    }
}

impl std::fmt::Debug for CaptureSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSessionController")
            .field("platform", &self.platform_type)
            .field("status", &self.status())
            .field("current_input", &self.current_input())
            .finish()
    }
}
