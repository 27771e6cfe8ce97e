// SPDX-License-Identifier: GPL-3.0-only

//! Session worker: owns the platform and applies commands one at a time.
//!
//! Every mutation of the capture session happens on this thread. The
//! permission prompt answers from a foreign thread, so its callback only
//! enqueues a [`SessionCommand::PermissionResolved`] back onto the same
//! channel.

use super::status::{CaptureStatus, PermissionAction};
use crate::backends::camera::{CapturePlatform, InputDevice, OutputKind};
use crate::constants::DEVICE_PREFERENCE;
use crate::errors::CaptureError;
use std::sync::mpsc::{Receiver, Sender, SyncSender};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Commands processed by the worker, in arrival order
pub(crate) enum SessionCommand {
    CheckPermission,
    PermissionResolved(bool),
    Configure,
    SwitchInput(InputDevice),
    Stop,
    /// Acknowledged once every earlier command has been applied
    Barrier(SyncSender<()>),
    Shutdown,
}

impl std::fmt::Debug for SessionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionCommand::CheckPermission => write!(f, "CheckPermission"),
            SessionCommand::PermissionResolved(granted) => {
                write!(f, "PermissionResolved({})", granted)
            }
            SessionCommand::Configure => write!(f, "Configure"),
            SessionCommand::SwitchInput(device) => write!(f, "SwitchInput({})", device.unique_id),
            SessionCommand::Stop => write!(f, "Stop"),
            SessionCommand::Barrier(_) => write!(f, "Barrier"),
            SessionCommand::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Channels the worker publishes into
pub(crate) struct SessionPublishers {
    pub(crate) status: watch::Sender<CaptureStatus>,
    pub(crate) devices: watch::Sender<Vec<InputDevice>>,
    pub(crate) current_input: watch::Sender<Option<InputDevice>>,
}

pub(crate) struct SessionWorker {
    platform: Box<dyn CapturePlatform>,
    /// Re-entry point for the permission callback
    commands: Sender<SessionCommand>,
    publish: SessionPublishers,
    /// Snapshot from the last discovery
    available: Vec<InputDevice>,
    /// Set when configuration started the pipeline, cleared by `stop`
    wants_running: bool,
}

impl SessionWorker {
    pub(crate) fn new(
        platform: Box<dyn CapturePlatform>,
        commands: Sender<SessionCommand>,
        publish: SessionPublishers,
    ) -> Self {
        Self {
            platform,
            commands,
            publish,
            available: Vec::new(),
            wants_running: false,
        }
    }

    /// Process commands until shutdown or until every sender is gone
    pub(crate) fn run(mut self, receiver: Receiver<SessionCommand>) {
        info!(platform = %self.platform.platform_type(), "Session worker started");

        while let Ok(command) = receiver.recv() {
            debug!(?command, "Session command");
            match command {
                SessionCommand::CheckPermission => self.check_permission(),
                SessionCommand::PermissionResolved(granted) => self.permission_resolved(granted),
                SessionCommand::Configure => self.configure(),
                SessionCommand::SwitchInput(device) => self.switch_input(device),
                SessionCommand::Stop => self.stop(),
                SessionCommand::Barrier(ack) => {
                    let _ = ack.send(());
                }
                SessionCommand::Shutdown => break,
            }
        }

        self.platform.stop_running();
        info!("Session worker stopped");
    }

    fn status(&self) -> CaptureStatus {
        *self.publish.status.borrow()
    }

    fn set_status(&self, status: CaptureStatus) {
        let previous = self.publish.status.send_replace(status);
        if previous != status {
            info!(from = %previous, to = %status, "Capture status changed");
        }
    }

    // ===== Permission =====

    fn check_permission(&mut self) {
        let authorization = self.platform.authorization_status();
        let action = PermissionAction::for_status(authorization);
        info!(?authorization, ?action, "Checked camera permission");

        match action {
            PermissionAction::Configure => self.configure_session(),
            PermissionAction::Prompt => {
                let commands = self.commands.clone();
                self.platform.request_access(Box::new(move |granted| {
                    // Worker may be gone by the time the user answers
                    let _ = commands.send(SessionCommand::PermissionResolved(granted));
                }));
            }
            PermissionAction::Deny => {
                self.set_status(CaptureStatus::Failed(CaptureError::PermissionDenied));
            }
        }
    }

    fn permission_resolved(&mut self, granted: bool) {
        if granted {
            info!("Camera access granted");
            self.configure_session();
        } else {
            warn!("Camera access refused");
            self.set_status(CaptureStatus::Failed(CaptureError::PermissionDenied));
        }
    }

    // ===== Configuration =====

    /// Explicit `configure()` from a caller
    fn configure(&mut self) {
        if self.status().is_permission_denied() {
            warn!("Ignoring configure: camera access was denied");
            return;
        }
        self.configure_session();
    }

    fn configure_session(&mut self) {
        self.platform.begin_configuration();

        let result = self
            .set_up_video_input()
            .and_then(|device| self.set_up_photo_output().map(|()| device));
        if result.is_err() {
            // A failed attempt leaves nothing bound
            self.unbind_inputs();
        }

        // Always commit so the platform session is left consistent
        self.platform.commit_configuration();

        if let Ok(device) = &result {
            self.publish.current_input.send_replace(Some(device.clone()));
        }

        // Status is published once, after the pipeline had its chance to start
        match result.and_then(|device| self.start_capturing().map(|()| device)) {
            Ok(device) => {
                info!(device = %device.unique_id, name = %device.display_name, "Session configured");
                self.set_status(CaptureStatus::Configured);
            }
            Err(e) => {
                error!(error = %e, "Session configuration failed");
                self.halt_pipeline();
                self.set_status(CaptureStatus::Failed(e));
            }
        }
    }

    /// Bind the default device, falling back through the preference list
    fn set_up_video_input(&mut self) -> Result<InputDevice, CaptureError> {
        self.unbind_inputs();

        self.available = self.platform.discover(&DEVICE_PREFERENCE);
        self.publish.devices.send_replace(self.available.clone());
        debug!(count = self.available.len(), "Discovered input devices");

        let default = self.platform.default_device();
        if let Some(device) = &default {
            match self.bind_input(device) {
                Ok(()) => return Ok(device.clone()),
                Err(e) => {
                    warn!(device = %device.unique_id, error = %e, "Default device set up failed, trying other options");
                }
            }
        } else if self.available.is_empty() {
            return Err(CaptureError::DeviceUnavailable);
        }

        self.set_up_alternative_input(default.as_ref())
    }

    fn set_up_alternative_input(
        &mut self,
        already_tried: Option<&InputDevice>,
    ) -> Result<InputDevice, CaptureError> {
        for kind in DEVICE_PREFERENCE {
            let Some(device) = self.available.iter().find(|d| d.kind == kind).cloned() else {
                continue;
            };
            if already_tried.is_some_and(|tried| tried.unique_id == device.unique_id) {
                continue;
            }
            match self.bind_input(&device) {
                Ok(()) => {
                    info!(device = %device.unique_id, ?kind, "Fell back to alternative device");
                    return Ok(device);
                }
                Err(e) => debug!(device = %device.unique_id, error = %e, "Alternative device failed"),
            }
        }
        Err(CaptureError::InputSetupFailed)
    }

    fn bind_input(&mut self, device: &InputDevice) -> Result<(), CaptureError> {
        if !self.platform.can_add_input(device) {
            return Err(CaptureError::InputSetupFailed);
        }
        self.platform.add_input(device).map_err(|e| {
            debug!(device = %device.unique_id, error = %e, "add_input failed");
            CaptureError::InputSetupFailed
        })
    }

    fn unbind_inputs(&mut self) {
        for id in self.platform.inputs() {
            self.platform.remove_input(&id);
            debug!(device = %id, "Input unbound");
        }
        self.publish.current_input.send_replace(None);
    }

    fn set_up_photo_output(&mut self) -> Result<(), CaptureError> {
        if self.platform.outputs().contains(&OutputKind::Photo) {
            debug!("Photo output already attached");
            return Ok(());
        }
        if !self.platform.can_add_output(OutputKind::Photo) {
            return Err(CaptureError::OutputSetupFailed);
        }
        self.platform.add_output(OutputKind::Photo).map_err(|e| {
            debug!(error = %e, "add_output failed");
            CaptureError::OutputSetupFailed
        })
    }

    fn start_capturing(&mut self) -> Result<(), CaptureError> {
        self.wants_running = true;
        if self.platform.is_running() {
            info!("Session is already running");
            return Ok(());
        }
        self.platform.start_running().map_err(|e| {
            error!(error = %e, "Failed to start capture");
            CaptureError::StartCaptureFailed
        })
    }

    /// Stop a pipeline that no longer has a complete configuration behind it
    fn halt_pipeline(&mut self) {
        if self.platform.is_running() {
            self.platform.stop_running();
            info!("Pipeline halted after failed setup");
        }
    }

    // ===== Input switching =====

    fn switch_input(&mut self, device: InputDevice) {
        if self.status().is_permission_denied() {
            warn!(device = %device.unique_id, "Ignoring input switch: camera access was denied");
            return;
        }

        info!(device = %device.unique_id, "Switching input");
        self.platform.begin_configuration();

        self.unbind_inputs();
        let result = if self.available.iter().any(|d| d.unique_id == device.unique_id) {
            self.bind_input(&device)
        } else {
            warn!(device = %device.unique_id, "Device is not among the discovered inputs");
            Err(CaptureError::InputSetupFailed)
        };

        self.platform.commit_configuration();

        match result {
            Ok(()) => {
                self.publish.current_input.send_replace(Some(device));
                if !self.platform.outputs().contains(&OutputKind::Photo) {
                    debug!("No photo output yet; status left to the next configure");
                    return;
                }
                let started = if self.wants_running {
                    self.start_capturing()
                } else {
                    Ok(())
                };
                match started {
                    Ok(()) => self.set_status(CaptureStatus::Configured),
                    Err(e) => self.set_status(CaptureStatus::Failed(e)),
                }
            }
            Err(e) => {
                error!(error = %e, "Input switch failed");
                self.halt_pipeline();
                self.set_status(CaptureStatus::Failed(e));
            }
        }
    }

    // ===== Stop =====

    fn stop(&mut self) {
        self.wants_running = false;
        if !self.platform.is_running() {
            return;
        }
        self.platform.stop_running();
        info!("Session stopped");
    }
}
