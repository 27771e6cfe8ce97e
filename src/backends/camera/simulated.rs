// SPDX-License-Identifier: GPL-3.0-only

//! Simulated capture platform
//!
//! An in-process stand-in for real hardware. Devices, the authorization
//! answer and individual failures are scripted up front; a
//! [`SimulatedProbe`] keeps a view into the platform after it has been moved
//! into a session so callers can inspect what the controller did.

use super::CapturePlatform;
use super::types::*;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const SIM_FRAME_WIDTH: u32 = 160;
const SIM_FRAME_HEIGHT: u32 = 120;

#[derive(Debug)]
struct SimState {
    devices: Vec<InputDevice>,
    default_device: Option<DeviceId>,
    authorization: AuthorizationStatus,
    prompt_answer: bool,
    failing_devices: HashSet<DeviceId>,
    reject_output: bool,
    fail_start: bool,

    inputs: Vec<DeviceId>,
    outputs: Vec<OutputKind>,
    running: bool,
    transaction_depth: u32,

    begin_count: usize,
    commit_count: usize,
    prompt_count: usize,
    start_count: usize,
    input_attempts: Vec<DeviceId>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            default_device: None,
            authorization: AuthorizationStatus::Authorized,
            prompt_answer: true,
            failing_devices: HashSet::new(),
            reject_output: false,
            fail_start: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
            running: false,
            transaction_depth: 0,
            begin_count: 0,
            commit_count: 0,
            prompt_count: 0,
            start_count: 0,
            input_attempts: Vec::new(),
        }
    }
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    // A panicking test thread must not wedge every other observer
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Scriptable fake platform
#[derive(Debug)]
pub struct SimulatedPlatform {
    state: Arc<Mutex<SimState>>,
    preview: PreviewHandle,
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPlatform {
    /// A platform with no devices and access already granted
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::default())),
            preview: PreviewHandle::new(),
        }
    }

    /// A phone-like rig: wide (default), dual and ultra-wide units
    pub fn with_builtin_devices() -> Self {
        Self::new()
            .with_device(InputDevice::new("sim:wide", "Back Camera", DeviceKind::WideAngle))
            .with_device(InputDevice::new("sim:dual", "Back Dual Camera", DeviceKind::Dual))
            .with_device(InputDevice::new(
                "sim:ultrawide",
                "Back Ultra Wide Camera",
                DeviceKind::UltraWide,
            ))
            .with_default("sim:wide")
    }

    pub fn with_device(self, device: InputDevice) -> Self {
        lock(&self.state).devices.push(device);
        self
    }

    /// Make `id` the platform default device
    pub fn with_default(self, id: &str) -> Self {
        lock(&self.state).default_device = Some(DeviceId::new(id));
        self
    }

    pub fn with_authorization(self, status: AuthorizationStatus) -> Self {
        lock(&self.state).authorization = status;
        self
    }

    /// What the user answers when prompted
    pub fn with_prompt_answer(self, granted: bool) -> Self {
        lock(&self.state).prompt_answer = granted;
        self
    }

    /// Opening `id` as an input will fail
    pub fn with_failing_device(self, id: &str) -> Self {
        lock(&self.state).failing_devices.insert(DeviceId::new(id));
        self
    }

    /// The session refuses every output sink
    pub fn with_rejected_output(self) -> Self {
        lock(&self.state).reject_output = true;
        self
    }

    /// Starting the hardware pipeline fails
    pub fn with_start_failure(self) -> Self {
        lock(&self.state).fail_start = true;
        self
    }

    /// A view into this platform that survives moving it into a session
    pub fn probe(&self) -> SimulatedProbe {
        SimulatedProbe {
            state: Arc::clone(&self.state),
        }
    }
}

/// Synthetic test pattern: horizontal luma ramp with a vertical colour ramp
fn test_pattern(sequence: u64) -> PreviewFrame {
    let stride = SIM_FRAME_WIDTH * 3;
    let mut data = Vec::with_capacity((stride * SIM_FRAME_HEIGHT) as usize);
    for y in 0..SIM_FRAME_HEIGHT {
        for x in 0..SIM_FRAME_WIDTH {
            let r = (x * 255 / SIM_FRAME_WIDTH) as u8;
            let g = (y * 255 / SIM_FRAME_HEIGHT) as u8;
            let b = 255 - r / 2;
            data.extend_from_slice(&[r, g, b]);
        }
    }
    PreviewFrame {
        width: SIM_FRAME_WIDTH,
        height: SIM_FRAME_HEIGHT,
        stride,
        format: PixelFormat::Rgb24,
        data: Arc::from(data),
        sequence,
    }
}

impl CapturePlatform for SimulatedPlatform {
    fn authorization_status(&self) -> AuthorizationStatus {
        lock(&self.state).authorization
    }

    fn request_access(&self, callback: AccessCallback) {
        let granted = {
            let mut state = lock(&self.state);
            state.prompt_count += 1;
            state.authorization = if state.prompt_answer {
                AuthorizationStatus::Authorized
            } else {
                AuthorizationStatus::Denied
            };
            state.prompt_answer
        };
        info!(granted, "Simulated permission prompt answered");

        // Answer from a foreign thread, like a system dialog would
        std::thread::spawn(move || callback(granted));
    }

    fn discover(&self, kinds: &[DeviceKind]) -> Vec<InputDevice> {
        lock(&self.state)
            .devices
            .iter()
            .filter(|d| kinds.contains(&d.kind))
            .cloned()
            .collect()
    }

    fn default_device(&self) -> Option<InputDevice> {
        let state = lock(&self.state);
        let id = state.default_device.as_ref()?;
        state.devices.iter().find(|d| &d.unique_id == id).cloned()
    }

    fn begin_configuration(&mut self) {
        let mut state = lock(&self.state);
        state.begin_count += 1;
        state.transaction_depth += 1;
    }

    fn commit_configuration(&mut self) {
        let mut state = lock(&self.state);
        state.commit_count += 1;
        state.transaction_depth = state.transaction_depth.saturating_sub(1);
    }

    fn can_add_input(&self, device: &InputDevice) -> bool {
        let state = lock(&self.state);
        state.inputs.is_empty() && state.devices.iter().any(|d| d.unique_id == device.unique_id)
    }

    fn add_input(&mut self, device: &InputDevice) -> PlatformResult<()> {
        let mut state = lock(&self.state);
        state.input_attempts.push(device.unique_id.clone());

        if !state.devices.iter().any(|d| d.unique_id == device.unique_id) {
            return Err(PlatformError::DeviceNotFound(device.unique_id.to_string()));
        }
        if state.failing_devices.contains(&device.unique_id) {
            return Err(PlatformError::OpenFailed(device.unique_id.to_string()));
        }
        if !state.inputs.is_empty() {
            return Err(PlatformError::Rejected(format!(
                "session already has input {}",
                state.inputs[0]
            )));
        }

        debug!(device = %device.unique_id, "Simulated input bound");
        state.inputs.push(device.unique_id.clone());
        Ok(())
    }

    fn remove_input(&mut self, id: &DeviceId) {
        lock(&self.state).inputs.retain(|bound| bound != id);
    }

    fn inputs(&self) -> Vec<DeviceId> {
        lock(&self.state).inputs.clone()
    }

    fn can_add_output(&self, kind: OutputKind) -> bool {
        let state = lock(&self.state);
        !state.reject_output && !state.outputs.contains(&kind)
    }

    fn add_output(&mut self, kind: OutputKind) -> PlatformResult<()> {
        let mut state = lock(&self.state);
        if state.reject_output || state.outputs.contains(&kind) {
            return Err(PlatformError::Rejected(format!("{:?} output", kind)));
        }
        state.outputs.push(kind);
        Ok(())
    }

    fn outputs(&self) -> Vec<OutputKind> {
        lock(&self.state).outputs.clone()
    }

    fn start_running(&mut self) -> PlatformResult<()> {
        let sequence = {
            let mut state = lock(&self.state);
            if state.fail_start {
                return Err(PlatformError::StreamFailed("simulated start failure".into()));
            }
            if state.running {
                return Ok(());
            }
            state.running = true;
            state.start_count += 1;
            state.start_count as u64
        };
        self.preview.publish(test_pattern(sequence));
        info!("Simulated pipeline started");
        Ok(())
    }

    fn stop_running(&mut self) {
        let was_running = std::mem::replace(&mut lock(&self.state).running, false);
        if was_running {
            self.preview.clear();
            info!("Simulated pipeline stopped");
        }
    }

    fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    fn preview(&self) -> Option<PreviewHandle> {
        Some(self.preview.clone())
    }

    fn platform_type(&self) -> PlatformType {
        PlatformType::Simulated
    }
}

/// Read-only window into a [`SimulatedPlatform`]
#[derive(Debug, Clone)]
pub struct SimulatedProbe {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedProbe {
    pub fn inputs(&self) -> Vec<DeviceId> {
        lock(&self.state).inputs.clone()
    }

    pub fn outputs(&self) -> Vec<OutputKind> {
        lock(&self.state).outputs.clone()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    /// Number of `begin_configuration` calls
    pub fn begin_count(&self) -> usize {
        lock(&self.state).begin_count
    }

    /// Number of `commit_configuration` calls
    pub fn commit_count(&self) -> usize {
        lock(&self.state).commit_count
    }

    /// Whether a configuration transaction is currently open
    pub fn in_transaction(&self) -> bool {
        lock(&self.state).transaction_depth > 0
    }

    /// Number of permission prompts shown
    pub fn prompt_count(&self) -> usize {
        lock(&self.state).prompt_count
    }

    /// Number of times the pipeline went from stopped to running
    pub fn start_count(&self) -> usize {
        lock(&self.state).start_count
    }

    /// Every device `add_input` was called with, in order
    pub fn input_attempts(&self) -> Vec<DeviceId> {
        lock(&self.state).input_attempts.clone()
    }

    /// Change the authorization state after construction
    pub fn set_authorization(&self, status: AuthorizationStatus) {
        lock(&self.state).authorization = status;
    }

    /// Make later `start_running` calls fail (or succeed again)
    pub fn set_start_failure(&self, fail: bool) {
        lock(&self.state).fail_start = fail;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_filters_by_kind() {
        let platform = SimulatedPlatform::with_builtin_devices()
            .with_device(InputDevice::new("sim:ir", "IR Camera", DeviceKind::External));

        let found = platform.discover(&[DeviceKind::Dual, DeviceKind::UltraWide]);
        let ids: Vec<&str> = found.iter().map(|d| d.unique_id.as_str()).collect();
        assert_eq!(ids, vec!["sim:dual", "sim:ultrawide"]);
    }

    #[test]
    fn default_device_must_exist() {
        let platform = SimulatedPlatform::new().with_default("sim:missing");
        assert!(platform.default_device().is_none());
    }

    #[test]
    fn session_holds_a_single_input() {
        let mut platform = SimulatedPlatform::with_builtin_devices();
        let wide = platform.default_device().unwrap();
        let dual = InputDevice::new("sim:dual", "Back Dual Camera", DeviceKind::Dual);

        platform.add_input(&wide).unwrap();
        assert!(!platform.can_add_input(&dual));
        assert!(matches!(
            platform.add_input(&dual),
            Err(PlatformError::Rejected(_))
        ));

        platform.remove_input(&wide.unique_id);
        assert!(platform.can_add_input(&dual));
    }

    #[test]
    fn duplicate_output_is_rejected() {
        let mut platform = SimulatedPlatform::new();
        platform.add_output(OutputKind::Photo).unwrap();
        assert!(!platform.can_add_output(OutputKind::Photo));
        assert!(platform.add_output(OutputKind::Photo).is_err());
        assert_eq!(platform.outputs().len(), 1);
    }

    #[test]
    fn prompt_answers_from_another_thread() {
        let platform = SimulatedPlatform::new()
            .with_authorization(AuthorizationStatus::NotDetermined)
            .with_prompt_answer(false);
        let (tx, rx) = std::sync::mpsc::channel();
        platform.request_access(Box::new(move |granted| {
            let _ = tx.send(granted);
        }));

        assert_eq!(
            rx.recv_timeout(std::time::Duration::from_secs(5)),
            Ok(false)
        );
        assert_eq!(platform.authorization_status(), AuthorizationStatus::Denied);
        assert_eq!(platform.probe().prompt_count(), 1);
    }

    #[test]
    fn running_publishes_and_clears_preview() {
        let mut platform = SimulatedPlatform::new();
        let preview = platform.preview().unwrap();

        platform.start_running().unwrap();
        let frame = preview.latest().expect("frame while running");
        assert_eq!((frame.width, frame.height), (SIM_FRAME_WIDTH, SIM_FRAME_HEIGHT));

        platform.stop_running();
        assert!(preview.latest().is_none());
        assert!(!platform.is_running());
    }
}
