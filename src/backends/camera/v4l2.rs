// SPDX-License-Identifier: GPL-3.0-only

//! Video4Linux2 capture platform
//!
//! Capture nodes under `/dev/video*` are exposed as wide-angle input
//! devices. Running the session spawns a capture thread that owns the V4L2
//! device and mmap stream and publishes the latest frame to the preview
//! handle. Linux has no permission prompt: authorization is derived from
//! whether the device nodes are accessible to this process.

use super::CapturePlatform;
use super::types::*;
use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};
use v4l::buffer::Type;
use v4l::capability::Flags;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// Preview resolution requested from the driver
const PREVIEW_WIDTH: u32 = 640;
const PREVIEW_HEIGHT: u32 = 480;
const STREAM_BUFFERS: u32 = 4;
/// Consecutive dequeue failures before the device is considered gone
const MAX_FRAME_ERRORS: u32 = 30;

/// Capture-capable V4L2 node
#[derive(Debug, Clone)]
struct CaptureNode {
    path: PathBuf,
    card: String,
}

/// Running capture thread
struct CaptureThread {
    path: PathBuf,
    stop_signal: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// V4L2-backed platform
pub struct V4l2Platform {
    preferred_device: Option<String>,
    bound_input: Option<InputDevice>,
    outputs: Vec<OutputKind>,
    transaction_depth: u32,
    capture: Option<CaptureThread>,
    preview: PreviewHandle,
}

impl std::fmt::Debug for V4l2Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V4l2Platform")
            .field("preferred_device", &self.preferred_device)
            .field("bound_input", &self.bound_input)
            .field("outputs", &self.outputs)
            .field("running", &self.capture.is_some())
            .finish()
    }
}

impl V4l2Platform {
    pub fn new(preferred_device: Option<String>) -> Self {
        Self {
            preferred_device,
            bound_input: None,
            outputs: Vec::new(),
            transaction_depth: 0,
            capture: None,
            preview: PreviewHandle::new(),
        }
    }

    fn spawn_capture(&mut self, path: PathBuf) -> PlatformResult<()> {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let (init_tx, init_rx) = std::sync::mpsc::sync_channel::<Result<(), String>>(1);

        let thread_path = path.clone();
        let thread_stop = Arc::clone(&stop_signal);
        let preview = self.preview.clone();
        let handle = thread::Builder::new()
            .name("v4l2-capture".into())
            .spawn(move || {
                if let Err(e) = capture_loop(&thread_path, &thread_stop, &preview, &init_tx) {
                    error!(path = %thread_path.display(), error = %e, "Capture loop error");
                    // Receiver may already be gone if init succeeded earlier
                    let _ = init_tx.try_send(Err(e));
                }
                preview.clear();
            })
            .map_err(PlatformError::from)?;

        match init_rx.recv() {
            Ok(Ok(())) => {
                info!(path = %path.display(), "V4L2 capture started");
                self.capture = Some(CaptureThread {
                    path,
                    stop_signal,
                    handle,
                });
                Ok(())
            }
            Ok(Err(msg)) => {
                let _ = handle.join();
                Err(PlatformError::StreamFailed(msg))
            }
            Err(_) => {
                let _ = handle.join();
                Err(PlatformError::StreamFailed(
                    "capture thread exited during startup".into(),
                ))
            }
        }
    }

    fn join_capture(&mut self) {
        if let Some(capture) = self.capture.take() {
            capture.stop_signal.store(true, Ordering::SeqCst);
            if capture.handle.join().is_err() {
                warn!("Capture thread panicked");
            }
            info!(path = %capture.path.display(), "V4L2 capture stopped");
        }
    }
}

impl Drop for V4l2Platform {
    fn drop(&mut self) {
        self.join_capture();
    }
}

/// What a committed configuration means for the live stream
#[derive(Debug, PartialEq, Eq)]
enum StreamChange {
    Keep,
    Stop,
    Restart(PathBuf),
}

/// Re-point a live stream at whatever input is bound now
fn stream_change(running: Option<&Path>, bound: Option<&Path>) -> StreamChange {
    match (running, bound) {
        (None, _) => StreamChange::Keep,
        (Some(running), Some(bound)) if running == bound => StreamChange::Keep,
        (Some(_), Some(bound)) => StreamChange::Restart(bound.to_path_buf()),
        (Some(_), None) => StreamChange::Stop,
    }
}

/// Enumerate V4L2 nodes that advertise video capture
fn capture_nodes() -> Vec<CaptureNode> {
    let mut nodes: Vec<CaptureNode> = v4l::context::enum_devices()
        .into_iter()
        .filter_map(|node| {
            let path = node.path().to_path_buf();
            let dev = Device::with_path(&path).ok()?;
            let caps = dev.query_caps().ok()?;
            // Metadata nodes share the card name but cannot stream video
            if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
                return None;
            }
            Some(CaptureNode {
                path,
                card: caps.card,
            })
        })
        .collect();
    nodes.sort_by(|a, b| a.path.cmp(&b.path));
    nodes
}

/// All `/dev/video*` paths, whether or not we can open them
fn video_node_paths() -> Vec<PathBuf> {
    std::fs::read_dir("/dev")
        .into_iter()
        .flatten()
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("video"))
                .unwrap_or(false)
        })
        .collect()
}

fn is_accessible(path: &Path) -> bool {
    let Ok(c_path) = CString::new(path.to_string_lossy().as_bytes()) else {
        return false;
    };
    // SAFETY: c_path is a valid NUL-terminated string for the duration of the call
    unsafe { libc::access(c_path.as_ptr(), libc::R_OK | libc::W_OK) == 0 }
}

fn to_input_device(node: &CaptureNode) -> InputDevice {
    InputDevice::new(
        node.path.to_string_lossy(),
        node.card.clone(),
        DeviceKind::WideAngle,
    )
}

fn pixel_format_for(fourcc: FourCC) -> Option<PixelFormat> {
    if fourcc == FourCC::new(b"YUYV") {
        Some(PixelFormat::Yuyv)
    } else if fourcc == FourCC::new(b"GREY") {
        Some(PixelFormat::Gray8)
    } else if fourcc == FourCC::new(b"RGB3") {
        Some(PixelFormat::Rgb24)
    } else {
        None
    }
}

/// Capture loop running on its own thread
///
/// Reports stream setup through `init_tx`, then keeps the preview slot
/// filled until `stop_signal` is raised.
fn capture_loop(
    path: &Path,
    stop_signal: &AtomicBool,
    preview: &PreviewHandle,
    init_tx: &std::sync::mpsc::SyncSender<Result<(), String>>,
) -> Result<(), String> {
    let dev = Device::with_path(path).map_err(|e| format!("Failed to open device: {}", e))?;

    let requested = Format::new(PREVIEW_WIDTH, PREVIEW_HEIGHT, FourCC::new(b"YUYV"));
    let actual = dev
        .set_format(&requested)
        .or_else(|_| dev.format())
        .map_err(|e| format!("Failed to negotiate format: {}", e))?;

    let pixel_format = pixel_format_for(actual.fourcc);
    if pixel_format.is_none() {
        warn!(fourcc = ?actual.fourcc, "Preview format not renderable; streaming without preview");
    }
    info!(
        width = actual.width,
        height = actual.height,
        fourcc = ?actual.fourcc,
        "V4L2 format configured"
    );

    let mut stream = Stream::with_buffers(&dev, Type::VideoCapture, STREAM_BUFFERS)
        .map_err(|e| format!("Failed to create stream: {}", e))?;

    let _ = init_tx.send(Ok(()));

    let mut sequence = 0u64;
    let mut frame_errors = 0u32;
    while !stop_signal.load(Ordering::SeqCst) {
        let (buf, _meta) = match stream.next() {
            Ok(frame) => frame,
            Err(e) => {
                frame_errors += 1;
                warn!(error = %e, frame_errors, "Failed to capture frame");
                if frame_errors >= MAX_FRAME_ERRORS {
                    return Err(format!("Device stopped delivering frames: {}", e));
                }
                continue;
            }
        };
        frame_errors = 0;
        sequence += 1;

        if let Some(format) = pixel_format {
            preview.publish(PreviewFrame {
                width: actual.width,
                height: actual.height,
                stride: actual.stride,
                format,
                data: Arc::from(buf),
                sequence,
            });
        }
    }

    debug!(frames = sequence, "Capture loop exiting");
    Ok(())
}

impl CapturePlatform for V4l2Platform {
    fn authorization_status(&self) -> AuthorizationStatus {
        let nodes = video_node_paths();
        if nodes.is_empty() || nodes.iter().any(|p| is_accessible(p)) {
            AuthorizationStatus::Authorized
        } else {
            AuthorizationStatus::Denied
        }
    }

    fn request_access(&self, callback: AccessCallback) {
        // No interactive prompt exists; answer with the current state
        let granted = self.authorization_status() == AuthorizationStatus::Authorized;
        thread::spawn(move || callback(granted));
    }

    fn discover(&self, kinds: &[DeviceKind]) -> Vec<InputDevice> {
        capture_nodes()
            .iter()
            .map(to_input_device)
            .filter(|d| kinds.contains(&d.kind))
            .collect()
    }

    fn default_device(&self) -> Option<InputDevice> {
        let nodes = capture_nodes();
        let preferred = self
            .preferred_device
            .as_deref()
            .and_then(|wanted| nodes.iter().find(|n| n.path == Path::new(wanted)));
        preferred.or_else(|| nodes.first()).map(to_input_device)
    }

    fn begin_configuration(&mut self) {
        self.transaction_depth += 1;
    }

    fn commit_configuration(&mut self) {
        self.transaction_depth = self.transaction_depth.saturating_sub(1);
        if self.transaction_depth > 0 {
            return;
        }

        let bound_path = self
            .bound_input
            .as_ref()
            .map(|d| PathBuf::from(d.unique_id.as_str()));
        let running_path = self.capture.as_ref().map(|c| c.path.as_path());
        match stream_change(running_path, bound_path.as_deref()) {
            StreamChange::Keep => {}
            StreamChange::Stop => self.join_capture(),
            StreamChange::Restart(path) => {
                self.join_capture();
                if let Err(e) = self.spawn_capture(path) {
                    error!(error = %e, "Failed to restart capture on new input");
                }
            }
        }
    }

    fn can_add_input(&self, device: &InputDevice) -> bool {
        self.bound_input.is_none() && Path::new(device.unique_id.as_str()).exists()
    }

    fn add_input(&mut self, device: &InputDevice) -> PlatformResult<()> {
        let path = Path::new(device.unique_id.as_str());
        if !path.exists() {
            return Err(PlatformError::DeviceNotFound(device.unique_id.to_string()));
        }
        if let Some(bound) = &self.bound_input {
            return Err(PlatformError::Rejected(format!(
                "session already has input {}",
                bound.unique_id
            )));
        }

        let dev = Device::with_path(path)
            .map_err(|e| PlatformError::OpenFailed(format!("{}: {}", path.display(), e)))?;
        let caps = dev
            .query_caps()
            .map_err(|e| PlatformError::OpenFailed(format!("{}: {}", path.display(), e)))?;
        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            return Err(PlatformError::Rejected(format!(
                "{} cannot capture video",
                path.display()
            )));
        }

        debug!(device = %device.unique_id, card = %caps.card, driver = %caps.driver, "Input bound");
        self.bound_input = Some(device.clone());
        Ok(())
    }

    fn remove_input(&mut self, id: &DeviceId) {
        if self.bound_input.as_ref().is_some_and(|d| &d.unique_id == id) {
            self.bound_input = None;
        }
    }

    fn inputs(&self) -> Vec<DeviceId> {
        self.bound_input
            .iter()
            .map(|d| d.unique_id.clone())
            .collect()
    }

    fn can_add_output(&self, kind: OutputKind) -> bool {
        !self.outputs.contains(&kind)
    }

    fn add_output(&mut self, kind: OutputKind) -> PlatformResult<()> {
        if self.outputs.contains(&kind) {
            return Err(PlatformError::Rejected(format!("{:?} output", kind)));
        }
        self.outputs.push(kind);
        Ok(())
    }

    fn outputs(&self) -> Vec<OutputKind> {
        self.outputs.clone()
    }

    fn start_running(&mut self) -> PlatformResult<()> {
        if self.capture.is_some() {
            return Ok(());
        }
        let Some(input) = &self.bound_input else {
            return Err(PlatformError::StreamFailed("no input bound".into()));
        };
        let path = PathBuf::from(input.unique_id.as_str());
        self.spawn_capture(path)
    }

    fn stop_running(&mut self) {
        self.join_capture();
    }

    fn is_running(&self) -> bool {
        self.capture.is_some()
    }

    fn preview(&self) -> Option<PreviewHandle> {
        Some(self.preview.clone())
    }

    fn platform_type(&self) -> PlatformType {
        PlatformType::V4l2
    }
}
