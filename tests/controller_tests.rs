// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture session controller

use camera_session::backends::camera::{
    AuthorizationStatus, DeviceId, DeviceKind, InputDevice, OutputKind, SimulatedPlatform,
    SimulatedProbe,
};
use camera_session::{CaptureError, CaptureSessionController, CaptureStatus};
use std::time::{Duration, Instant};

const ANSWER_TIMEOUT: Duration = Duration::from_secs(5);

fn start(platform: SimulatedPlatform) -> (CaptureSessionController, SimulatedProbe) {
    let probe = platform.probe();
    let controller = CaptureSessionController::new(Box::new(platform)).unwrap();
    (controller, probe)
}

fn ids(ids: &[&str]) -> Vec<DeviceId> {
    ids.iter().map(|id| DeviceId::new(*id)).collect()
}

// ===== Permission =====

#[test]
fn test_authorized_configures_without_prompt() {
    let (controller, probe) = start(SimulatedPlatform::with_builtin_devices());

    controller.check_permission();
    controller.wait_idle();

    assert_eq!(controller.status(), CaptureStatus::Configured);
    assert_eq!(probe.prompt_count(), 0);
    assert_eq!(probe.begin_count(), 1);
    assert_eq!(probe.inputs(), ids(&["sim:wide"]));
    assert_eq!(probe.outputs(), vec![OutputKind::Photo]);
    assert!(probe.is_running());
}

#[test]
fn test_not_determined_prompts_then_configures_on_accept() {
    let (controller, probe) = start(
        SimulatedPlatform::with_builtin_devices()
            .with_authorization(AuthorizationStatus::NotDetermined)
            .with_prompt_answer(true),
    );

    controller.check_permission();
    assert!(controller.wait_for_status(ANSWER_TIMEOUT, |s| *s != CaptureStatus::Unconfigured));

    assert_eq!(controller.status(), CaptureStatus::Configured);
    assert_eq!(probe.prompt_count(), 1);
    assert_eq!(probe.begin_count(), 1, "Configure runs once, after the answer");
    assert!(probe.is_running());
}

#[test]
fn test_not_determined_refused_fails_without_configuring() {
    let (controller, probe) = start(
        SimulatedPlatform::with_builtin_devices()
            .with_authorization(AuthorizationStatus::NotDetermined)
            .with_prompt_answer(false),
    );

    controller.check_permission();
    assert!(controller.wait_for_status(ANSWER_TIMEOUT, |s| *s != CaptureStatus::Unconfigured));

    assert_eq!(
        controller.status(),
        CaptureStatus::Failed(CaptureError::PermissionDenied)
    );
    assert_eq!(probe.prompt_count(), 1);
    assert_eq!(probe.begin_count(), 0);
    assert!(probe.inputs().is_empty());
}

#[test]
fn test_denied_and_restricted_fail_without_prompt() {
    for authorization in [AuthorizationStatus::Denied, AuthorizationStatus::Restricted] {
        let (controller, probe) = start(
            SimulatedPlatform::with_builtin_devices().with_authorization(authorization),
        );

        controller.check_permission();
        controller.wait_idle();

        assert_eq!(
            controller.status(),
            CaptureStatus::Failed(CaptureError::PermissionDenied),
            "{:?}",
            authorization
        );
        assert_eq!(probe.prompt_count(), 0, "Never re-prompt after {:?}", authorization);
        assert_eq!(probe.begin_count(), 0);
    }
}

#[test]
fn test_permission_check_takes_exactly_one_action() {
    for authorization in [
        AuthorizationStatus::Authorized,
        AuthorizationStatus::NotDetermined,
        AuthorizationStatus::Denied,
        AuthorizationStatus::Restricted,
    ] {
        let (controller, probe) = start(
            SimulatedPlatform::with_builtin_devices()
                .with_authorization(authorization)
                .with_prompt_answer(false),
        );

        controller.check_permission();
        assert!(controller.wait_for_status(ANSWER_TIMEOUT, |s| *s != CaptureStatus::Unconfigured));

        let configured = probe.begin_count() > 0;
        let prompted = probe.prompt_count() > 0;
        let denied_directly = !prompted && controller.status().is_permission_denied();
        let actions = [configured, prompted, denied_directly]
            .iter()
            .filter(|taken| **taken)
            .count();
        assert_eq!(actions, 1, "{:?} took {} actions", authorization, actions);
    }
}

#[test]
fn test_configure_ignored_while_denied() {
    let (controller, probe) = start(
        SimulatedPlatform::with_builtin_devices().with_authorization(AuthorizationStatus::Denied),
    );

    controller.check_permission();
    controller.configure();
    controller.wait_idle();

    assert!(controller.status().is_permission_denied());
    assert_eq!(probe.begin_count(), 0);
}

#[test]
fn test_switch_ignored_while_denied() {
    let (controller, probe) = start(
        SimulatedPlatform::with_builtin_devices().with_authorization(AuthorizationStatus::Denied),
    );

    controller.check_permission();
    controller.switch_input(InputDevice::new("sim:dual", "Back Dual Camera", DeviceKind::Dual));
    controller.wait_idle();

    assert_eq!(
        controller.status(),
        CaptureStatus::Failed(CaptureError::PermissionDenied),
        "Denied must survive an input switch"
    );
    assert_eq!(probe.begin_count(), 0);
    assert!(probe.input_attempts().is_empty());
}

#[test]
fn test_prompt_answer_racing_explicit_configure() {
    let (controller, probe) = start(
        SimulatedPlatform::with_builtin_devices()
            .with_authorization(AuthorizationStatus::NotDetermined)
            .with_prompt_answer(true),
    );

    controller.check_permission();
    controller.configure();

    // Both the explicit configure and the granted prompt configure the session
    let deadline = Instant::now() + ANSWER_TIMEOUT;
    while probe.begin_count() < 2 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    controller.wait_idle();

    assert_eq!(probe.begin_count(), 2);
    assert_eq!(probe.commit_count(), 2);
    assert_eq!(controller.status(), CaptureStatus::Configured);
    assert_eq!(probe.outputs(), vec![OutputKind::Photo]);
    assert_eq!(probe.inputs().len(), 1);
    assert_eq!(probe.start_count(), 1);
}

#[test]
fn test_recheck_after_access_granted_in_settings() {
    let (controller, probe) = start(
        SimulatedPlatform::with_builtin_devices().with_authorization(AuthorizationStatus::Denied),
    );
    controller.check_permission();
    controller.wait_idle();
    assert!(controller.status().is_permission_denied());

    probe.set_authorization(AuthorizationStatus::Authorized);
    controller.check_permission();
    controller.wait_idle();

    assert_eq!(controller.status(), CaptureStatus::Configured);
}

// ===== Configuration =====

#[test]
fn test_configure_twice_keeps_one_output_and_one_pipeline() {
    let (controller, probe) = start(SimulatedPlatform::with_builtin_devices());

    controller.configure();
    controller.configure();
    controller.wait_idle();

    assert_eq!(controller.status(), CaptureStatus::Configured);
    assert_eq!(probe.outputs(), vec![OutputKind::Photo]);
    assert_eq!(probe.inputs().len(), 1);
    assert_eq!(probe.start_count(), 1);
    assert!(probe.is_running());
}

#[test]
fn test_fallback_without_default_prefers_dual_over_ultra_wide() {
    // Discovery order puts ultra-wide first; preference order must win
    let (controller, probe) = start(
        SimulatedPlatform::new()
            .with_device(InputDevice::new("sim:ultrawide", "Ultra Wide", DeviceKind::UltraWide))
            .with_device(InputDevice::new("sim:dual", "Dual", DeviceKind::Dual)),
    );

    controller.configure();
    controller.wait_idle();

    assert_eq!(controller.status(), CaptureStatus::Configured);
    assert_eq!(probe.inputs(), ids(&["sim:dual"]));
    assert_eq!(probe.input_attempts(), ids(&["sim:dual"]));
    assert_eq!(
        controller.current_input().map(|d| d.kind),
        Some(DeviceKind::Dual)
    );
}

#[test]
fn test_failing_default_falls_back_in_preference_order() {
    let (controller, probe) = start(
        SimulatedPlatform::with_builtin_devices().with_failing_device("sim:wide"),
    );

    controller.configure();
    controller.wait_idle();

    assert_eq!(controller.status(), CaptureStatus::Configured);
    assert_eq!(probe.inputs(), ids(&["sim:dual"]));
    // Default is not retried by the fallback chain
    assert_eq!(probe.input_attempts(), ids(&["sim:wide", "sim:dual"]));
}

#[test]
fn test_no_devices_is_device_unavailable_and_commits() {
    let (controller, probe) = start(SimulatedPlatform::new());

    controller.configure();
    controller.wait_idle();

    assert_eq!(
        controller.status(),
        CaptureStatus::Failed(CaptureError::DeviceUnavailable)
    );
    assert_eq!(probe.begin_count(), 1);
    assert_eq!(probe.commit_count(), 1, "Failed attempts still commit");
    assert!(!probe.in_transaction());
    assert!(!probe.is_running());
}

#[test]
fn test_all_devices_failing_is_input_setup_failed() {
    let (controller, probe) = start(
        SimulatedPlatform::with_builtin_devices()
            .with_failing_device("sim:wide")
            .with_failing_device("sim:dual")
            .with_failing_device("sim:ultrawide"),
    );

    controller.configure();
    controller.wait_idle();

    assert_eq!(
        controller.status(),
        CaptureStatus::Failed(CaptureError::InputSetupFailed)
    );
    assert!(probe.inputs().is_empty());
    assert!(probe.outputs().is_empty());
    assert!(!probe.is_running());
}

#[test]
fn test_rejected_output_is_output_setup_failed() {
    let (controller, probe) = start(SimulatedPlatform::with_builtin_devices().with_rejected_output());

    controller.configure();
    controller.wait_idle();

    assert_eq!(
        controller.status(),
        CaptureStatus::Failed(CaptureError::OutputSetupFailed)
    );
    assert_eq!(probe.commit_count(), 1);
    assert!(!probe.is_running(), "No partial success: nothing starts");
}

#[test]
fn test_failed_output_leaves_no_input_bound() {
    let (controller, probe) = start(SimulatedPlatform::with_builtin_devices().with_rejected_output());

    controller.configure();
    controller.wait_idle();

    assert_eq!(probe.input_attempts(), ids(&["sim:wide"]));
    assert!(probe.inputs().is_empty());
    assert!(controller.current_input().is_none());
}

#[test]
fn test_start_failure_keeps_bound_input_reported() {
    let (controller, probe) = start(SimulatedPlatform::with_builtin_devices().with_start_failure());

    controller.configure();
    controller.wait_idle();

    assert_eq!(probe.inputs(), ids(&["sim:wide"]));
    assert_eq!(
        controller.current_input().map(|d| d.unique_id),
        Some(DeviceId::new("sim:wide"))
    );
}

#[test]
fn test_start_failure_is_start_capture_failed() {
    let (controller, _probe) = start(SimulatedPlatform::with_builtin_devices().with_start_failure());

    controller.configure();
    controller.wait_idle();

    assert_eq!(
        controller.status(),
        CaptureStatus::Failed(CaptureError::StartCaptureFailed)
    );
}

#[test]
fn test_discovery_excludes_kinds_outside_preference() {
    let (controller, _probe) = start(
        SimulatedPlatform::with_builtin_devices()
            .with_device(InputDevice::new("sim:ir", "IR Camera", DeviceKind::External)),
    );

    controller.configure();
    controller.wait_idle();

    let kinds: Vec<DeviceKind> = controller
        .available_input_devices()
        .iter()
        .map(|d| d.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![DeviceKind::WideAngle, DeviceKind::Dual, DeviceKind::UltraWide]
    );
}

// ===== Stop =====

#[test]
fn test_stop_when_never_configured_is_noop() {
    let (controller, probe) = start(SimulatedPlatform::with_builtin_devices());

    controller.stop();
    controller.wait_idle();

    assert_eq!(controller.status(), CaptureStatus::Unconfigured);
    assert_eq!(probe.begin_count(), 0);
    assert!(!probe.is_running());
}

#[test]
fn test_stop_is_idempotent_and_keeps_status() {
    let (controller, probe) = start(SimulatedPlatform::with_builtin_devices());
    controller.configure();
    controller.stop();
    controller.stop();
    controller.wait_idle();

    assert!(!probe.is_running());
    assert_eq!(controller.status(), CaptureStatus::Configured);
}

#[test]
fn test_drop_stops_pipeline() {
    let (controller, probe) = start(SimulatedPlatform::with_builtin_devices());
    controller.configure();
    controller.wait_idle();
    assert!(probe.is_running());

    drop(controller);
    assert!(!probe.is_running());
}

// ===== Input switching =====

#[test]
fn test_switch_to_unknown_device_leaves_no_input() {
    let (controller, probe) = start(SimulatedPlatform::with_builtin_devices());
    controller.configure();
    controller.wait_idle();

    controller.switch_input(InputDevice::new("sim:front", "Front Camera", DeviceKind::WideAngle));
    controller.wait_idle();

    assert_eq!(
        controller.status(),
        CaptureStatus::Failed(CaptureError::InputSetupFailed)
    );
    assert!(probe.inputs().is_empty(), "Old input must not stay bound");
    assert!(controller.current_input().is_none());
    assert!(!probe.in_transaction());
    assert!(!probe.is_running(), "No pipeline without an input");

    controller.stop();
    controller.wait_idle();
    assert!(!probe.is_running());
}

#[test]
fn test_switch_on_running_session() {
    let (controller, probe) = start(SimulatedPlatform::with_builtin_devices());
    controller.configure();
    controller.wait_idle();
    let begins = probe.begin_count();

    let dual = controller
        .available_input_devices()
        .into_iter()
        .find(|d| d.kind == DeviceKind::Dual)
        .unwrap();
    controller.switch_input(dual);
    controller.wait_idle();

    assert_eq!(controller.status(), CaptureStatus::Configured);
    assert_eq!(probe.inputs(), ids(&["sim:dual"]));
    assert_eq!(probe.begin_count(), begins + 1, "Switch brackets its own transaction");
    assert!(probe.is_running());
    assert_eq!(probe.outputs(), vec![OutputKind::Photo]);
}

#[test]
fn test_switch_to_failing_device() {
    let (controller, probe) = start(
        SimulatedPlatform::with_builtin_devices().with_failing_device("sim:ultrawide"),
    );
    controller.configure();
    controller.wait_idle();

    let ultra = controller
        .available_input_devices()
        .into_iter()
        .find(|d| d.kind == DeviceKind::UltraWide)
        .unwrap();
    controller.switch_input(ultra);
    controller.wait_idle();

    assert_eq!(
        controller.status(),
        CaptureStatus::Failed(CaptureError::InputSetupFailed)
    );
    assert!(probe.inputs().is_empty());
}

#[test]
fn test_switch_recovers_after_failed_switch() {
    let (controller, probe) = start(SimulatedPlatform::with_builtin_devices());
    controller.configure();
    controller.switch_input(InputDevice::new("sim:missing", "Missing", DeviceKind::Dual));
    controller.wait_idle();
    assert_eq!(
        controller.status(),
        CaptureStatus::Failed(CaptureError::InputSetupFailed)
    );

    let wide = controller.available_input_devices()[0].clone();
    controller.switch_input(wide);
    controller.wait_idle();

    assert_eq!(controller.status(), CaptureStatus::Configured);
    assert_eq!(probe.inputs(), ids(&["sim:wide"]));
    assert!(probe.is_running(), "Capture resumes on the recovered input");
}

// ===== Observation =====

#[test]
fn test_status_watch_sees_configuration() {
    let (controller, _probe) = start(SimulatedPlatform::with_builtin_devices());
    let mut watch = controller.watch_status();
    assert_eq!(*watch.borrow_and_update(), CaptureStatus::Unconfigured);

    controller.configure();
    controller.wait_idle();

    assert!(watch.has_changed().unwrap());
    assert_eq!(*watch.borrow_and_update(), CaptureStatus::Configured);
}

#[test]
fn test_preview_has_frame_while_running() {
    let (controller, _probe) = start(SimulatedPlatform::with_builtin_devices());
    let preview = controller.preview().cloned().expect("simulated preview");
    assert!(preview.latest().is_none());

    controller.configure();
    controller.wait_idle();
    assert!(preview.latest().is_some());

    controller.stop();
    controller.wait_idle();
    assert!(preview.latest().is_none());
}
