// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Probing the session setup once
//! - Running the terminal preview

use camera_session::backends::camera::{CapturePlatform, get_platform_for_type};
use camera_session::constants::DEVICE_PREFERENCE;
use camera_session::{AppError, CaptureSessionController, CaptureStatus, Config};
use std::time::Duration;

fn create_platform(config: &Config) -> Box<dyn CapturePlatform> {
    get_platform_for_type(config.backend, config.preferred_device.as_deref())
}

/// List all available cameras
pub fn list_cameras(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let platform = create_platform(config);

    let cameras = platform.discover(&DEVICE_PREFERENCE);
    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    let default = platform.default_device();
    println!("Available cameras ({}):", config.backend);
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        let marker = if default.as_ref().is_some_and(|d| d.unique_id == camera.unique_id) {
            " (default)"
        } else {
            ""
        };
        println!("  [{}] {}{}", index, camera.display_name, marker);
        println!("      Kind: {}", camera.kind);
        println!("      Id:   {}", camera.unique_id);
        println!();
    }
    println!("Authorization: {:?}", platform.authorization_status());

    Ok(())
}

/// Run the permission check and one configuration attempt, then report
pub fn probe(config: &Config, timeout_secs: u64) -> Result<(), Box<dyn std::error::Error>> {
    let controller = CaptureSessionController::new(create_platform(config))?;

    controller.check_permission();
    controller.wait_idle();
    // A permission prompt answers asynchronously
    let settled = controller.wait_for_status(Duration::from_secs(timeout_secs), |status| {
        *status != CaptureStatus::Unconfigured
    });
    if !settled {
        println!("No answer within {}s", timeout_secs);
    }

    let status = controller.status();
    println!("Status: {}", status);
    match controller.current_input() {
        Some(device) => println!("Input:  {} [{}] {}", device.display_name, device.kind, device.unique_id),
        None => println!("Input:  none"),
    }
    println!("Found:  {} device(s)", controller.available_input_devices().len());

    controller.stop();
    controller.shutdown();

    match status.error() {
        Some(error) => Err(AppError::Capture(error).into()),
        None => Ok(()),
    }
}

/// Run the terminal preview
pub fn preview(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let controller = CaptureSessionController::new(create_platform(config))?;
    let result = camera_session::terminal::run(&controller, config);
    controller.shutdown();
    result
}
