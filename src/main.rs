// SPDX-License-Identifier: GPL-3.0-only

use camera_session::Config;
use camera_session::backends::camera::PlatformType;
use camera_session::constants::{APP_ID, paths};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camera-session")]
#[command(about = "Camera capture session with a terminal live preview")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Capture backend (v4l2 or simulated); overrides the config file
    #[arg(short, long, global = true)]
    backend: Option<PlatformType>,

    /// Config file path (default: ~/.config/camera-session/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Live preview in the terminal (default)
    Preview,

    /// List available cameras
    List,

    /// Check permission, configure the session once and report the outcome
    Probe {
        /// Seconds to wait for a permission answer
        #[arg(short, long, default_value = "30")]
        timeout: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    match cli.command {
        Some(Commands::List) => {
            init_stderr_logging();
            cli::list_cameras(&config)
        }
        Some(Commands::Probe { timeout }) => {
            init_stderr_logging();
            cli::probe(&config, timeout)
        }
        Some(Commands::Preview) | None => {
            // The terminal owns stderr while the preview is up
            let _guard = init_file_logging();
            cli::preview(&config)
        }
    }
}

/// Log to stderr
///
/// Set RUST_LOG environment variable to control log level.
/// Examples: RUST_LOG=debug, RUST_LOG=camera_session=debug, RUST_LOG=info
fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();
}

/// Log to a file in the cache directory; returns the flush guard
fn init_file_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = dirs::cache_dir()?.join(APP_ID);
    std::fs::create_dir_all(&log_dir).ok()?;

    let appender = tracing_appender::rolling::never(&log_dir, paths::LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .init();

    Some(guard)
}
