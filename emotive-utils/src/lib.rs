//! Common helpers shared across Emotive crates.

/// Application configuration (defaults plus environment overrides).
pub mod config;
/// Frame resizing, cropping and tensor conversion.
pub mod image_utils;
/// Screenshot naming and PNG output.
pub mod output;
/// Instrumentation helpers for optional stage timing.
pub mod telemetry;
/// Webcam frame sources.
pub mod webcam;

use anyhow::Result;
use log::LevelFilter;

pub use config::AppConfig;
pub use image_utils::{
    compute_resize_scales, crop_clamped, fit_within, resize_exact, rgb_to_bgr_chw, to_gray_tensor,
};
pub use output::{save_png, screenshot_file_name, screenshot_path};
pub use telemetry::{TimingGuard, configure as configure_telemetry, timing_guard};
pub use webcam::{CameraOpener, FrameSource, NokhwaOpener, WebcamCapture};

/// Initialize logging once for the application and test harnesses.
///
/// `RUST_LOG` takes precedence when set; otherwise `default_filter` applies.
pub fn init_logging(default_filter: LevelFilter) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter.as_str()),
    );
    builder.filter_module(telemetry::TARGET, LevelFilter::Trace);

    // A second call (e.g. from tests) finds the logger already installed.
    let _ = builder.try_init();
    Ok(())
}
