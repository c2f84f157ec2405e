use std::path::{Path, PathBuf};

use emotive_utils::{save_png, screenshot_path};
use image::RgbImage;
use log::{info, warn};

use crate::core::error::SessionError;

/// Create the screenshot directory up front. Failure is logged; saving will
/// try again and report through the status line.
pub fn ensure_screenshot_dir(dir: &Path) {
    if let Err(err) = std::fs::create_dir_all(dir) {
        warn!(
            "Unable to create screenshot directory {}: {err}",
            dir.display()
        );
    }
}

/// Write `frame` to a timestamped PNG inside `dir`.
pub fn save_screenshot(frame: Option<&RgbImage>, dir: &Path) -> Result<PathBuf, SessionError> {
    let frame = frame.ok_or(SessionError::NoFrame)?;
    let path = screenshot_path(dir);
    save_png(frame, &path).map_err(|err| SessionError::Screenshot {
        path: path.clone(),
        reason: format!("{err:#}"),
    })?;
    info!("Saved screenshot to {}", path.display());
    Ok(path)
}

pub fn saved_status(path: &Path) -> String {
    format!("Status: Screenshot saved -> {}", path.display())
}
