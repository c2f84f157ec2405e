use std::path::PathBuf;

use thiserror::Error;

/// User-visible failures of capture-session actions.
///
/// The `Display` text is what the status line shows after `Status: `.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Could not open camera {index}")]
    CameraOpen { index: u32, reason: String },
    #[error("Could not start capture worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
    #[error("No frame available to save")]
    NoFrame,
    #[error("Screenshot failed: {reason}")]
    Screenshot { path: PathBuf, reason: String },
}

impl SessionError {
    /// Status line text for this error.
    pub fn status_line(&self) -> String {
        format!("Status: {self}")
    }
}
