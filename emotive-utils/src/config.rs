//! Runtime configuration for the Emotive workspace.
//!
//! Nothing here is persisted between runs. [`AppConfig::load`] starts from the
//! built-in defaults and applies a handful of environment overrides so model
//! files and the screenshot directory can be relocated without a rebuild.

use std::{env, path::PathBuf, time::Duration};

use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the YuNet face detector model path.
pub const YUNET_MODEL_ENV: &str = "EMOTIVE_YUNET_MODEL";
/// Environment variable overriding the emotion classifier model path.
pub const EMOTION_MODEL_ENV: &str = "EMOTIVE_EMOTION_MODEL";
/// Environment variable overriding the screenshot output directory.
pub const SCREENSHOT_DIR_ENV: &str = "EMOTIVE_SCREENSHOT_DIR";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub capture: CaptureSettings,
    pub detection: DetectionSettings,
    pub models: ModelPaths,
    pub speech: SpeechSettings,
    pub screenshots: ScreenshotSettings,
    pub telemetry: TelemetrySettings,
}

impl AppConfig {
    /// Build the effective configuration: defaults plus environment overrides.
    pub fn load() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    /// Apply overrides from a key lookup. Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        if let Some(path) = non_blank(YUNET_MODEL_ENV) {
            self.models.face_detector = PathBuf::from(path);
        }
        if let Some(path) = non_blank(EMOTION_MODEL_ENV) {
            self.models.emotion_classifier = PathBuf::from(path);
        }
        if let Some(path) = non_blank(SCREENSHOT_DIR_ENV) {
            self.screenshots.directory = PathBuf::from(path);
        }
    }
}

/// Camera and capture-loop pacing parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureSettings {
    /// Every frame is resized to this width before inference.
    pub frame_width: u32,
    /// Every frame is resized to this height before inference.
    pub frame_height: u32,
    /// Candidate camera indices cycled by "Switch Camera".
    pub camera_ids: Vec<u32>,
    /// Camera selected at startup.
    pub default_camera: u32,
    /// Width of the on-screen video; height follows the frame aspect ratio.
    pub display_width: u32,
    /// Pause after a failed frame read.
    pub read_retry_ms: u64,
    /// Pause at the end of every iteration.
    pub idle_pause_ms: u64,
    /// Pause between stop and restart when switching cameras mid-capture.
    pub restart_pause_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            frame_width: 1280,
            frame_height: 720,
            camera_ids: vec![0, 1, 2],
            default_camera: 0,
            display_width: 960,
            read_retry_ms: 10,
            idle_pause_ms: 10,
            restart_pause_ms: 200,
        }
    }
}

impl CaptureSettings {
    pub fn read_retry(&self) -> Duration {
        Duration::from_millis(self.read_retry_ms)
    }

    pub fn idle_pause(&self) -> Duration {
        Duration::from_millis(self.idle_pause_ms)
    }

    pub fn restart_pause(&self) -> Duration {
        Duration::from_millis(self.restart_pause_ms)
    }

    /// Next camera in the candidate list after `current`.
    ///
    /// An index that is not in the list restarts the cycle at the first entry.
    pub fn next_camera(&self, current: u32) -> u32 {
        if self.camera_ids.is_empty() {
            return current;
        }
        let next = self
            .camera_ids
            .iter()
            .position(|&id| id == current)
            .map(|pos| (pos + 1) % self.camera_ids.len())
            .unwrap_or(0);
        self.camera_ids[next]
    }
}

/// Face detector post-processing thresholds (YuNet defaults).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionSettings {
    /// Minimum confidence for a face to be kept.
    pub score_threshold: f32,
    /// IoU threshold for non-maximum suppression.
    pub nms_threshold: f32,
    /// Maximum candidates kept before NMS.
    pub top_k: usize,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            score_threshold: 0.9,
            nms_threshold: 0.3,
            top_k: 5_000,
        }
    }
}

/// Locations of the ONNX models used for inference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelPaths {
    pub face_detector: PathBuf,
    pub emotion_classifier: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            face_detector: PathBuf::from("models/face_detection_yunet_2023mar.onnx"),
            emotion_classifier: PathBuf::from("models/emotion-ferplus-8.onnx"),
        }
    }
}

/// Spoken-emotion announcements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechSettings {
    /// Initial state of the "Speech" toggle.
    pub enabled: bool,
    /// Minimum time before the same emotion is announced again.
    pub cooldown_secs: f32,
    /// Speaking rate in words per minute.
    pub rate_wpm: u32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_secs: 1.5,
            rate_wpm: 150,
        }
    }
}

impl SpeechSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f32(self.cooldown_secs.max(0.0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScreenshotSettings {
    /// Created at startup if missing.
    pub directory: PathBuf,
}

impl Default for ScreenshotSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("screenshots"),
        }
    }
}

/// Stage timing logs (see [`crate::telemetry`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TelemetrySettings {
    pub enabled: bool,
    pub level: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "debug".to_string(),
        }
    }
}

impl TelemetrySettings {
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Debug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_capture_constants() {
        let config = AppConfig::default();
        assert_eq!(
            (config.capture.frame_width, config.capture.frame_height),
            (1280, 720)
        );
        assert_eq!(config.capture.camera_ids, vec![0, 1, 2]);
        assert_eq!(config.capture.display_width, 960);
        assert_eq!(config.speech.cooldown(), Duration::from_millis(1500));
        assert_eq!(config.screenshots.directory, PathBuf::from("screenshots"));
    }

    #[test]
    fn next_camera_cycles_and_recovers_unknown_index() {
        let capture = CaptureSettings::default();
        assert_eq!(capture.next_camera(0), 1);
        assert_eq!(capture.next_camera(1), 2);
        assert_eq!(capture.next_camera(2), 0);
        assert_eq!(capture.next_camera(7), 0);
    }

    #[test]
    fn overrides_replace_paths_and_skip_blank_values() {
        let vars: HashMap<&str, &str> = [
            (YUNET_MODEL_ENV, "/opt/models/yunet.onnx"),
            (EMOTION_MODEL_ENV, "   "),
            (SCREENSHOT_DIR_ENV, "captures"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(
            config.models.face_detector,
            PathBuf::from("/opt/models/yunet.onnx")
        );
        assert_eq!(
            config.models.emotion_classifier,
            ModelPaths::default().emotion_classifier
        );
        assert_eq!(config.screenshots.directory, PathBuf::from("captures"));
    }

    #[test]
    fn partial_json_falls_back_to_section_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"speech": {"cooldown_secs": 3.0}}"#).expect("parse config");
        assert_eq!(config.speech.cooldown_secs, 3.0);
        assert_eq!(config.speech.rate_wpm, 150);
        assert_eq!(config.capture, CaptureSettings::default());
    }
}
