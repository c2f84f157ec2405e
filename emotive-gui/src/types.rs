//! Type definitions for the Emotive GUI application.

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    time::Instant,
};

use egui::TextureHandle;
use emotive_core::{DetectorBackend, EmotionAnalyzer, FaceRegion};
use emotive_utils::{AppConfig, CameraOpener};
use image::RgbImage;

use crate::core::{capture::CaptureHandle, speech::SpeechNotifier};

/// Per-face summary produced by the capture loop.
#[derive(Debug, Clone)]
pub struct CardSummary {
    /// Crop of the un-annotated frame, at most 96x96.
    pub thumbnail: RgbImage,
    pub emotion: String,
    pub probability: f32,
    /// Region after clamping to non-negative coordinates.
    pub region: FaceRegion,
}

impl CardSummary {
    pub fn emotion_text(&self) -> String {
        format!("Emotion: {}", self.emotion)
    }

    pub fn probability_text(&self) -> String {
        format!("Prob: {:.2}%", self.probability)
    }
}

/// One processed frame, posted from the capture loop to the UI thread.
#[derive(Debug, Clone)]
pub struct FrameUpdate {
    /// Session that produced the frame; stale sessions are ignored.
    pub session: u64,
    /// Annotated frame scaled to the display width.
    pub display: RgbImage,
    /// Full-size annotated frame, kept for screenshots.
    pub frame: Arc<RgbImage>,
    pub cards: Vec<CardSummary>,
    pub fps: f32,
}

/// Messages from background workers to the UI thread.
#[derive(Debug)]
pub enum UiMessage {
    Frame(FrameUpdate),
    /// The capture worker for `session` has exited.
    Stopped { session: u64 },
}

/// Card ready for rendering.
pub struct FaceCard {
    pub texture: TextureHandle,
    pub emotion_text: String,
    pub probability_text: String,
}

impl std::fmt::Debug for FaceCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceCard")
            .field("texture", &self.texture.id())
            .field("emotion_text", &self.emotion_text)
            .field("probability_text", &self.probability_text)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

/// Controls written by the UI and read by the capture loop each iteration.
#[derive(Debug)]
pub struct LiveControls {
    backend: Mutex<DetectorBackend>,
    speech_enabled: AtomicBool,
}

impl LiveControls {
    pub fn new(backend: DetectorBackend, speech_enabled: bool) -> Self {
        Self {
            backend: Mutex::new(backend),
            speech_enabled: AtomicBool::new(speech_enabled),
        }
    }

    pub fn backend(&self) -> DetectorBackend {
        *self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_backend(&self, backend: DetectorBackend) {
        *self.backend.lock().unwrap_or_else(PoisonError::into_inner) = backend;
    }

    pub fn speech_enabled(&self) -> bool {
        self.speech_enabled.load(Ordering::Relaxed)
    }

    pub fn set_speech_enabled(&self, enabled: bool) {
        self.speech_enabled.store(enabled, Ordering::Relaxed);
    }
}

/// External collaborators the app drives. Swapped for fakes in tests.
#[derive(Clone)]
pub struct Services {
    pub opener: Arc<dyn CameraOpener>,
    pub analyzer: Arc<dyn EmotionAnalyzer>,
    pub speech: Arc<SpeechNotifier>,
}

/// Presenter-visible session state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub running: bool,
    pub camera_index: u32,
    pub backend: DetectorBackend,
    /// Smoothed FPS of the latest frame; `0.0` when stopped.
    pub fps: f32,
    pub theme: ThemeMode,
    pub fullscreen: bool,
    pub speech_enabled: bool,
}

/// The main application state for the Emotive GUI.
pub struct EmotiveApp {
    pub config: AppConfig,
    pub services: Services,
    /// Shared with the running capture loop.
    pub controls: Arc<LiveControls>,
    pub session: SessionState,
    /// Line shown at the bottom of the side panel.
    pub status_line: String,
    /// Active capture worker, if any.
    pub capture: Option<CaptureHandle>,
    /// Stopped workers still finishing their last iteration.
    pub retiring: Vec<CaptureHandle>,
    /// Id handed to the next capture session.
    pub next_session: u64,
    /// Texture of the latest annotated display frame.
    pub video_texture: Option<TextureHandle>,
    pub cards: Vec<FaceCard>,
    /// Latest full-size annotated frame; survives stop for screenshots.
    pub last_frame: Option<Arc<RgbImage>>,
    pub ui_tx: mpsc::Sender<UiMessage>,
    pub ui_rx: mpsc::Receiver<UiMessage>,
    /// Deferred restart after a camera switch.
    pub pending_restart: Option<Instant>,
    pub texture_seq: u64,
}
