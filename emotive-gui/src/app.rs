//! Construction and user actions of [`EmotiveApp`].

use std::{
    path::PathBuf,
    sync::{Arc, mpsc},
    time::{Duration, Instant},
};

use egui::{ColorImage, Context as EguiContext, TextureHandle, TextureOptions};
use emotive_core::{DetectorBackend, OnnxEmotionAnalyzer};
use emotive_utils::{AppConfig, NokhwaOpener, configure_telemetry};
use image::RgbImage;
use log::info;

use crate::{
    core::{
        capture::{CaptureHandle, CaptureRequest},
        screenshot::{ensure_screenshot_dir, save_screenshot, saved_status},
        speech::SpeechNotifier,
    },
    theme,
    types::{
        EmotiveApp, FaceCard, FrameUpdate, LiveControls, Services, SessionState, ThemeMode,
        UiMessage,
    },
};

pub const STATUS_STOPPED: &str = "Status: Stopped";
pub const STATUS_WAITING: &str = "Status: Waiting for camera release";

/// Repaint interval while a stopped worker is still winding down.
const RETIRE_POLL: Duration = Duration::from_millis(20);

impl EmotiveApp {
    /// Creates a new `EmotiveApp` with the real camera, models and speech tool.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = AppConfig::load();
        let services = Services {
            opener: Arc::new(NokhwaOpener {
                width: config.capture.frame_width,
                height: config.capture.frame_height,
            }),
            analyzer: Arc::new(OnnxEmotionAnalyzer::new(&config.models, &config.detection)),
            speech: Arc::new(SpeechNotifier::from_settings(&config.speech)),
        };
        Self::with_services(&cc.egui_ctx, config, services)
    }

    /// Creates an app around explicit collaborators.
    pub fn with_services(ctx: &EguiContext, config: AppConfig, services: Services) -> Self {
        configure_telemetry(config.telemetry.enabled, config.telemetry.level_filter());
        if config.telemetry.enabled {
            info!(
                "Telemetry logging enabled (level={:?})",
                config.telemetry.level_filter()
            );
        }
        ensure_screenshot_dir(&config.screenshots.directory);

        let session = SessionState {
            running: false,
            camera_index: config.capture.default_camera,
            backend: DetectorBackend::default(),
            fps: 0.0,
            theme: ThemeMode::default(),
            fullscreen: false,
            speech_enabled: config.speech.enabled,
        };
        theme::apply(ctx, session.theme);

        let controls = Arc::new(LiveControls::new(session.backend, session.speech_enabled));
        let (ui_tx, ui_rx) = mpsc::channel();

        Self {
            config,
            services,
            controls,
            session,
            status_line: STATUS_STOPPED.to_owned(),
            capture: None,
            retiring: Vec::new(),
            next_session: 1,
            video_texture: None,
            cards: Vec::new(),
            last_frame: None,
            ui_tx,
            ui_rx,
            pending_restart: None,
            texture_seq: 0,
        }
    }

    /// Start capturing from the selected camera. No-op while running.
    ///
    /// If a stopped worker still holds the camera, the start is deferred
    /// until it has exited.
    pub fn start_capture(&mut self, ctx: &EguiContext) {
        if self.capture.is_some() {
            return;
        }
        if !self.reap_retired() {
            self.pending_restart = Some(Instant::now());
            self.status_line = STATUS_WAITING.to_owned();
            ctx.request_repaint_after(RETIRE_POLL);
            return;
        }
        self.pending_restart = None;

        let session = self.next_session;
        self.next_session += 1;
        self.last_frame = None;
        self.session.fps = 0.0;

        let request = CaptureRequest {
            session,
            camera_index: self.session.camera_index,
            settings: self.config.capture.clone(),
            opener: Arc::clone(&self.services.opener),
            analyzer: Arc::clone(&self.services.analyzer),
            controls: Arc::clone(&self.controls),
            speech: Arc::clone(&self.services.speech),
            sink: self.ui_tx.clone(),
            repaint: Some(ctx.clone()),
        };

        match CaptureHandle::start(request) {
            Ok(handle) => {
                self.capture = Some(handle);
                self.session.running = true;
                self.status_line = self.running_status();
            }
            Err(err) => {
                self.session.running = false;
                self.status_line = err.status_line();
            }
        }
    }

    /// Stop capturing and clear the video and cards.
    ///
    /// The worker is signalled, not joined; it releases the camera once its
    /// current iteration ends and is reaped by [`EmotiveApp::reap_retired`].
    pub fn stop_capture(&mut self) {
        if let Some(handle) = self.capture.take() {
            handle.request_stop();
            self.retiring.push(handle);
        }
        self.reap_retired();
        self.pending_restart = None;
        self.session.running = false;
        self.session.fps = 0.0;
        self.video_texture = None;
        self.cards.clear();
        self.status_line = STATUS_STOPPED.to_owned();
    }

    /// Move to the next candidate camera; a running session is restarted on
    /// it after a short pause.
    pub fn cycle_camera(&mut self) {
        let next = self.config.capture.next_camera(self.session.camera_index);
        let was_running = self.capture.is_some();
        if was_running {
            self.stop_capture();
            self.pending_restart = Some(Instant::now() + self.config.capture.restart_pause());
        }
        self.session.camera_index = next;
        self.status_line = format!("Status: Camera switched to {next}");
        info!("Camera switched to {next}");
    }

    /// Start the deferred restart once its pause has elapsed.
    pub fn poll_pending_restart(&mut self, ctx: &EguiContext) {
        let Some(due) = self.pending_restart else {
            return;
        };
        let now = Instant::now();
        if now >= due {
            self.pending_restart = None;
            self.start_capture(ctx);
        } else {
            ctx.request_repaint_after(due - now);
        }
    }

    pub fn set_backend(&mut self, backend: DetectorBackend) {
        self.session.backend = backend;
        self.controls.set_backend(backend);
        self.status_line = format!("Status: Backend set to {backend}");
        info!("Detector backend set to {backend}");
    }

    pub fn set_speech_enabled(&mut self, enabled: bool) {
        self.session.speech_enabled = enabled;
        self.controls.set_speech_enabled(enabled);
    }

    pub fn toggle_theme(&mut self, ctx: &EguiContext) {
        self.session.theme = self.session.theme.toggled();
        theme::apply(ctx, self.session.theme);
    }

    pub fn toggle_fullscreen(&mut self, ctx: &EguiContext) {
        self.session.fullscreen = !self.session.fullscreen;
        let fullscreen = self.session.fullscreen;
        ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(fullscreen));
        ctx.send_viewport_cmd(egui::ViewportCommand::Decorations(!fullscreen));
    }

    /// Save the latest annotated frame and report the outcome in the status line.
    pub fn take_screenshot(&mut self) -> Option<PathBuf> {
        match save_screenshot(
            self.last_frame.as_deref(),
            &self.config.screenshots.directory,
        ) {
            Ok(path) => {
                self.status_line = saved_status(&path);
                Some(path)
            }
            Err(err) => {
                self.status_line = err.status_line();
                None
            }
        }
    }

    /// Drain worker messages into UI state.
    pub fn poll_worker(&mut self, ctx: &EguiContext) {
        let mut updated = false;
        while let Ok(message) = self.ui_rx.try_recv() {
            self.handle_message(ctx, message);
            updated = true;
        }
        if updated {
            ctx.request_repaint();
        }
    }

    pub fn handle_message(&mut self, ctx: &EguiContext, message: UiMessage) {
        match message {
            UiMessage::Frame(update) => self.apply_frame_update(ctx, update),
            UiMessage::Stopped { session } => {
                // A worker that exits on its own (not via stop) leaves a dead handle.
                if self.current_session() == Some(session)
                    && !self.capture.as_ref().is_some_and(CaptureHandle::is_running)
                {
                    self.stop_capture();
                }
                self.reap_retired();
            }
        }
    }

    fn apply_frame_update(&mut self, ctx: &EguiContext, update: FrameUpdate) {
        if self.current_session() != Some(update.session) {
            return;
        }
        self.session.fps = update.fps;
        self.last_frame = Some(update.frame);

        let image = color_image(&update.display);
        match &mut self.video_texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.video_texture =
                    Some(ctx.load_texture("emotive-video", image, TextureOptions::LINEAR));
            }
        }

        let cards = update
            .cards
            .iter()
            .map(|card| FaceCard {
                texture: self.load_texture(ctx, &card.thumbnail),
                emotion_text: card.emotion_text(),
                probability_text: card.probability_text(),
            })
            .collect();
        self.cards = cards;
    }

    fn load_texture(&mut self, ctx: &EguiContext, image: &RgbImage) -> TextureHandle {
        let name = format!("emotive-card-{}", self.texture_seq);
        self.texture_seq = self.texture_seq.wrapping_add(1);
        ctx.load_texture(name, color_image(image), TextureOptions::LINEAR)
    }

    /// Tear down a session whose worker ended without being asked to.
    pub fn reap_finished_capture(&mut self) {
        if self
            .capture
            .as_ref()
            .is_some_and(|handle| !handle.is_running())
        {
            self.stop_capture();
        }
    }

    /// Drop stopped workers that have exited. Returns `true` when none are
    /// left.
    pub fn reap_retired(&mut self) -> bool {
        self.retiring.retain(|handle| !handle.is_finished());
        self.retiring.is_empty()
    }

    /// Keep repainting until every stopped worker has been reaped.
    pub fn poll_retired(&mut self, ctx: &EguiContext) {
        if !self.reap_retired() {
            ctx.request_repaint_after(RETIRE_POLL);
        }
    }

    pub fn current_session(&self) -> Option<u64> {
        self.capture.as_ref().map(CaptureHandle::session)
    }

    pub fn is_running(&self) -> bool {
        self.session.running
    }

    fn running_status(&self) -> String {
        format!(
            "Status: Running (camera {}, backend {})",
            self.session.camera_index, self.session.backend
        )
    }

    /// Stop everything before the window closes.
    pub fn shutdown(&mut self) {
        self.stop_capture();
        for mut handle in self.retiring.drain(..) {
            handle.stop();
        }
        self.services.speech.shutdown();
    }
}

fn color_image(image: &RgbImage) -> ColorImage {
    let size = [image.width() as usize, image.height() as usize];
    ColorImage::from_rgb(size, image.as_raw())
}
