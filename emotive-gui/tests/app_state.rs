mod common;

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use common::*;
use emotive_core::DetectorBackend;
use emotive_gui::{
    CardListView, ControlAction, EmotiveApp, FrameUpdate, ThemeMode, UiMessage,
    app::{STATUS_STOPPED, STATUS_WAITING},
};
use image::RgbImage;
use tempfile::TempDir;

struct Harness {
    app: EmotiveApp,
    ctx: egui::Context,
    opener: Arc<FakeOpener>,
    _dir: TempDir,
}

fn harness(opener: FakeOpener, faces: Vec<emotive_core::FaceAnalysis>) -> Harness {
    harness_with(opener, ScriptedAnalyzer::new(faces))
}

fn harness_with(opener: FakeOpener, analyzer: ScriptedAnalyzer) -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = egui::Context::default();
    let opener = Arc::new(opener);
    let analyzer = Arc::new(analyzer);
    let app = EmotiveApp::with_services(
        &ctx,
        test_config(&dir.path().join("shots")),
        services(Arc::clone(&opener), analyzer),
    );
    Harness {
        app,
        ctx,
        opener,
        _dir: dir,
    }
}

fn wait_for_frame(h: &mut Harness) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while h.app.last_frame.is_none() {
        assert!(Instant::now() < deadline, "no frame reached the UI");
        h.app.poll_worker(&h.ctx);
        thread::sleep(Duration::from_millis(5));
    }
}

/// Reap stopped workers until the camera has been released `count` times.
fn wait_for_release(h: &mut Harness, count: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while h.opener.releases() < count || !h.app.reap_retired() {
        assert!(Instant::now() < deadline, "camera never released");
        thread::sleep(Duration::from_millis(5));
    }
}

/// Drive the deferred restart until a new session is running.
fn wait_for_restart(h: &mut Harness) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !h.app.is_running() {
        assert!(Instant::now() < deadline, "capture never restarted");
        h.app.poll_pending_restart(&h.ctx);
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn starts_stopped_with_defaults() {
    let h = harness(FakeOpener::empty(), Vec::new());
    assert_eq!(h.app.status_line, STATUS_STOPPED);
    assert!(!h.app.is_running());
    assert_eq!(h.app.session.camera_index, 0);
    assert_eq!(h.app.session.backend, DetectorBackend::YuNet);
    assert_eq!(h.app.session.theme, ThemeMode::Dark);
    assert!(h.app.session.speech_enabled);
    assert!(matches!(h.app.card_list_view(), CardListView::Empty));
}

#[test]
fn starting_twice_opens_one_camera() {
    let mut h = harness(FakeOpener::with_frame(camera_frame()), Vec::new());
    h.app.start_capture(&h.ctx);
    h.app.start_capture(&h.ctx);

    assert!(h.app.is_running());
    assert_eq!(h.opener.opens(), 1);
    assert_eq!(
        h.app.status_line,
        "Status: Running (camera 0, backend yunet)"
    );
    h.app.stop_capture();
}

#[test]
fn open_failure_leaves_app_stopped() {
    let mut h = harness(FakeOpener::failing(), Vec::new());
    h.app.start_capture(&h.ctx);
    assert!(!h.app.is_running());
    assert!(h.app.capture.is_none());
    assert_eq!(h.app.status_line, "Status: Could not open camera 0");
}

#[test]
fn frames_build_cards_and_stop_clears_them() {
    let mut h = harness(FakeOpener::with_frame(camera_frame()), vec![happy_face()]);
    h.app.start_capture(&h.ctx);
    wait_for_frame(&mut h);

    assert!(h.app.video_texture.is_some());
    match h.app.card_list_view() {
        CardListView::Cards(cards) => {
            assert_eq!(cards.len(), 1);
            assert_eq!(cards[0].emotion_text, "Emotion: happy");
            assert_eq!(cards[0].probability_text, "Prob: 92.50%");
        }
        other => panic!("expected cards, got {other:?}"),
    }
    assert!(h.app.session.fps > 0.0);

    h.app.stop_capture();
    assert!(h.app.video_texture.is_none());
    assert!(h.app.cards.is_empty());
    assert_eq!(h.app.status_line, STATUS_STOPPED);
    assert!(h.app.last_frame.is_some(), "last frame kept for screenshots");
    wait_for_release(&mut h, 1);
}

#[test]
fn frames_without_faces_show_the_placeholder() {
    let mut h = harness(FakeOpener::with_frame(camera_frame()), Vec::new());
    h.app.start_capture(&h.ctx);
    wait_for_frame(&mut h);
    assert!(matches!(h.app.card_list_view(), CardListView::Placeholder));
    h.app.stop_capture();
}

#[test]
fn stale_session_frames_are_discarded() {
    let mut h = harness(FakeOpener::empty(), Vec::new());
    h.app.start_capture(&h.ctx);
    let stale = FrameUpdate {
        session: 999,
        display: RgbImage::new(4, 4),
        frame: Arc::new(RgbImage::new(4, 4)),
        cards: Vec::new(),
        fps: 12.0,
    };
    h.app.handle_message(&h.ctx, UiMessage::Frame(stale));
    assert!(h.app.video_texture.is_none());
    assert!(h.app.last_frame.is_none());
    assert_eq!(h.app.session.fps, 0.0);
    h.app.stop_capture();
}

#[test]
fn backend_selection_updates_status_and_controls() {
    let mut h = harness(FakeOpener::empty(), Vec::new());
    h.app
        .apply_action(&h.ctx, ControlAction::SetBackend(DetectorBackend::YuNetFast));
    assert_eq!(h.app.status_line, "Status: Backend set to yunet-fast");
    assert_eq!(h.app.controls.backend(), DetectorBackend::YuNetFast);
}

#[test]
fn camera_switch_while_stopped_only_changes_index() {
    let mut h = harness(FakeOpener::empty(), Vec::new());
    h.app.apply_action(&h.ctx, ControlAction::SwitchCamera);
    assert_eq!(h.app.session.camera_index, 1);
    assert_eq!(h.app.status_line, "Status: Camera switched to 1");
    assert_eq!(h.opener.opens(), 0);

    h.app.cycle_camera();
    h.app.cycle_camera();
    assert_eq!(h.app.session.camera_index, 0);
}

#[test]
fn camera_switch_while_running_restarts_on_new_camera() {
    let mut h = harness(FakeOpener::empty(), Vec::new());
    h.app.start_capture(&h.ctx);
    h.app.cycle_camera();

    assert!(!h.app.is_running());
    assert!(h.app.pending_restart.is_some());

    wait_for_restart(&mut h);
    assert_eq!(h.opener.releases(), 1);
    assert_eq!(h.opener.opens(), 2);
    assert_eq!(
        h.app.status_line,
        "Status: Running (camera 1, backend yunet)"
    );
    h.app.stop_capture();
}

#[test]
fn screenshot_requires_a_frame() {
    let mut h = harness(FakeOpener::empty(), Vec::new());
    assert!(h.app.take_screenshot().is_none());
    assert_eq!(h.app.status_line, "Status: No frame available to save");
}

#[test]
fn screenshot_saves_latest_frame() {
    let mut h = harness(FakeOpener::with_frame(camera_frame()), vec![happy_face()]);
    h.app.start_capture(&h.ctx);
    wait_for_frame(&mut h);
    h.app.stop_capture();

    let path = h.app.take_screenshot().expect("screenshot saved");
    assert!(path.exists());
    assert_eq!(
        h.app.status_line,
        format!("Status: Screenshot saved -> {}", path.display())
    );
    let saved = image::open(&path).expect("readable png").to_rgb8();
    assert_eq!(saved.dimensions(), (1280, 720));
}

#[test]
fn theme_and_speech_toggles_are_presentation_state() {
    let mut h = harness(FakeOpener::empty(), Vec::new());
    h.app.apply_action(&h.ctx, ControlAction::ToggleTheme);
    assert_eq!(h.app.session.theme, ThemeMode::Light);
    assert!(!h.ctx.style().visuals.dark_mode);

    h.app.apply_action(&h.ctx, ControlAction::SetSpeech(false));
    assert!(!h.app.session.speech_enabled);
    assert!(!h.app.controls.speech_enabled());

    h.app.apply_action(&h.ctx, ControlAction::ToggleFullscreen);
    assert!(h.app.session.fullscreen);
}

#[test]
fn stop_does_not_wait_for_a_slow_iteration() {
    let analyzer = ScriptedAnalyzer::slow(vec![happy_face()], Duration::from_millis(400));
    let mut h = harness_with(FakeOpener::with_frame(camera_frame()), analyzer);
    h.app.start_capture(&h.ctx);
    thread::sleep(Duration::from_millis(50));

    let pressed = Instant::now();
    h.app.stop_capture();
    assert!(pressed.elapsed() < Duration::from_millis(200));
    assert!(!h.app.is_running());
    assert_eq!(h.app.status_line, STATUS_STOPPED);
    assert_eq!(h.app.retiring.len(), 1);

    // The old worker still owns the camera, so a new start waits for it.
    h.app.start_capture(&h.ctx);
    assert!(!h.app.is_running());
    assert_eq!(h.app.status_line, STATUS_WAITING);
    assert_eq!(h.opener.opens(), 1);

    wait_for_restart(&mut h);
    assert_eq!(h.opener.releases(), 1);
    assert_eq!(h.opener.opens(), 2);
    assert!(h.app.retiring.is_empty());
    h.app.shutdown();
    assert_eq!(h.opener.releases(), 2);
}
