//! Real-time face emotion detector.

use eframe::NativeOptions;
use emotive_gui::EmotiveApp;
use emotive_utils::init_logging;

/// Main entry point for the GUI application.
fn main() -> eframe::Result<()> {
    init_logging(log::LevelFilter::Info).expect("failed to initialize logging");
    let mut options = NativeOptions::default();
    options.viewport = options.viewport.with_inner_size([1400.0, 820.0]);

    eframe::run_native(
        "Real-time Face Emotion Detector",
        options,
        Box::new(|cc| Ok(Box::new(EmotiveApp::new(cc)))),
    )
}
