//! `eframe::App` integration.

use eframe::{App, Frame};
use egui::Context as EguiContext;
use log::info;

use crate::EmotiveApp;

impl App for EmotiveApp {
    fn update(&mut self, ctx: &EguiContext, _frame: &mut Frame) {
        self.poll_worker(ctx);
        self.reap_finished_capture();
        self.poll_retired(ctx);
        self.poll_pending_restart(ctx);

        self.show_controls(ctx);
        self.show_side_panel(ctx);
        self.show_video(ctx);

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) && self.session.fullscreen {
            self.toggle_fullscreen(ctx);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Window closing; stopping capture");
        self.shutdown();
    }
}
