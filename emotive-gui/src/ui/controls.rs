//! Top toolbar with capture, camera, backend and view controls.

use egui::{Button, Color32, ComboBox, Context, Margin, RichText, TopBottomPanel, Ui};
use emotive_core::DetectorBackend;

use crate::{EmotiveApp, theme};

/// A user command from the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Start,
    Stop,
    Screenshot,
    SwitchCamera,
    SetBackend(DetectorBackend),
    ToggleTheme,
    ToggleFullscreen,
    SetSpeech(bool),
}

impl EmotiveApp {
    /// Renders the toolbar and applies whatever was clicked.
    pub fn show_controls(&mut self, ctx: &Context) {
        let palette = theme::palette(self.session.theme);
        let mut actions = Vec::new();

        TopBottomPanel::top("emotive_controls")
            .frame(
                egui::Frame::new()
                    .fill(palette.toolbar)
                    .inner_margin(Margin::same(6)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    self.draw_buttons(ui, palette, &mut actions);
                });
            });

        for action in actions {
            self.apply_action(ctx, action);
        }
    }

    fn draw_buttons(&self, ui: &mut Ui, palette: theme::Palette, actions: &mut Vec<ControlAction>) {
        let buttons = [
            ("Start Camera", palette.start, ControlAction::Start),
            ("Stop Camera", palette.stop, ControlAction::Stop),
            ("Save Screenshot", palette.screenshot, ControlAction::Screenshot),
            ("Switch Camera", palette.switch_camera, ControlAction::SwitchCamera),
        ];
        for (label, fill, action) in buttons {
            if colored_button(ui, label, fill).clicked() {
                actions.push(action);
            }
        }

        ui.add_space(14.0);
        ui.label("Backend:");
        let current = self.session.backend;
        ComboBox::from_id_salt("emotive_backend")
            .selected_text(current.label())
            .show_ui(ui, |ui| {
                for backend in DetectorBackend::ALL {
                    if ui
                        .selectable_label(backend == current, backend.label())
                        .clicked()
                        && backend != current
                    {
                        actions.push(ControlAction::SetBackend(backend));
                    }
                }
            });

        ui.add_space(8.0);
        if colored_button(ui, "Toggle Theme", palette.theme_button).clicked() {
            actions.push(ControlAction::ToggleTheme);
        }
        if colored_button(ui, "Toggle Fullscreen", palette.fullscreen).clicked() {
            actions.push(ControlAction::ToggleFullscreen);
        }

        let mut speech = self.session.speech_enabled;
        if ui.checkbox(&mut speech, "Speech").changed() {
            actions.push(ControlAction::SetSpeech(speech));
        }
    }

    /// Apply one toolbar command.
    pub fn apply_action(&mut self, ctx: &Context, action: ControlAction) {
        match action {
            ControlAction::Start => self.start_capture(ctx),
            ControlAction::Stop => self.stop_capture(),
            ControlAction::Screenshot => {
                self.take_screenshot();
            }
            ControlAction::SwitchCamera => self.cycle_camera(),
            ControlAction::SetBackend(backend) => self.set_backend(backend),
            ControlAction::ToggleTheme => self.toggle_theme(ctx),
            ControlAction::ToggleFullscreen => self.toggle_fullscreen(ctx),
            ControlAction::SetSpeech(enabled) => self.set_speech_enabled(enabled),
        }
    }
}

fn colored_button(ui: &mut Ui, label: &str, fill: Color32) -> egui::Response {
    ui.add(Button::new(RichText::new(label).color(Color32::WHITE).size(14.0)).fill(fill))
}
