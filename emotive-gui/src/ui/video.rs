use egui::{CentralPanel, Context, Image, vec2};

use crate::{EmotiveApp, theme};

impl EmotiveApp {
    /// Renders the live annotated video, scaled down if the panel is narrower
    /// than the frame.
    pub fn show_video(&mut self, ctx: &Context) {
        let palette = theme::palette(self.session.theme);
        CentralPanel::default()
            .frame(egui::Frame::new().fill(palette.video_backdrop))
            .show(ctx, |ui| {
                let Some(texture) = &self.video_texture else {
                    return;
                };
                let size = texture.size_vec2();
                let available = ui.available_size();
                let scale = (available.x / size.x).min(available.y / size.y).min(1.0);
                ui.centered_and_justified(|ui| {
                    ui.add(Image::new(texture).fit_to_exact_size(vec2(size.x, size.y) * scale));
                });
            });
    }
}
