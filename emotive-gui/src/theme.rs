//! Dark and light themes for the Emotive GUI.

use egui::{Color32, Context, CornerRadius, Margin, Stroke, Visuals};

use crate::types::ThemeMode;

/// Shared color palette used by the GUI.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub window: Color32,
    pub toolbar: Color32,
    pub video_backdrop: Color32,
    pub side_panel: Color32,
    pub card: Color32,
    pub text: Color32,
    pub subtle_text: Color32,
    pub outline: Color32,
    pub start: Color32,
    pub stop: Color32,
    pub screenshot: Color32,
    pub switch_camera: Color32,
    pub theme_button: Color32,
    pub fullscreen: Color32,
}

pub fn palette(mode: ThemeMode) -> Palette {
    match mode {
        ThemeMode::Dark => Palette {
            window: Color32::from_rgb(0x1e, 0x1e, 0x1e),
            toolbar: Color32::from_rgb(0x1e, 0x1e, 0x1e),
            video_backdrop: Color32::BLACK,
            side_panel: Color32::from_rgb(0x2b, 0x2b, 0x2b),
            card: Color32::from_rgb(0x33, 0x33, 0x33),
            text: Color32::WHITE,
            subtle_text: Color32::LIGHT_GRAY,
            outline: Color32::from_rgb(0x55, 0x55, 0x55),
            start: Color32::from_rgb(0x2e, 0x7d, 0x32),
            stop: Color32::from_rgb(0xb7, 0x1c, 0x1c),
            screenshot: Color32::from_rgb(0x15, 0x65, 0xc0),
            switch_camera: Color32::from_rgb(0x6a, 0x1b, 0x9a),
            theme_button: Color32::from_rgb(0x45, 0x5a, 0x64),
            fullscreen: Color32::from_rgb(0x00, 0x79, 0x6b),
        },
        // Button colors stay the same in both themes.
        ThemeMode::Light => Palette {
            window: Color32::from_rgb(0xf3, 0xf3, 0xf3),
            toolbar: Color32::from_rgb(0xf3, 0xf3, 0xf3),
            video_backdrop: Color32::from_rgb(0xdd, 0xdd, 0xdd),
            side_panel: Color32::from_rgb(0xe9, 0xe9, 0xe9),
            card: Color32::from_rgb(0xf7, 0xf7, 0xf7),
            text: Color32::BLACK,
            subtle_text: Color32::from_rgb(0x55, 0x55, 0x55),
            outline: Color32::from_rgb(0xb0, 0xb0, 0xb0),
            ..palette(ThemeMode::Dark)
        },
    }
}

/// Apply the theme for `mode` to the provided egui context.
pub fn apply(ctx: &Context, mode: ThemeMode) {
    let palette = palette(mode);
    let mut style = (*ctx.style()).clone();

    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(8.0, 6.0);
    style.spacing.window_margin = Margin::same(8);
    style.visuals = visuals_from_palette(mode, palette);

    ctx.set_style(style);
}

fn visuals_from_palette(mode: ThemeMode, palette: Palette) -> Visuals {
    let mut visuals = match mode {
        ThemeMode::Dark => Visuals::dark(),
        ThemeMode::Light => Visuals::light(),
    };
    visuals.override_text_color = Some(palette.text);
    visuals.panel_fill = palette.window;
    visuals.window_fill = palette.window;
    visuals.extreme_bg_color = palette.video_backdrop;
    visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, palette.outline);
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, palette.subtle_text);
    visuals.window_corner_radius = CornerRadius::same(6);
    visuals
}
