//! Overlay drawing on display frames.

use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use emotive_core::{DetectorBackend, FaceRegion};
use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_hollow_rect_mut, draw_text_mut},
    rect::Rect,
};
use log::warn;

pub const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const PROBABILITY_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const BANNER_COLOR: Rgb<u8> = Rgb([255, 255, 0]);

const LABEL_SCALE: f32 = 28.0;
const PROBABILITY_SCALE: f32 = 22.0;
const BANNER_ORIGIN: (i32, i32) = (20, 40);

/// Draws face boxes, labels and the FPS banner.
///
/// Text positions are baselines, matching how the labels sit above and below
/// each box.
pub struct Annotator {
    font: Option<FontRef<'static>>,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}

impl Annotator {
    /// Uses the monospace font bundled with egui. Boxes are still drawn if it
    /// cannot be parsed.
    pub fn new() -> Self {
        let font = match FontRef::try_from_slice(epaint_default_fonts::HACK_REGULAR) {
            Ok(font) => Some(font),
            Err(err) => {
                warn!("Overlay font unavailable, labels disabled: {err}");
                None
            }
        };
        Self { font }
    }

    /// Box, emotion label and probability for one face. `region` must already
    /// be clamped to non-negative coordinates.
    pub fn draw_face_overlay(
        &self,
        canvas: &mut RgbImage,
        region: FaceRegion,
        emotion: &str,
        probability: f32,
    ) {
        draw_box(canvas, region);
        let label_baseline = region.y.saturating_sub(8).max(12);
        self.draw_text(canvas, emotion, region.x, label_baseline, LABEL_SCALE, BOX_COLOR);
        let prob_baseline = region.y.saturating_add(region.h).saturating_add(30);
        self.draw_text(
            canvas,
            &format!("{probability:.2}%"),
            region.x,
            prob_baseline,
            PROBABILITY_SCALE,
            PROBABILITY_COLOR,
        );
    }

    pub fn draw_fps_banner(&self, canvas: &mut RgbImage, fps: f32, backend: DetectorBackend) {
        let (x, y) = BANNER_ORIGIN;
        self.draw_text(canvas, &fps_banner(fps, backend), x, y, LABEL_SCALE, BANNER_COLOR);
    }

    fn draw_text(
        &self,
        canvas: &mut RgbImage,
        text: &str,
        x: i32,
        baseline: i32,
        scale: f32,
        color: Rgb<u8>,
    ) {
        let Some(font) = &self.font else {
            return;
        };
        let scale = PxScale::from(scale);
        let ascent = font.as_scaled(scale).ascent().round() as i32;
        let top = baseline.saturating_sub(ascent);
        if !(0..canvas.width() as i32).contains(&x) || top >= canvas.height() as i32 {
            return;
        }
        // Two passes one pixel apart for a heavier stroke.
        for dx in 0..2 {
            draw_text_mut(canvas, color, x + dx, top, scale, font, text);
        }
    }
}

pub fn fps_banner(fps: f32, backend: DetectorBackend) -> String {
    format!("FPS: {fps:.1} ({backend})")
}

/// Two-pixel rectangle covering `(x, y)` to `(x + w, y + h)` inclusive.
///
/// Edges past the canvas are pulled in to just outside it, so arbitrarily
/// large regions draw their visible sides only.
fn draw_box(canvas: &mut RgbImage, region: FaceRegion) {
    let (max_x, max_y) = (canvas.width() as i32, canvas.height() as i32);
    let (x, y) = (region.x.clamp(0, max_x), region.y.clamp(0, max_y));
    let w = region.w.clamp(0, max_x + 1 - x) as u32;
    let h = region.h.clamp(0, max_y + 1 - y) as u32;
    draw_hollow_rect_mut(canvas, Rect::at(x, y).of_size(w + 1, h + 1), BOX_COLOR);
    if w > 2 && h > 2 {
        draw_hollow_rect_mut(canvas, Rect::at(x + 1, y + 1).of_size(w - 1, h - 1), BOX_COLOR);
    }
}
