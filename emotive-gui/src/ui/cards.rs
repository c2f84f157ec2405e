//! Side panel with per-face cards and the status line.

use egui::{
    Align, Context, CornerRadius, Image, Layout, Margin, RichText, ScrollArea, SidePanel, Stroke,
    Ui,
};

use crate::{EmotiveApp, theme, types::FaceCard};

pub const NO_FACES_TEXT: &str = "No faces detected";
const PANEL_WIDTH: f32 = 360.0;

/// What the card list shows for the current state.
#[derive(Debug, Clone, Copy)]
pub enum CardListView<'a> {
    /// No frame yet (or stopped): nothing.
    Empty,
    /// A frame arrived with zero faces.
    Placeholder,
    Cards(&'a [FaceCard]),
}

impl<'a> CardListView<'a> {
    pub fn of(cards: &'a [FaceCard], has_frame: bool) -> Self {
        match (has_frame, cards.is_empty()) {
            (false, true) => Self::Empty,
            (_, true) => Self::Placeholder,
            (_, false) => Self::Cards(cards),
        }
    }
}

impl EmotiveApp {
    pub fn card_list_view(&self) -> CardListView<'_> {
        CardListView::of(&self.cards, self.video_texture.is_some())
    }

    /// Renders the right-hand panel: cards on top, status line at the bottom.
    pub fn show_side_panel(&mut self, ctx: &Context) {
        let palette = theme::palette(self.session.theme);
        SidePanel::right("emotive_cards")
            .exact_width(PANEL_WIDTH)
            .resizable(false)
            .frame(
                egui::Frame::new()
                    .fill(palette.side_panel)
                    .inner_margin(Margin::same(8)),
            )
            .show(ctx, |ui| {
                ui.with_layout(Layout::bottom_up(Align::Min), |ui| {
                    ui.label(RichText::new(&self.status_line).color(palette.text));
                    ui.separator();
                    ui.with_layout(Layout::top_down(Align::Min), |ui| {
                        ScrollArea::vertical()
                            .auto_shrink([false, false])
                            .show(ui, |ui| self.draw_cards(ui, palette));
                    });
                });
            });
    }

    fn draw_cards(&self, ui: &mut Ui, palette: theme::Palette) {
        match self.card_list_view() {
            CardListView::Empty => {}
            CardListView::Placeholder => {
                ui.add_space(6.0);
                ui.label(RichText::new(NO_FACES_TEXT).color(palette.text));
            }
            CardListView::Cards(cards) => {
                for card in cards {
                    draw_card(ui, card, palette);
                    ui.add_space(6.0);
                }
            }
        }
    }
}

fn draw_card(ui: &mut Ui, card: &FaceCard, palette: theme::Palette) {
    egui::Frame::new()
        .fill(palette.card)
        .stroke(Stroke::new(1.0, palette.outline))
        .corner_radius(CornerRadius::same(4))
        .inner_margin(Margin::same(6))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.add(Image::new(&card.texture).fit_to_exact_size(card.texture.size_vec2()));
                ui.vertical(|ui| {
                    ui.label(
                        RichText::new(&card.emotion_text)
                            .size(15.0)
                            .strong()
                            .color(palette.text),
                    );
                    ui.label(
                        RichText::new(&card.probability_text)
                            .size(13.0)
                            .color(palette.subtle_text),
                    );
                });
            });
        });
}
