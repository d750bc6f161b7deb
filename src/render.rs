use egui::{Align, CornerRadius, Layout, RichText, Sense, Stroke, Ui};

use crate::controller::SearchState;
use crate::models::Story;
use crate::theme::AppTheme;

/// Everything one story row shows, already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryRow {
    pub id: String,
    pub title: String,
    pub score: u32,
    pub points_label: String,
    pub comments_label: String,
    pub link: Option<String>,
}

impl From<&Story> for StoryRow {
    fn from(story: &Story) -> Self {
        Self {
            id: story.id.clone(),
            title: story.title.clone(),
            score: story.score,
            points_label: format!("{} points", story.score),
            comments_label: format!("{} comments", story.comments_count),
            link: story.has_link().then(|| story.url.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Skeleton(usize),
    Stories(Vec<StoryRow>),
    Empty,
    /// Draws exactly like `Empty`; kept apart so an error message can be added.
    Failed,
}

impl ListView {
    /// Rows in API order; nothing is re-sorted.
    pub fn from_parts(loading: bool, stories: Option<&[Story]>, skeleton_rows: usize) -> Self {
        if loading {
            return ListView::Skeleton(skeleton_rows);
        }
        match stories {
            Some(stories) if !stories.is_empty() => {
                ListView::Stories(stories.iter().map(StoryRow::from).collect())
            }
            _ => ListView::Empty,
        }
    }

    pub fn build(state: SearchState, stories: &[Story], skeleton_rows: usize) -> Self {
        if state == SearchState::FetchFailed {
            return ListView::Failed;
        }
        Self::from_parts(state.is_loading(), Some(stories), skeleton_rows)
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        matches!(self, ListView::Skeleton(_))
    }

    #[cfg(test)]
    pub fn row_count(&self) -> usize {
        match self {
            ListView::Skeleton(rows) => *rows,
            ListView::Stories(rows) => rows.len(),
            ListView::Empty | ListView::Failed => 0,
        }
    }
}

/// Draws the list. Returns the URL of an outbound link the user clicked.
pub fn show_list(ui: &mut Ui, theme: &AppTheme, view: &ListView) -> Option<String> {
    match view {
        ListView::Skeleton(rows) => {
            let time = ui.input(|i| i.time);
            for index in 0..*rows {
                show_skeleton_row(ui, theme, index, time);
            }
            ui.ctx().request_repaint();
            None
        }
        ListView::Stories(rows) => {
            let mut clicked = None;
            for row in rows {
                if let Some(url) = show_story_row(ui, theme, row) {
                    clicked = Some(url);
                }
            }
            clicked
        }
        // No message for either; the list is simply left empty
        ListView::Empty | ListView::Failed => None,
    }
}

fn card(theme: &AppTheme) -> egui::Frame {
    egui::Frame::new()
        .fill(theme.card_background)
        .corner_radius(CornerRadius::same(8))
        .stroke(Stroke::new(1.0, theme.separator))
        .inner_margin(16.0)
        .outer_margin(egui::vec2(0.0, 6.0))
}

fn show_skeleton_row(ui: &mut Ui, theme: &AppTheme, index: usize, time: f64) {
    // Each row runs slightly behind the previous one so the shimmer sweeps down.
    let phase = (((time * 3.0) - index as f64 * 0.35).sin() * 0.5 + 0.5) as f32;
    let fill = theme.skeleton_color(phase);

    card(theme).show(ui, |ui| {
        let width = ui.available_width();
        for (fraction, height) in [(0.75, 22.0), (0.25, 14.0)] {
            let (rect, _) = ui.allocate_exact_size(egui::vec2(width * fraction, height), Sense::hover());
            ui.painter().rect_filled(rect, CornerRadius::same(4), fill);
            ui.add_space(10.0);
        }
    });
}

fn show_story_row(ui: &mut Ui, theme: &AppTheme, row: &StoryRow) -> Option<String> {
    let mut clicked = None;

    // Story ids keep widget ids stable when two rows share a title
    ui.push_id(&row.id, |ui| card(theme).show(ui, |ui| {
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                // Title doubles as the link when there is one
                let title = ui.add(
                    egui::Label::new(
                        RichText::new(&row.title)
                            .color(theme.title_color(row.score))
                            .size(17.0)
                            .strong(),
                    )
                    .sense(Sense::click()),
                );
                if let Some(url) = &row.link {
                    if title.clicked() {
                        clicked = Some(url.clone());
                    }
                    title.on_hover_cursor(egui::CursorIcon::PointingHand);
                }

                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(format!("▲ {}", row.points_label))
                            .color(theme.score_color(row.score))
                            .size(14.0),
                    );
                    ui.add_space(12.0);
                    ui.label(
                        RichText::new(&row.comments_label)
                            .color(theme.secondary_text)
                            .size(14.0),
                    );
                });
            });

            // Outbound arrow, right aligned
            if let Some(url) = &row.link {
                ui.with_layout(Layout::right_to_left(Align::Min), |ui| {
                    let button = ui.add(
                        egui::Button::new(RichText::new("↗").size(18.0).color(theme.link_color))
                            .corner_radius(CornerRadius::same(16))
                            .frame(false),
                    );
                    if button.on_hover_text(url.as_str()).clicked() {
                        clicked = Some(url.clone());
                    }
                });
            }
        });
    }));

    clicked
}
