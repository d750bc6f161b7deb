use egui::{Color32, CornerRadius, Stroke};

pub struct AppTheme {
    pub background: Color32,
    pub card_background: Color32,
    pub text: Color32,
    pub secondary_text: Color32,
    pub highlight: Color32,
    pub separator: Color32,
    pub score_high: Color32,
    pub score_medium: Color32,
    pub score_low: Color32,
    pub link_color: Color32,
    pub skeleton_base: Color32,
    pub skeleton_shine: Color32,
    pub button_background: Color32,
    pub button_foreground: Color32,
    pub button_hover_background: Color32,
    dark: bool,
}

impl AppTheme {
    pub fn dark() -> Self {
        Self {
            background: Color32::from_rgb(18, 18, 18),
            card_background: Color32::from_rgb(30, 30, 30),
            text: Color32::from_rgb(240, 240, 240),
            secondary_text: Color32::from_rgb(160, 160, 160),
            highlight: Color32::from_rgb(255, 102, 0), // HN orange
            separator: Color32::from_rgb(60, 60, 60),
            score_high: Color32::from_rgb(76, 175, 80),
            score_medium: Color32::from_rgb(255, 193, 7),
            score_low: Color32::from_rgb(158, 158, 158),
            link_color: Color32::from_rgb(100, 181, 246),
            skeleton_base: Color32::from_rgb(44, 44, 44),
            skeleton_shine: Color32::from_rgb(70, 70, 70),
            button_background: Color32::from_rgb(66, 66, 66),
            button_foreground: Color32::from_rgb(240, 240, 240),
            button_hover_background: Color32::from_rgb(80, 80, 80),
            dark: true,
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color32::from_rgb(245, 245, 245),
            card_background: Color32::from_rgb(255, 255, 255),
            text: Color32::from_rgb(20, 20, 20),
            secondary_text: Color32::from_rgb(100, 100, 100),
            highlight: Color32::from_rgb(235, 92, 0),
            separator: Color32::from_rgb(220, 220, 220),
            score_high: Color32::from_rgb(30, 110, 40),
            score_medium: Color32::from_rgb(190, 130, 0),
            score_low: Color32::from_rgb(80, 80, 80),
            link_color: Color32::from_rgb(20, 100, 200),
            skeleton_base: Color32::from_rgb(229, 231, 235),
            skeleton_shine: Color32::from_rgb(243, 244, 246),
            button_background: Color32::from_rgb(235, 235, 235),
            button_foreground: Color32::from_rgb(20, 20, 20),
            button_hover_background: Color32::from_rgb(210, 210, 210),
            dark: false,
        }
    }

    pub fn is_dark(&self) -> bool {
        self.dark
    }

    pub fn apply_to_ctx(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();

        style.visuals.dark_mode = self.dark;
        style.visuals.panel_fill = self.background;
        style.visuals.window_fill = self.card_background;
        style.visuals.window_stroke = Stroke::new(1.0, self.separator);
        style.visuals.extreme_bg_color = self.card_background;

        style.visuals.widgets.noninteractive.bg_fill = self.card_background;
        style.visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text);
        style.visuals.widgets.inactive.bg_fill = self.button_background;
        style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.hovered.bg_fill = self.button_hover_background;
        style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.active.bg_fill = self.highlight;
        style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.button_foreground);

        style.visuals.selection.bg_fill = self.highlight;
        style.visuals.selection.stroke = Stroke::new(1.0, self.highlight);
        style.visuals.hyperlink_color = self.link_color;

        style.visuals.window_corner_radius = CornerRadius::same(8);
        style.visuals.widgets.noninteractive.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.inactive.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.hovered.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.active.corner_radius = CornerRadius::same(4);

        ctx.set_style(style);
    }

    pub fn score_color(&self, score: u32) -> Color32 {
        if score >= 300 {
            self.score_high
        } else if score >= 100 {
            self.score_medium
        } else {
            self.score_low
        }
    }

    // Low scores keep the plain text color so titles stay readable
    pub fn title_color(&self, score: u32) -> Color32 {
        if score >= 100 {
            self.score_color(score)
        } else {
            self.text
        }
    }

    /// Skeleton fill for a shimmer phase in `0.0..=1.0`.
    pub fn skeleton_color(&self, phase: f32) -> Color32 {
        let t = phase.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color32::from_rgb(
            mix(self.skeleton_base.r(), self.skeleton_shine.r()),
            mix(self.skeleton_base.g(), self.skeleton_shine.g()),
            mix(self.skeleton_base.b(), self.skeleton_shine.b()),
        )
    }
}
