use eframe::egui;
use egui::{Color32, CornerRadius, Stroke};

pub struct AppTheme {
    pub is_dark: bool,
    pub background: Color32,
    pub card_background: Color32,
    pub code_background: Color32,
    pub text: Color32,
    pub secondary_text: Color32,
    pub highlight: Color32,
    pub accent: Color32,
    pub separator: Color32,
    pub accepted: Color32,
    pub error: Color32,
    pub score_high: Color32,
    pub score_medium: Color32,
    pub score_low: Color32,
    pub tag_background: Color32,
    pub tag_text: Color32,
    pub button_background: Color32,
    pub button_foreground: Color32,
    pub button_active_background: Color32,
    pub button_hover_background: Color32,
}

impl AppTheme {
    pub fn dark() -> Self {
        Self {
            is_dark: true,
            background: Color32::from_rgb(18, 18, 18),
            card_background: Color32::from_rgb(30, 30, 30),
            code_background: Color32::from_rgb(45, 45, 45),
            text: Color32::from_rgb(240, 240, 240),
            secondary_text: Color32::from_rgb(180, 180, 180),
            highlight: Color32::from_rgb(244, 128, 36), // SO orange
            accent: Color32::from_rgb(100, 181, 246),
            separator: Color32::from_rgb(60, 60, 60),
            accepted: Color32::from_rgb(76, 175, 80),
            error: Color32::from_rgb(239, 83, 80),
            score_high: Color32::from_rgb(76, 175, 80),
            score_medium: Color32::from_rgb(255, 193, 7),
            score_low: Color32::from_rgb(158, 158, 158),
            tag_background: Color32::from_rgb(40, 55, 70),
            tag_text: Color32::from_rgb(160, 200, 235),
            button_background: Color32::from_rgb(66, 66, 66),
            button_foreground: Color32::from_rgb(240, 240, 240),
            button_active_background: Color32::from_rgb(244, 128, 36),
            button_hover_background: Color32::from_rgb(80, 80, 80),
        }
    }

    pub fn light() -> Self {
        Self {
            is_dark: false,
            background: Color32::from_rgb(245, 245, 245),
            card_background: Color32::from_rgb(255, 255, 255),
            code_background: Color32::from_rgb(236, 236, 236),
            text: Color32::from_rgb(20, 20, 20),
            secondary_text: Color32::from_rgb(90, 90, 90),
            highlight: Color32::from_rgb(220, 105, 20),
            accent: Color32::from_rgb(20, 100, 200),
            separator: Color32::from_rgb(200, 200, 200),
            accepted: Color32::from_rgb(30, 110, 40),
            error: Color32::from_rgb(190, 40, 40),
            score_high: Color32::from_rgb(30, 110, 40),
            score_medium: Color32::from_rgb(190, 130, 0),
            score_low: Color32::from_rgb(80, 80, 80),
            tag_background: Color32::from_rgb(225, 236, 244),
            tag_text: Color32::from_rgb(57, 115, 157),
            button_background: Color32::from_rgb(235, 235, 235),
            button_foreground: Color32::from_rgb(20, 20, 20),
            button_active_background: Color32::from_rgb(220, 105, 20),
            button_hover_background: Color32::from_rgb(210, 210, 210),
        }
    }

    pub fn for_mode(is_dark: bool) -> Self {
        if is_dark {
            Self::dark()
        } else {
            Self::light()
        }
    }

    pub fn apply_to_ctx(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();

        style.visuals.dark_mode = self.is_dark;
        style.visuals.panel_fill = self.background;
        style.visuals.window_fill = self.card_background;
        style.visuals.window_stroke = Stroke::new(1.0, self.separator);
        style.visuals.extreme_bg_color = self.code_background;
        style.visuals.widgets.noninteractive.bg_fill = self.card_background;
        style.visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text);

        style.visuals.widgets.inactive.bg_fill = self.button_background;
        style.visuals.widgets.inactive.weak_bg_fill = self.button_background;
        style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.active.bg_fill = self.button_active_background;
        style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.hovered.bg_fill = self.button_hover_background;
        style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.button_foreground);

        style.visuals.selection.bg_fill = self.highlight;
        style.visuals.selection.stroke = Stroke::new(1.0, self.highlight);
        style.visuals.hyperlink_color = self.accent;

        style.visuals.window_corner_radius = CornerRadius::same(8);
        style.visuals.menu_corner_radius = CornerRadius::same(6);
        style.visuals.widgets.noninteractive.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.inactive.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.hovered.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.active.corner_radius = CornerRadius::same(4);

        // Light backgrounds need a heavier shadow to separate cards
        let (popup_alpha, window_alpha) = if self.is_dark { (50, 40) } else { (30, 20) };
        style.visuals.popup_shadow = egui::epaint::Shadow {
            offset: [2, 2],
            blur: 8,
            spread: 1,
            color: Color32::from_rgba_premultiplied(0, 0, 0, popup_alpha),
        };
        style.visuals.window_shadow = egui::epaint::Shadow {
            offset: [3, 3],
            blur: 12,
            spread: 2,
            color: Color32::from_rgba_premultiplied(0, 0, 0, window_alpha),
        };

        ctx.set_style(style);
    }

    /// Vote count color. Scores on Q&A sites are much smaller than link
    /// aggregator points, hence the low thresholds.
    pub fn score_color(&self, score: i32) -> Color32 {
        if score >= 100 {
            self.score_high
        } else if score >= 10 {
            self.score_medium
        } else {
            self.score_low
        }
    }

    pub fn card_stroke(&self, is_accepted: bool) -> Stroke {
        if is_accepted {
            Stroke::new(1.5, self.accepted)
        } else {
            Stroke::new(1.0, self.separator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_thresholds() {
        let theme = AppTheme::dark();
        assert_eq!(theme.score_color(0), theme.score_low);
        assert_eq!(theme.score_color(10), theme.score_medium);
        assert_eq!(theme.score_color(250), theme.score_high);
    }

    #[test]
    fn accepted_cards_get_accent_border() {
        let theme = AppTheme::for_mode(false);
        assert!(!theme.is_dark);
        assert_eq!(theme.card_stroke(true).color, theme.accepted);
        assert_eq!(theme.card_stroke(false).color, theme.separator);
    }
}
