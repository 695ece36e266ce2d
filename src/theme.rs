use eframe::egui::{self, Color32, CornerRadius, FontId, Frame, Margin, Stroke, TextStyle};

#[derive(Debug, Clone)]
pub struct Theme {
    pub surface_0: Color32,
    pub surface_1: Color32,
    pub surface_2: Color32,
    pub accent_primary: Color32,
    pub accent_muted: Color32,
    pub success: Color32,
    pub danger: Color32,
    pub text_primary: Color32,
    pub text_muted: Color32,
    pub border_subtle: Color32,
    pub spacing_8: f32,
    pub spacing_12: f32,
    pub radius_8: u8,
    pub radius_10: u8,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            surface_0: Color32::from_rgb(0x12, 0x14, 0x18),
            surface_1: Color32::from_rgb(0x1A, 0x1D, 0x23),
            surface_2: Color32::from_rgb(0x23, 0x28, 0x30),
            accent_primary: Color32::from_rgb(0x4C, 0x8D, 0xFF),
            accent_muted: Color32::from_rgb(0x37, 0x6F, 0xD0),
            success: Color32::from_rgb(0x2F, 0xBF, 0x71),
            danger: Color32::from_rgb(0xE5, 0x53, 0x4B),
            text_primary: Color32::from_rgb(0xE8, 0xEC, 0xF1),
            text_muted: Color32::from_rgb(0x8C, 0x96, 0xA3),
            border_subtle: Color32::from_rgba_premultiplied(255, 255, 255, 13),
            spacing_8: 8.0,
            spacing_12: 12.0,
            radius_8: 8,
            radius_10: 10,
        }
    }
}

impl Theme {
    pub fn apply_visuals(&self, ctx: &egui::Context) {
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = self.surface_1;
        visuals.override_text_color = Some(self.text_primary);
        visuals.widgets.noninteractive.bg_fill = self.surface_2;
        visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, self.border_subtle);
        visuals.widgets.inactive.bg_fill = self.surface_2;
        visuals.widgets.inactive.bg_stroke = Stroke::NONE;
        visuals.widgets.hovered.bg_fill = self.accent_muted;
        visuals.widgets.hovered.bg_stroke = Stroke::NONE;
        visuals.widgets.active.bg_fill = self.accent_primary;
        visuals.widgets.active.bg_stroke = Stroke::NONE;
        visuals.selection.bg_fill = self.accent_muted;
        visuals.hyperlink_color = self.accent_primary;
        visuals.window_fill = self.surface_1;
        visuals.window_corner_radius = CornerRadius::same(self.radius_10);
        visuals.extreme_bg_color = self.surface_0;

        let mut style = (*ctx.style()).clone();
        style.visuals = visuals;
        style.spacing.item_spacing = egui::vec2(self.spacing_8, self.spacing_8);
        style.spacing.button_padding = egui::vec2(12.0, 6.0);
        style.text_styles.insert(TextStyle::Heading, FontId::proportional(17.0));
        style.text_styles.insert(TextStyle::Body, FontId::proportional(14.0));
        style.text_styles.insert(TextStyle::Monospace, FontId::monospace(13.0));
        style.text_styles.insert(TextStyle::Small, FontId::proportional(12.0));
        ctx.set_style(style);
    }

    pub fn card_frame(&self) -> Frame {
        Frame::new()
            .fill(self.surface_2)
            .inner_margin(Margin::same(self.spacing_12 as i8))
            .corner_radius(CornerRadius::same(self.radius_10))
            .stroke(Stroke::new(1.0, self.border_subtle))
    }

    pub fn sidebar_entry_frame(&self) -> Frame {
        Frame::new()
            .fill(self.surface_2)
            .inner_margin(Margin::same(self.spacing_8 as i8))
            .corner_radius(CornerRadius::same(self.radius_8))
            .stroke(Stroke::new(1.0, self.border_subtle))
    }
}
