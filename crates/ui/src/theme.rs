use egui::{Color32, CornerRadius, Stroke, Visuals};

// Plot surface colours
pub const PLOT_TOP_LIGHT: Color32 = Color32::from_rgb(217, 217, 217);
pub const PLOT_BOTTOM_LIGHT: Color32 = Color32::WHITE;
pub const PLOT_TOP_DARK: Color32 = Color32::from_rgb(40, 44, 52);
pub const PLOT_BOTTOM_DARK: Color32 = Color32::from_rgb(22, 27, 34);
pub const PLOT_BORDER: Color32 = Color32::GRAY;

pub const ACCENT_GREEN: Color32 = Color32::from_rgb(46, 160, 67);
pub const PEAK_RED: Color32 = Color32::from_rgb(248, 81, 73);

pub fn setup_custom_style(ctx: &egui::Context, dark_mode: bool) {
    let mut visuals = if dark_mode {
        let mut visuals = Visuals::dark();
        let text_color = Color32::from_rgb(240, 246, 252);

        visuals.window_fill = Color32::from_rgb(13, 17, 23);
        visuals.panel_fill = PLOT_BOTTOM_DARK;
        visuals.override_text_color = Some(text_color);
        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, text_color);
        visuals.widgets.inactive.bg_fill = Color32::from_rgb(33, 38, 45);
        visuals.widgets.hovered.bg_fill = Color32::from_rgb(48, 54, 61);
        visuals
    } else {
        let mut visuals = Visuals::light();

        visuals.panel_fill = Color32::from_rgb(248, 249, 250);
        visuals.override_text_color = Some(Color32::from_rgb(36, 41, 47));
        visuals.widgets.inactive.bg_fill = Color32::from_rgb(235, 237, 240);
        visuals.widgets.hovered.bg_fill = Color32::from_rgb(220, 223, 228);
        visuals
    };

    visuals.widgets.inactive.corner_radius = CornerRadius::same(4);
    visuals.widgets.hovered.corner_radius = CornerRadius::same(4);
    visuals.widgets.active.corner_radius = CornerRadius::same(4);
    visuals.widgets.active.bg_fill = ACCENT_GREEN;
    visuals.selection.bg_fill = ACCENT_GREEN;

    ctx.set_visuals(visuals);
}
