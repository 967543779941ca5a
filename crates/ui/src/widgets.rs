use egui::RichText;
use spectraplot_core::SpectrumPipeline;

use crate::theme;

/// One line under the plot: axis title, loudest frequency, displayed bins.
pub fn render_status_line(ui: &mut egui::Ui, pipeline: &SpectrumPipeline) {
    ui.horizontal(|ui| {
        ui.label(RichText::new(pipeline.magnitude_title()).strong());
        ui.separator();
        ui.label(RichText::new(format_frequency(pipeline.fmax())).color(theme::PEAK_RED));
        ui.separator();
        ui.label(
            RichText::new(format!("{} bins", pipeline.displayed_bins()))
                .size(10.0)
                .weak(),
        );
    });
}

/// Below 200 Hz one decimal is shown, above that whole hertz.
pub fn format_frequency(hz: f32) -> String {
    if hz < 2e2 {
        format!("{:.1} Hz", hz)
    } else {
        format!("{} Hz", hz.round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_frequency() {
        assert_eq!(format_frequency(43.07), "43.1 Hz");
        assert_eq!(format_frequency(1000.4), "1000 Hz");
        assert_eq!(format_frequency(199.96), "200.0 Hz");
    }
}
