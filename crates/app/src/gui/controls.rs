use eframe::egui;
use spectraplot_core::constants::NYQUIST_HZ;
use spectraplot_core::Weighting;
use spectraplot_ui::theme;

use super::app::SpectraplotApp;

impl SpectraplotApp {
    /// Renders the input selector, Start/Stop button and status.
    pub(super) fn render_source_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let running = self.engine.is_some();

            match self.tone {
                Some(freq) => {
                    ui.label(format!("Tone: {} Hz", freq));
                }
                None => {
                    ui.label("Input:");
                    ui.add_enabled_ui(!running, |ui| {
                        egui::ComboBox::from_id_salt("input_combo")
                            .selected_text(&self.selected_input)
                            .width(220.0)
                            .show_ui(ui, |ui| {
                                ui.selectable_value(
                                    &mut self.selected_input,
                                    "default".to_string(),
                                    "default",
                                );
                                for dev in &self.input_devices {
                                    ui.selectable_value(
                                        &mut self.selected_input,
                                        dev.clone(),
                                        dev,
                                    );
                                }
                            });
                    });
                }
            }

            let label = if running { "Stop" } else { "Start" };
            if ui.button(label).clicked() {
                if running {
                    self.stop_engine();
                } else {
                    self.start_engine();
                }
            }

            ui.label(egui::RichText::new(&self.status_msg).size(11.0).weak());
        });
    }

    /// Renders axis, peak, weighting and theme settings. Every change goes
    /// straight into the pipeline and marks the config dirty.
    pub(super) fn render_display_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            if ui.checkbox(&mut self.config.log_scale, "Log scale").changed() {
                if self.config.log_scale {
                    self.config.min_freq = self.config.min_freq.max(1.0);
                    self.pipeline
                        .set_frequency_range(self.config.min_freq, self.config.max_freq);
                    self.pipeline.set_log_frequency_scale();
                } else {
                    self.pipeline.set_linear_frequency_scale();
                }
                self.mark_config_dirty();
            }

            if ui.checkbox(&mut self.config.peaks_enabled, "Peaks").changed() {
                self.pipeline.set_peaks_enabled(self.config.peaks_enabled);
                self.mark_config_dirty();
            }

            ui.separator();
            ui.label("Weighting:");
            let current = self.config.weighting();
            egui::ComboBox::from_id_salt("weighting_combo")
                .selected_text(current.label())
                .show_ui(ui, |ui| {
                    for w in Weighting::ALL {
                        if ui.selectable_label(current == w, w.label()).clicked() {
                            self.set_weighting(w);
                        }
                    }
                });

            ui.separator();
            let floor = if self.config.log_scale { 1.0 } else { 0.0 };
            let max_freq = self.config.max_freq;
            let min_freq = self.config.min_freq;
            ui.label("Freq:");
            let min_changed = ui
                .add(
                    egui::DragValue::new(&mut self.config.min_freq)
                        .range(floor..=max_freq - 1.0)
                        .speed(1.0)
                        .suffix(" Hz"),
                )
                .changed();
            let max_changed = ui
                .add(
                    egui::DragValue::new(&mut self.config.max_freq)
                        .range(min_freq + 1.0..=NYQUIST_HZ)
                        .speed(10.0)
                        .suffix(" Hz"),
                )
                .changed();
            if min_changed || max_changed {
                self.pipeline
                    .set_frequency_range(self.config.min_freq, self.config.max_freq);
                self.mark_config_dirty();
            }

            ui.separator();
            let max_db = self.config.max_db;
            let min_db = self.config.min_db;
            ui.label("Level:");
            let min_changed = ui
                .add(
                    egui::DragValue::new(&mut self.config.min_db)
                        .range(-200.0..=max_db - 1.0)
                        .suffix(" dB"),
                )
                .changed();
            let max_changed = ui
                .add(
                    egui::DragValue::new(&mut self.config.max_db)
                        .range(min_db + 1.0..=50.0)
                        .suffix(" dB"),
                )
                .changed();
            if min_changed || max_changed {
                self.pipeline
                    .set_magnitude_range(self.config.min_db, self.config.max_db);
                self.mark_config_dirty();
            }

            ui.label("Baseline:");
            if ui
                .add(
                    egui::DragValue::new(&mut self.config.baseline_db)
                        .range(-200.0..=50.0)
                        .suffix(" dB"),
                )
                .changed()
            {
                self.pipeline
                    .set_baseline_data_units(self.config.baseline_db);
                self.mark_config_dirty();
            }

            ui.separator();
            if ui.checkbox(&mut self.config.dark_mode, "Dark").changed() {
                theme::setup_custom_style(ui.ctx(), self.config.dark_mode);
                self.mark_config_dirty();
            }
        });
    }

    fn set_weighting(&mut self, weighting: Weighting) {
        self.config.weighting = weighting.label().to_string();
        self.pipeline.set_weighting(weighting);
        if let Some(engine) = &self.engine {
            engine.weighting.set(weighting);
        }
        self.mark_config_dirty();
    }
}
