use crate::audio::{self, AudioEngine, Source};
use crate::config::AppConfig;
use crossbeam_channel::Receiver;
use eframe::egui;
use log::{info, warn};
use spectraplot_core::constants::NYQUIST_HZ;
use spectraplot_core::{SpectrumFrame, SpectrumPipeline};
use spectraplot_ui::{theme, visualizer, widgets, EguiSurface};
use std::time::{Duration, Instant};

/// Height reserved under the plot for the status line.
const STATUS_LINE_HEIGHT: f32 = 24.0;

/// Runs the Spectraplot GUI application.
///
/// Starts analyzing `source` right away when given, otherwise waits for the
/// user to press Start.
pub fn run_gui(source: Option<Source>) -> eframe::Result<()> {
    let config = AppConfig::load();
    let dark_mode = config.dark_mode;

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([900.0, 500.0])
        .with_min_inner_size([400.0, 250.0]);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "Spectraplot",
        options,
        Box::new(move |cc| {
            theme::setup_custom_style(&cc.egui_ctx, dark_mode);
            Ok(Box::new(SpectraplotApp::new_with_config(config, source)))
        }),
    )
}

pub(super) struct SpectraplotApp {
    pub(super) input_devices: Vec<String>,
    pub(super) selected_input: String,
    pub(super) tone: Option<f32>,
    pub(super) engine: Option<AudioEngine>,
    pub(super) frame_receiver: Option<Receiver<SpectrumFrame>>,
    pub(super) status_msg: String,
    pub(super) config: AppConfig,
    pub(super) config_dirty: bool,
    pub(super) last_config_save: Instant,
    pub(super) pipeline: SpectrumPipeline,
    pub(super) surface: EguiSurface,
    frames: Vec<SpectrumFrame>,
}

impl SpectraplotApp {
    pub(super) fn new_with_config(config: AppConfig, source: Option<Source>) -> Self {
        let input_devices = audio::input_device_names();

        let (selected_input, tone) = match &source {
            Some(Source::Device(name)) => (name.clone(), None),
            Some(Source::Tone(freq)) => (String::new(), Some(*freq)),
            None if input_devices.contains(&config.last_input) => {
                (config.last_input.clone(), None)
            }
            None => ("default".to_string(), None),
        };

        let mut pipeline = SpectrumPipeline::new(NYQUIST_HZ);
        config.apply_to(&mut pipeline);

        let mut app = Self {
            input_devices,
            selected_input,
            tone,
            engine: None,
            frame_receiver: None,
            status_msg: "Ready".to_string(),
            config,
            config_dirty: false,
            last_config_save: Instant::now(),
            pipeline,
            surface: EguiSurface::new(),
            frames: Vec::new(),
        };

        if source.is_some() {
            app.start_engine();
        }
        app
    }

    pub(super) fn source(&self) -> Source {
        match self.tone {
            Some(freq) => Source::Tone(freq),
            None => Source::Device(self.selected_input.clone()),
        }
    }

    pub(super) fn start_engine(&mut self) {
        if self.engine.is_some() {
            return;
        }

        let (tx, rx) = crossbeam_channel::bounded(4);
        match AudioEngine::start(&self.source(), self.config.weighting(), tx) {
            Ok(engine) => {
                self.engine = Some(engine);
                self.frame_receiver = Some(rx);
                self.status_msg = match self.tone {
                    Some(freq) => format!("Active (tone {} Hz)", freq),
                    None => format!("Active ({})", self.selected_input),
                };
                if self.tone.is_none() {
                    self.config.last_input = self.selected_input.clone();
                    self.save_config_now();
                }
            }
            Err(e) => {
                warn!("Failed to start audio engine: {:#}", e);
                self.status_msg = format!("Error: {}", e);
            }
        }
    }

    pub(super) fn stop_engine(&mut self) {
        if self.engine.take().is_some() {
            info!("Audio engine stopped");
        }
        self.frame_receiver = None;
        self.status_msg = "Stopped".to_string();
    }

    pub(super) fn mark_config_dirty(&mut self) {
        self.config_dirty = true;
    }

    /// Writes a dirty config at most every two seconds.
    pub(super) fn save_config(&mut self) {
        if self.config_dirty && self.last_config_save.elapsed() >= Duration::from_secs(2) {
            self.save_config_now();
        }
    }

    pub(super) fn save_config_now(&mut self) {
        self.config.save();
        self.config_dirty = false;
        self.last_config_save = Instant::now();
    }

    fn render_spectrum(&mut self, ui: &mut egui::Ui) {
        self.frames.clear();
        if let Some(rx) = &self.frame_receiver {
            self.frames.extend(rx.try_iter());
        }

        let height = (ui.available_height() - STATUS_LINE_HEIGHT).max(0.0);
        if let Err(e) = visualizer::render_spectrum(
            ui,
            &mut self.pipeline,
            &mut self.surface,
            &self.frames,
            height,
        ) {
            warn!("Spectrum draw failed: {:#}", e);
            self.status_msg = format!("Draw error: {}", e);
        }

        widgets::render_status_line(ui, &self.pipeline);
    }
}

impl eframe::App for SpectraplotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.engine.is_some() {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(500));
        }

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.add_space(4.0);
            self.render_source_controls(ui);
            ui.add_space(2.0);
            self.render_display_controls(ui);
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_spectrum(ui);
        });

        self.save_config();
    }
}

impl Drop for SpectraplotApp {
    fn drop(&mut self) {
        if self.config_dirty {
            self.config.save();
        }
    }
}
