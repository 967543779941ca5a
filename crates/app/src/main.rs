use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use cpal::traits::{DeviceTrait, HostTrait};
use log::info;
use spectraplot_core::constants::NYQUIST_HZ;
use spectraplot_core::{NullSurface, SpectrumPipeline};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

mod audio;
mod config;
#[cfg(feature = "gui")]
mod gui;
mod tone;

use audio::{AudioEngine, Source};
use config::AppConfig;

/// Plot size assumed by the headless monitor.
const MONITOR_WIDTH: f32 = 1000.0;
const MONITOR_HEIGHT: f32 = 400.0;

#[derive(Parser)]
#[command(name = "spectraplot")]
#[command(about = "Spectraplot: real-time spectrum analyzer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available input devices
    List,
    #[cfg(feature = "gui")]
    /// Launch the graphical interface
    Gui {
        #[arg(short, long)]
        input: Option<String>,
        /// Analyze a synthetic tone at this frequency instead of a device
        #[arg(short, long)]
        tone: Option<f32>,
    },
    /// Run the display pipeline without a window (press Ctrl+C to stop)
    Monitor {
        #[arg(short, long, default_value = "default")]
        input: String,
        #[arg(short, long)]
        tone: Option<f32>,
        /// Force a logarithmic frequency axis
        #[arg(long)]
        log: bool,
    },
}

fn source_for(input: String, tone: Option<f32>) -> Source {
    match tone {
        Some(freq) => Source::Tone(freq),
        None => Source::Device(input),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::List) => {
            list_devices()?;
        }
        Some(Commands::Monitor { input, tone, log }) => {
            monitor(source_for(input, tone), log)?;
        }
        #[cfg(feature = "gui")]
        Some(Commands::Gui { input, tone }) => {
            run_gui(input, tone)?;
        }
        #[cfg(feature = "gui")]
        None => {
            run_gui(None, None)?;
        }
        #[cfg(not(feature = "gui"))]
        None => {
            println!("GUI not available. Use 'spectraplot monitor' for headless mode.");
            println!("Compile with --features gui for GUI support.");
        }
    }

    Ok(())
}

#[cfg(feature = "gui")]
fn run_gui(input: Option<String>, tone: Option<f32>) -> Result<()> {
    let source = tone.map(Source::Tone).or_else(|| input.map(Source::Device));
    gui::run_gui(source).map_err(|e| anyhow!("GUI Error: {}", e))
}

fn monitor(source: Source, force_log: bool) -> Result<()> {
    let mut config = AppConfig::load();
    if force_log {
        config.log_scale = true;
    }

    let (tx, rx) = crossbeam_channel::bounded(4);
    let _engine = AudioEngine::start(&source, config.weighting(), tx)?;

    let mut pipeline = SpectrumPipeline::new(NYQUIST_HZ);
    config.apply_to(&mut pipeline);
    pipeline.resize(MONITOR_WIDTH, MONITOR_HEIGHT);
    let mut surface = NullSurface::default();

    println!("Spectraplot monitoring. Press Ctrl+C to stop.");

    // Graceful shutdown handling
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::Relaxed);
    })?;

    let mut last_report = Instant::now();
    while running.load(Ordering::Relaxed) {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(frame) => {
                pipeline.set_frame(&frame);
                pipeline.draw(&mut surface)?;
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                return Err(anyhow!("Analysis thread stopped unexpectedly"));
            }
        }

        if last_report.elapsed() >= Duration::from_secs(1) {
            info!(
                "{} bins displayed, loudest at {:.1} Hz ({} frames)",
                pipeline.displayed_bins(),
                pipeline.fmax(),
                surface.submitted
            );
            last_report = Instant::now();
        }
    }

    println!("Spectraplot stopped.");
    Ok(())
}

fn list_devices() -> Result<()> {
    let host = cpal::default_host();
    println!("Audio Host: {}", host.id().name());
    println!("\nInput Devices:");
    for device in host.input_devices()? {
        println!("  - {}", device.name().unwrap_or("Unknown".to_string()));
    }
    Ok(())
}
