use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Sender, TrySendError};
use log::{info, warn};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::HeapRb;
use spectraplot_core::constants::{FFT_SIZE, SAMPLE_RATE};
use spectraplot_core::{SpectrumAnalyzer, SpectrumFrame, Weighting};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::tone::{self, ToneGenerator};

/// Where the analyzed samples come from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// Capture device by name, or "default".
    Device(String),
    /// Synthetic sine at the given frequency in Hz.
    Tone(f32),
}

/// Collects overlapping FFT blocks from a sample stream.
///
/// Every hop is half a block, so consecutive blocks share half their samples.
pub struct OverlapBuffer {
    block: Vec<f32>,
    hop: usize,
    filled: usize,
}

impl OverlapBuffer {
    pub fn new(block_size: usize) -> Self {
        Self {
            block: vec![0.0; block_size],
            hop: (block_size / 2).max(1),
            filled: 0,
        }
    }

    /// Pulls one hop from `cons` if available. Returns the block once it
    /// has been completely filled.
    pub fn pull<C: Consumer<Item = f32>>(&mut self, cons: &mut C) -> Option<&[f32]> {
        if cons.occupied_len() < self.hop {
            return None;
        }

        let len = self.block.len();
        self.block.copy_within(self.hop.., 0);
        cons.pop_slice(&mut self.block[len - self.hop..]);
        self.filled = (self.filled + self.hop).min(len);

        (self.filled == len).then_some(&self.block[..])
    }
}

/// Weighting shared with the analysis thread, stored as its index in
/// `Weighting::ALL`.
#[derive(Clone, Default)]
pub struct SharedWeighting(Arc<AtomicU8>);

impl SharedWeighting {
    pub fn new(weighting: Weighting) -> Self {
        let shared = Self::default();
        shared.set(weighting);
        shared
    }

    pub fn set(&self, weighting: Weighting) {
        let index = Weighting::ALL
            .iter()
            .position(|&w| w == weighting)
            .unwrap_or(0);
        self.0.store(index as u8, Ordering::Relaxed);
    }

    pub fn get(&self) -> Weighting {
        Weighting::ALL
            .get(self.0.load(Ordering::Relaxed) as usize)
            .copied()
            .unwrap_or_default()
    }
}

/// Capture plus analysis. Frames are delivered over the sender passed to
/// `start`; dropping the engine stops both threads.
pub struct AudioEngine {
    _input_stream: Option<cpal::Stream>,
    is_running: Arc<AtomicBool>,
    pub weighting: SharedWeighting,
}

impl AudioEngine {
    /// Starts the audio engine.
    pub fn start(
        source: &Source,
        weighting: Weighting,
        frame_sender: Sender<SpectrumFrame>,
    ) -> Result<Self> {
        // Latency management (500ms buffer)
        let buffer_size = (SAMPLE_RATE as usize) / 2;
        let rb_in = HeapRb::<f32>::new(buffer_size);
        let (mut prod_in, mut cons_in) = rb_in.split();

        let is_running = Arc::new(AtomicBool::new(true));

        let input_stream = match source {
            Source::Device(name) => {
                let host = cpal::default_host();
                info!("Audio host: {}", host.id().name());

                let input_device = if name == "default" {
                    host.default_input_device()
                        .context("No default input found")?
                } else {
                    host.input_devices()?
                        .find(|d| d.name().ok().as_deref() == Some(name.as_str()))
                        .with_context(|| format!("Input device '{}' not found", name))?
                };
                info!(
                    "Using input device: {}",
                    input_device.name().unwrap_or_default()
                );

                let config = cpal::StreamConfig {
                    channels: 1,
                    sample_rate: cpal::SampleRate(SAMPLE_RATE),
                    buffer_size: cpal::BufferSize::Default,
                };

                let stream = input_device
                    .build_input_stream(
                        &config,
                        move |data: &[f32], _| {
                            let _ = prod_in.push_slice(data);
                        },
                        |err| warn!("Input error: {}", err),
                        None,
                    )
                    .context("Failed to open input stream")?;
                Some(stream)
            }
            Source::Tone(freq) => {
                tone::spawn_tone(
                    ToneGenerator::new(*freq, SAMPLE_RATE),
                    prod_in,
                    is_running.clone(),
                )?;
                None
            }
        };

        let mut analyzer = SpectrumAnalyzer::new(SAMPLE_RATE, FFT_SIZE, weighting)?;
        let shared_weighting = SharedWeighting::new(weighting);
        let thread_weighting = shared_weighting.clone();
        let run_flag = is_running.clone();

        thread::Builder::new()
            .name("spectraplot-analysis".into())
            .spawn(move || {
                let mut overlap = OverlapBuffer::new(FFT_SIZE);

                while run_flag.load(Ordering::Relaxed) {
                    let Some(block) = overlap.pull(&mut cons_in) else {
                        thread::sleep(Duration::from_millis(2));
                        continue;
                    };

                    analyzer.set_weighting(thread_weighting.get());
                    let frame = match analyzer.analyze(block) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!("Analysis failed: {:#}", e);
                            continue;
                        }
                    };

                    match frame_sender.try_send(frame) {
                        Ok(()) | Err(TrySendError::Full(_)) => {}
                        Err(TrySendError::Disconnected(_)) => {
                            warn!("Frame receiver disconnected, stopping analysis");
                            break;
                        }
                    }
                }
                info!("Analysis thread stopped");
            })
            .context("Failed to spawn analysis thread")?;

        if let Some(stream) = &input_stream {
            stream.play()?;
        }
        info!("Audio engine started");

        Ok(Self {
            _input_stream: input_stream,
            is_running,
            weighting: shared_weighting,
        })
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.is_running.store(false, Ordering::Relaxed);
    }
}

/// Names of all capture devices on the default host.
pub fn input_device_names() -> Vec<String> {
    let host = cpal::default_host();
    match host.input_devices() {
        Ok(devices) => devices.filter_map(|d| d.name().ok()).collect(),
        Err(e) => {
            warn!("Failed to enumerate input devices: {}", e);
            Vec::new()
        }
    }
}
