use anyhow::{Context, Result};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ringbuf::traits::{Observer, Producer};
use ringbuf::HeapProd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Samples pushed per tick of the tone thread (10ms at 48kHz).
const CHUNK_DIVISOR: u32 = 100;

/// Fixed so two generators at the same frequency produce the same samples.
const NOISE_SEED: u64 = 42;

/// Sine oscillator with a faint noise floor so the display has something
/// to show away from the tone.
pub struct ToneGenerator {
    freq: f32,
    sample_rate: u32,
    phase: f32,
    rng: StdRng,
}

impl ToneGenerator {
    pub fn new(freq: f32, sample_rate: u32) -> Self {
        Self {
            freq,
            sample_rate,
            phase: 0.0,
            rng: StdRng::seed_from_u64(NOISE_SEED),
        }
    }

    pub fn freq(&self) -> f32 {
        self.freq
    }

    pub fn fill(&mut self, out: &mut [f32]) {
        let step = self.freq / self.sample_rate as f32;
        for sample in out.iter_mut() {
            let noise: f32 = self.rng.random_range(-1.0..1.0);
            *sample = 0.5 * (2.0 * std::f32::consts::PI * self.phase).sin() + 1e-4 * noise;
            self.phase = (self.phase + step).fract();
        }
    }
}

/// Feeds `prod` with a tone at roughly real-time speed until `run_flag` drops.
pub fn spawn_tone(
    mut generator: ToneGenerator,
    mut prod: HeapProd<f32>,
    run_flag: Arc<AtomicBool>,
) -> Result<thread::JoinHandle<()>> {
    info!("Generating {} Hz test tone", generator.freq());
    let chunk = (generator.sample_rate / CHUNK_DIVISOR) as usize;
    let tick = Duration::from_millis(1000 / CHUNK_DIVISOR as u64);

    thread::Builder::new()
        .name("spectraplot-tone".into())
        .spawn(move || {
            let mut buffer = vec![0.0f32; chunk];
            while run_flag.load(Ordering::Relaxed) {
                if prod.vacant_len() >= chunk {
                    generator.fill(&mut buffer);
                    prod.push_slice(&buffer);
                }
                thread::sleep(tick);
            }
        })
        .context("Failed to spawn tone thread")
}
