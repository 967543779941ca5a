//! Peak-hold tracking for the displayed bins.
//!
//! A peak pops to a new maximum at full intensity, then holds its position
//! while the intensity fades, and once dim enough slides down with a step
//! that grows every frame.

use crate::constants::{
    PEAK_DECAY_RATE, PEAK_DECAY_SCALE, PEAK_FALLOFF_INTENSITY, PEAK_FLOOR_DB, PEAK_INTENSITY_FADE,
};

/// Tunables of the decay model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakParams {
    pub decay_rate: f64,
    pub decay_scale: f64,
    pub falloff_intensity: f32,
    pub intensity_fade: f32,
    pub floor_db: f32,
}

impl Default for PeakParams {
    fn default() -> Self {
        Self {
            decay_rate: PEAK_DECAY_RATE,
            decay_scale: PEAK_DECAY_SCALE,
            falloff_intensity: PEAK_FALLOFF_INTENSITY,
            intensity_fade: PEAK_INTENSITY_FADE,
            floor_db: PEAK_FLOOR_DB,
        }
    }
}

impl PeakParams {
    /// Base fall increment in dB per frame. Negative for any rate below 1.
    pub fn base_decay(&self) -> f32 {
        (20.0 * self.decay_rate.log10() * self.decay_scale) as f32
    }
}

pub struct PeakTracker {
    params: PeakParams,
    base_decay: f32,
    peak: Vec<f32>,
    decay: Vec<f32>,
    intensity: Vec<f32>,
}

impl Default for PeakTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PeakTracker {
    pub fn new() -> Self {
        Self::with_params(PeakParams::default())
    }

    pub fn with_params(params: PeakParams) -> Self {
        Self {
            base_decay: params.base_decay(),
            params,
            peak: Vec::new(),
            decay: Vec::new(),
            intensity: Vec::new(),
        }
    }

    /// Drops all held peaks and sizes the state for `len` bins.
    pub fn reset(&mut self, len: usize) {
        self.peak.clear();
        self.peak.resize(len, self.params.floor_db);
        self.decay.clear();
        self.decay.resize(len, self.base_decay);
        self.intensity.clear();
        self.intensity.resize(len, 0.0);
    }

    /// Advances the model by one frame of decimated magnitudes.
    pub fn update(&mut self, y: &[f32]) {
        if y.len() != self.peak.len() {
            log::debug!("peak state resized {} -> {} bins", self.peak.len(), y.len());
            self.reset(y.len());
        }

        let d = self.base_decay;
        let falloff = self.params.falloff_intensity;
        let fade = self.params.intensity_fade;

        for (i, &value) in y.iter().enumerate() {
            if value > self.peak[i] {
                self.peak[i] = value;
                self.decay[i] = d;
                self.intensity[i] = 1.0;
            } else if self.intensity[i] < falloff {
                self.peak[i] += self.decay[i];
                self.decay[i] += d;
            } else {
                self.intensity[i] *= fade;
            }
        }
    }

    pub fn base_decay(&self) -> f32 {
        self.base_decay
    }

    pub fn len(&self) -> usize {
        self.peak.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peak.is_empty()
    }

    pub fn peaks(&self) -> &[f32] {
        &self.peak
    }

    pub fn decays(&self) -> &[f32] {
        &self.decay
    }

    pub fn intensities(&self) -> &[f32] {
        &self.intensity
    }
}
