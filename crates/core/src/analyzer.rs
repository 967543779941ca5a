//! Turns blocks of audio samples into spectrum frames for the pipeline.

use crate::weighting::Weighting;
use anyhow::{anyhow, bail, Result};
use spectrum_analyzer::scaling::divide_by_N_sqrt;
use spectrum_analyzer::{samples_fft_to_spectrum, FrequencyLimit};

/// Smallest amplitude converted to dB, avoids `log10(0)`.
const MIN_AMPLITUDE: f32 = 1e-12;

/// One analysis frame, as fed to `SpectrumPipeline::set_data`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumFrame {
    pub centers: Vec<f32>,
    pub magnitudes_db: Vec<f32>,
    /// Frequency of the loudest bin in Hz.
    pub fmax: f32,
}

impl SpectrumFrame {
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }
}

pub struct SpectrumAnalyzer {
    sample_rate: u32,
    weighting: Weighting,
    hann_coefficients: Vec<f32>,
    windowed: Vec<f32>,
    // per-bin weighting gains, rebuilt when the weighting or bin count changes
    weights_db: Vec<f32>,
}

impl SpectrumAnalyzer {
    pub fn new(sample_rate: u32, fft_size: usize, weighting: Weighting) -> Result<Self> {
        if fft_size < 2 || !fft_size.is_power_of_two() {
            bail!("FFT size must be a power of two, got {}", fft_size);
        }

        // periodic Hann, matching the spectrum-analyzer crate
        let hann_coefficients = (0..fft_size)
            .map(|i| {
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / fft_size as f32).cos())
            })
            .collect();

        Ok(Self {
            sample_rate,
            weighting,
            hann_coefficients,
            windowed: vec![0.0; fft_size],
            weights_db: Vec::new(),
        })
    }

    pub fn fft_size(&self) -> usize {
        self.hann_coefficients.len()
    }

    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    pub fn set_weighting(&mut self, weighting: Weighting) {
        if weighting != self.weighting {
            self.weighting = weighting;
            self.weights_db.clear();
        }
    }

    /// Analyzes exactly `fft_size` samples.
    pub fn analyze(&mut self, samples: &[f32]) -> Result<SpectrumFrame> {
        if samples.len() != self.fft_size() {
            bail!(
                "expected {} samples, got {}",
                self.fft_size(),
                samples.len()
            );
        }

        for ((out, &s), &w) in self
            .windowed
            .iter_mut()
            .zip(samples)
            .zip(&self.hann_coefficients)
        {
            *out = s * w;
        }

        let spectrum = samples_fft_to_spectrum(
            &self.windowed,
            self.sample_rate,
            FrequencyLimit::All,
            Some(&divide_by_N_sqrt),
        )
        .map_err(|e| anyhow!("FFT failed: {:?}", e))?;

        let data = spectrum.data();
        let centers: Vec<f32> = data.iter().map(|(f, _)| f.val()).collect();

        if self.weights_db.len() != centers.len() {
            self.weights_db = centers.iter().map(|&f| self.weighting.gain_db(f)).collect();
        }

        let magnitudes_db: Vec<f32> = data
            .iter()
            .zip(&self.weights_db)
            .map(|((_, v), w)| 20.0 * v.val().max(MIN_AMPLITUDE).log10() + w)
            .collect();

        let fmax = magnitudes_db
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map_or(0.0, |(i, _)| centers[i]);

        Ok(SpectrumFrame {
            centers,
            magnitudes_db,
            fmax,
        })
    }
}
