//! Shared constants for the spectraplot pipeline.

/// Sample rate used by the capture and analysis side (48kHz)
pub const SAMPLE_RATE: u32 = 48000;

/// Upper end of every analyzed spectrum in Hz.
pub const NYQUIST_HZ: f32 = SAMPLE_RATE as f32 / 2.0;

/// FFT block size in samples. Must be a power of two.
pub const FFT_SIZE: usize = 4096;

/// Left edge of the first bin in Hz. Kept positive so it survives a log axis.
pub const LOWEST_EDGE_HZ: f32 = 1e-10;

/// Bins at least this wide (in pixels) are displayed individually on a log axis.
pub const MIN_BIN_WIDTH_PX: f32 = 0.5;

/// Upper bound on octave pyramid depth. More levels than this is a logic bug.
pub const MAX_REBIN_LEVELS: usize = 64;

// Peak-hold model

/// Per-frame decay rate, scaled into dB by `PEAK_DECAY_SCALE`.
pub const PEAK_DECAY_RATE: f64 = 1.0 - 3e-6;

/// Turns `PEAK_DECAY_RATE` into a usable per-frame dB step.
pub const PEAK_DECAY_SCALE: f64 = 5000.0;

/// Intensity below which a held peak starts falling.
pub const PEAK_FALLOFF_INTENSITY: f32 = 0.2;

/// Multiplicative intensity fade applied while a peak is held.
pub const PEAK_INTENSITY_FADE: f32 = 0.975;

/// Value peaks are reset to when the displayed-bin count changes.
pub const PEAK_FLOOR_DB: f32 = -500.0;

/// Green channel of a magnitude bar. Red and blue are zero.
pub const BAR_GREEN: f32 = 0.5;
