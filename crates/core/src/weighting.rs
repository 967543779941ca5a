//! Frequency weighting curves (IEC 61672 A/B/C) applied to the spectrum.

const F1: f64 = 20.598_997;
const F2: f64 = 107.652_65;
const F3: f64 = 737.862_23;
const F4: f64 = 12_194.217;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Weighting {
    /// Flat response.
    #[default]
    Z,
    A,
    B,
    C,
}

impl Weighting {
    pub const ALL: [Weighting; 4] = [Weighting::Z, Weighting::A, Weighting::B, Weighting::C];

    /// Title of the magnitude axis for this weighting.
    pub fn title(self) -> &'static str {
        match self {
            Weighting::Z => "PSD (dB)",
            Weighting::A => "PSD (dB A)",
            Weighting::B => "PSD (dB B)",
            Weighting::C => "PSD (dB C)",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Weighting::Z => "None",
            Weighting::A => "A",
            Weighting::B => "B",
            Weighting::C => "C",
        }
    }

    /// Inverse of `label`, case-insensitive.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|w| w.label().eq_ignore_ascii_case(label))
    }

    /// Gain in dB at `freq_hz`, 0 dB at 1 kHz.
    pub fn gain_db(self, freq_hz: f32) -> f32 {
        match self {
            Weighting::Z => 0.0,
            _ => (self.raw_db(freq_hz as f64) - self.raw_db(1000.0)) as f32,
        }
    }

    fn raw_db(self, f: f64) -> f64 {
        let f2 = f * f;
        let r = match self {
            Weighting::Z => return 0.0,
            Weighting::A => {
                F4 * F4 * f2 * f2
                    / ((f2 + F1 * F1) * ((f2 + F2 * F2) * (f2 + F3 * F3)).sqrt() * (f2 + F4 * F4))
            }
            Weighting::B => {
                F4 * F4 * f2 * f / ((f2 + F1 * F1) * (f2 + 158.5 * 158.5).sqrt() * (f2 + F4 * F4))
            }
            Weighting::C => F4 * F4 * f2 / ((f2 + F1 * F1) * (f2 + F4 * F4)),
        };
        20.0 * r.max(1e-30).log10()
    }
}
