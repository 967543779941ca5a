//! Rectangle geometry handed to the rasterizer.

use crate::constants::BAR_GREEN;
use crate::rebin::BinEdges;
use crate::transform::CoordinateTransform;

pub type Quad = [[f32; 2]; 4];
pub type QuadColor = [[f32; 3]; 4];

/// One frame of geometry: `quads[i]` is painted with `colors[i]`.
///
/// With the peak overlay on, the first half holds the peak quads and the
/// second half the magnitude bars, so bars are drawn over peaks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadBatch {
    pub quads: Vec<Quad>,
    pub colors: Vec<QuadColor>,
}

impl QuadBatch {
    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    pub fn clear(&mut self) {
        self.quads.clear();
        self.colors.clear();
    }

    /// All corner coordinates, `x, y` interleaved.
    pub fn flat_vertices(&self) -> impl Iterator<Item = f32> + '_ {
        self.quads.iter().flatten().flatten().copied()
    }

    /// All corner colours, `r, g, b` interleaved.
    pub fn flat_colors(&self) -> impl Iterator<Item = f32> + '_ {
        self.colors.iter().flatten().flatten().copied()
    }

    fn push(&mut self, x1: f32, x2: f32, y_top: f32, y_base: f32, rgb: [f32; 3]) {
        let h = y_top - y_base;
        let w = x2 - x1;
        self.quads.push([
            [x1, y_base + h],
            [x1 + w, y_base + h],
            [x1 + w, y_base],
            [x1, y_base],
        ]);
        self.colors.push([rgb; 4]);
    }
}

/// Consumer of finished geometry.
pub trait RenderSurface {
    fn submit_geometry(&mut self, batch: &QuadBatch);
}

/// Surface that drops everything, for headless runs.
#[derive(Debug, Default)]
pub struct NullSurface {
    pub submitted: usize,
}

impl RenderSurface for NullSurface {
    fn submit_geometry(&mut self, _batch: &QuadBatch) {
        self.submitted += 1;
    }
}

/// Where the bars start from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Baseline {
    /// Already in screen units (dual channel comparison display).
    DisplayUnits(f32),
    /// In dB, mapped through the vertical transform (single channel display).
    DataUnits(f32),
}

impl Default for Baseline {
    fn default() -> Self {
        Baseline::DisplayUnits(0.0)
    }
}

impl Baseline {
    pub fn to_screen(self, vertical: &CoordinateTransform) -> f32 {
        match self {
            Baseline::DisplayUnits(v) => v,
            Baseline::DataUnits(v) => vertical.to_screen(v),
        }
    }
}

/// Peak overlay input, already in screen units.
///
/// Each peak quad spans from the baseline up to the held peak, so only the
/// part above the bar stays visible once the bars are drawn over it.
pub struct PeakOverlay<'a> {
    pub y: &'a [f32],
    pub intensity: &'a [f32],
}

#[derive(Debug, Default)]
pub struct QuadGeometryBuilder {
    batch: QuadBatch,
}

impl QuadGeometryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the batch with one bar per bin, preceded by one peak quad
    /// per bin when `peaks` is given.
    pub fn build(
        &mut self,
        edges: &BinEdges,
        y_screen: &[f32],
        peaks: Option<PeakOverlay<'_>>,
        baseline: f32,
    ) -> &QuadBatch {
        self.batch.clear();
        let n = edges.len().min(y_screen.len());
        if n == 0 {
            return &self.batch;
        }

        if let Some(overlay) = peaks {
            let n_peaks = n.min(overlay.y.len()).min(overlay.intensity.len());
            for i in 0..n_peaks {
                let fade = 1.0 - overlay.intensity[i];
                self.batch
                    .push(edges.x1[i], edges.x2[i], overlay.y[i], baseline, [1.0, fade, fade]);
            }
        }

        for i in 0..n {
            self.batch
                .push(edges.x1[i], edges.x2[i], y_screen[i], baseline, [0.0, BAR_GREEN, 0.0]);
        }

        &self.batch
    }

    /// Empties the batch, used for degenerate geometry.
    pub fn clear(&mut self) -> &QuadBatch {
        self.batch.clear();
        &self.batch
    }

    pub fn batch(&self) -> &QuadBatch {
        &self.batch
    }
}
