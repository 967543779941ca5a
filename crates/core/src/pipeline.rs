//! Per-display orchestration: frame feed in, quad geometry out.
//!
//! Geometry-affecting setters only raise `needs_transform`; the expensive
//! edge transform and decimation plan are rebuilt on the next draw. Peak
//! tracking and quad assembly run on every draw.

use crate::analyzer::SpectrumFrame;
use crate::peaks::PeakTracker;
use crate::quads::{Baseline, PeakOverlay, QuadBatch, QuadGeometryBuilder, RenderSurface};
use crate::rebin::{BinEdges, BlockPlan, Decimation, LogBinTree};
use crate::transform::{AxisScale, CoordinateTransform};
use crate::weighting::Weighting;
use anyhow::Result;
use log::{debug, warn};

pub struct SpectrumPipeline {
    horizontal: CoordinateTransform,
    vertical: CoordinateTransform,
    nyquist: f32,
    width: f32,
    height: f32,
    needs_transform: bool,

    // latest frame, data units
    data_edges: BinEdges,
    magnitudes: Vec<f32>,
    fmax: f32,

    // cached while geometry is unchanged
    screen_edges: BinEdges,
    display_edges: BinEdges,
    decimation: Decimation,
    tree: LogBinTree,

    // per-frame scratch
    decimated: Vec<f32>,
    y_screen: Vec<f32>,
    peak_screen: Vec<f32>,

    peaks: PeakTracker,
    peaks_enabled: bool,
    baseline: Baseline,
    weighting: Weighting,
    builder: QuadGeometryBuilder,
}

impl SpectrumPipeline {
    /// Creates a pipeline for spectra that end at `nyquist` Hz.
    pub fn new(nyquist: f32) -> Self {
        let mut horizontal = CoordinateTransform::new(20.0, nyquist, 0.0, 0.0, 0.0);
        horizontal.set_logarithmic();

        Self {
            horizontal,
            vertical: CoordinateTransform::new(-100.0, 0.0, 0.0, 0.0, 0.0),
            nyquist,
            width: 0.0,
            height: 0.0,
            needs_transform: true,
            data_edges: BinEdges::default(),
            magnitudes: Vec::new(),
            fmax: 0.0,
            screen_edges: BinEdges::default(),
            display_edges: BinEdges::default(),
            decimation: Decimation::Block(BlockPlan::new(0, 1)),
            tree: LogBinTree::new(),
            decimated: Vec::new(),
            y_screen: Vec::new(),
            peak_screen: Vec::new(),
            peaks: PeakTracker::new(),
            peaks_enabled: true,
            baseline: Baseline::default(),
            weighting: Weighting::default(),
            builder: QuadGeometryBuilder::new(),
        }
    }

    /// Stores one analysis frame. A bin count different from the previous
    /// frame re-derives the bin edges and invalidates the geometry.
    pub fn set_data(&mut self, centers: &[f32], magnitudes_db: &[f32], fmax: f32) {
        let mut n = magnitudes_db.len();
        if centers.len() != n {
            warn!(
                "frame has {} centres but {} magnitudes, truncating",
                centers.len(),
                n
            );
            n = n.min(centers.len());
        }

        if n != self.data_edges.len() {
            debug!("bin count changed {} -> {}", self.data_edges.len(), n);
            self.data_edges = BinEdges::from_centers(&centers[..n], self.nyquist);
            self.needs_transform = true;
        }

        self.magnitudes.clear();
        self.magnitudes.extend_from_slice(&magnitudes_db[..n]);
        self.fmax = fmax;
    }

    pub fn set_frame(&mut self, frame: &SpectrumFrame) {
        self.set_data(&frame.centers, &frame.magnitudes_db, frame.fmax);
    }

    pub fn set_linear_frequency_scale(&mut self) {
        self.horizontal.set_linear();
        self.needs_transform = true;
    }

    pub fn set_log_frequency_scale(&mut self) {
        self.horizontal.set_logarithmic();
        self.needs_transform = true;
    }

    pub fn set_frequency_range(&mut self, min_hz: f32, max_hz: f32) {
        self.horizontal.set_range(min_hz, max_hz);
        self.needs_transform = true;
    }

    pub fn set_magnitude_range(&mut self, min_db: f32, max_db: f32) {
        self.vertical.set_range(min_db, max_db);
        self.needs_transform = true;
    }

    /// Widget size in pixels.
    pub fn resize(&mut self, width: f32, height: f32) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.needs_transform = true;
        }
    }

    /// Pixel borders left free for the scale widgets, `(start, end)` per axis.
    pub fn set_borders(&mut self, horizontal: (f32, f32), vertical: (f32, f32)) {
        self.horizontal.set_borders(horizontal.0, horizontal.1);
        self.vertical.set_borders(vertical.0, vertical.1);
        self.needs_transform = true;
    }

    /// Records the weighting applied upstream; only the axis title follows it.
    pub fn set_weighting(&mut self, weighting: Weighting) {
        self.weighting = weighting;
        self.needs_transform = true;
    }

    pub fn set_peaks_enabled(&mut self, enabled: bool) {
        self.peaks_enabled = enabled;
    }

    pub fn set_baseline_display_units(&mut self, baseline: f32) {
        self.baseline = Baseline::DisplayUnits(baseline);
    }

    pub fn set_baseline_data_units(&mut self, baseline: f32) {
        self.baseline = Baseline::DataUnits(baseline);
    }

    pub fn needs_transform(&self) -> bool {
        self.needs_transform
    }

    pub fn peaks_enabled(&self) -> bool {
        self.peaks_enabled
    }

    pub fn is_log_scale(&self) -> bool {
        self.horizontal.scale() == AxisScale::Logarithmic
    }

    pub fn horizontal(&self) -> &CoordinateTransform {
        &self.horizontal
    }

    pub fn vertical(&self) -> &CoordinateTransform {
        &self.vertical
    }

    pub fn decimation(&self) -> &Decimation {
        &self.decimation
    }

    pub fn displayed_bins(&self) -> usize {
        self.display_edges.len()
    }

    pub fn magnitude_title(&self) -> &'static str {
        self.weighting.title()
    }

    pub fn fmax(&self) -> f32 {
        self.fmax
    }

    /// Pixel position of the fmax marker, if it lands on a finite position.
    pub fn fmax_screen(&self) -> Option<f32> {
        let x = self.horizontal.to_screen(self.fmax);
        x.is_finite().then_some(x)
    }

    /// Decimated magnitudes of the last draw, dB.
    pub fn displayed_magnitudes(&self) -> &[f32] {
        &self.decimated
    }

    pub fn peak_tracker(&self) -> &PeakTracker {
        &self.peaks
    }

    /// Geometry of the last draw.
    pub fn geometry(&self) -> &QuadBatch {
        self.builder.batch()
    }

    /// Runs one pass and hands the result to `surface`.
    pub fn draw<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) -> Result<()> {
        let batch = self.render()?;
        surface.submit_geometry(batch);
        Ok(())
    }

    /// Runs one pass: rebuild if dirty, decimate, track peaks, build quads.
    pub fn render(&mut self) -> Result<&QuadBatch> {
        if self.width <= 0.0 || self.height <= 0.0 || self.data_edges.is_empty() {
            self.decimated.clear();
            return Ok(self.builder.clear());
        }

        if self.needs_transform {
            self.rebuild()?;
        }

        self.decimation.reduce(&self.magnitudes, &mut self.decimated)?;

        if self.peaks_enabled {
            self.peaks.update(&self.decimated);
        }

        self.vertical.to_screen_into(&self.decimated, &mut self.y_screen);
        let baseline = self.baseline.to_screen(&self.vertical);

        let overlay = if self.peaks_enabled {
            self.vertical
                .to_screen_into(self.peaks.peaks(), &mut self.peak_screen);
            Some(PeakOverlay {
                y: &self.peak_screen,
                intensity: self.peaks.intensities(),
            })
        } else {
            None
        };

        Ok(self
            .builder
            .build(&self.display_edges, &self.y_screen, overlay, baseline))
    }

    fn rebuild(&mut self) -> Result<()> {
        self.horizontal.set_length(self.width);
        self.vertical.set_length(self.height);

        self.horizontal
            .to_screen_into(&self.data_edges.x1, &mut self.screen_edges.x1);
        self.horizontal
            .to_screen_into(&self.data_edges.x2, &mut self.screen_edges.x2);

        self.decimation = match self.horizontal.scale() {
            AxisScale::Logarithmic => Decimation::Tree(
                self.tree
                    .build_plan(&self.screen_edges, &mut self.display_edges)?,
            ),
            AxisScale::Linear => {
                let plan = BlockPlan::from_edges(&self.screen_edges);
                plan.decimate_edges(&self.screen_edges, &mut self.display_edges);
                Decimation::Block(plan)
            }
        };

        debug!(
            "geometry rebuilt: {} bins -> {} displayed ({:?} axis, {}x{} px)",
            self.data_edges.len(),
            self.decimation.output_len(),
            self.horizontal.scale(),
            self.width,
            self.height
        );

        self.needs_transform = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quads::NullSurface;

    const NYQUIST: f32 = 24000.0;

    fn fft_frame(bins: usize) -> (Vec<f32>, Vec<f32>) {
        let bin_hz = NYQUIST / (bins - 1) as f32;
        let centers = (0..bins).map(|i| i as f32 * bin_hz).collect();
        let mags = (0..bins).map(|i| -60.0 + 30.0 * ((i as f32) * 0.1).sin()).collect();
        (centers, mags)
    }

    fn pipeline_with_data(bins: usize) -> SpectrumPipeline {
        let mut p = SpectrumPipeline::new(NYQUIST);
        p.resize(300.0, 200.0);
        let (centers, mags) = fft_frame(bins);
        p.set_data(&centers, &mags, 1000.0);
        p
    }

    #[test]
    fn test_log_axis_decimates_high_bins() {
        let mut p = pipeline_with_data(2049);
        let batch = p.render().unwrap();
        let n = batch.len() / 2;
        assert!(n > 0 && n < 2049, "displayed {}", n);
        assert!(matches!(p.decimation(), Decimation::Tree(_)));
        assert_eq!(p.displayed_magnitudes().len(), n);
    }

    #[test]
    fn test_linear_axis_uses_blocks() {
        let mut p = pipeline_with_data(2049);
        p.set_frequency_range(0.0, NYQUIST);
        p.set_linear_frequency_scale();
        p.set_peaks_enabled(false);
        let quads = p.render().unwrap().len();

        match p.decimation() {
            Decimation::Block(plan) => {
                assert_eq!(plan.block(), 6);
                assert_eq!(plan.offset(), 3);
            }
            other => panic!("expected block plan, got {:?}", other),
        }
        assert_eq!(quads, 341);
    }

    #[test]
    fn test_unchanged_inputs_give_identical_geometry() {
        let mut p = pipeline_with_data(1025);
        p.set_peaks_enabled(false);
        let first = p.render().unwrap().clone();
        assert!(!p.needs_transform());
        let second = p.render().unwrap().clone();

        let a: Vec<u32> = first.flat_vertices().map(f32::to_bits).collect();
        let b: Vec<u32> = second.flat_vertices().map(f32::to_bits).collect();
        assert_eq!(a, b);
        assert_eq!(first, second);
    }

    #[test]
    fn test_setters_mark_geometry_dirty() {
        let mut p = pipeline_with_data(513);
        p.render().unwrap();
        assert!(!p.needs_transform());

        p.set_magnitude_range(-120.0, 0.0);
        assert!(p.needs_transform());
        p.render().unwrap();

        p.resize(300.0, 200.0);
        assert!(!p.needs_transform());
        p.resize(301.0, 200.0);
        assert!(p.needs_transform());
        p.render().unwrap();

        p.set_weighting(Weighting::A);
        assert!(p.needs_transform());
        assert_eq!(p.magnitude_title(), "PSD (dB A)");
    }

    #[test]
    fn test_new_frame_same_length_keeps_plan() {
        let mut p = pipeline_with_data(513);
        p.render().unwrap();
        let (centers, mags) = fft_frame(513);
        p.set_data(&centers, &mags, 500.0);
        assert!(!p.needs_transform());
    }

    #[test]
    fn test_length_change_rebuilds_and_resets_peaks() {
        let mut p = pipeline_with_data(513);
        p.render().unwrap();

        let (centers, mags) = fft_frame(2049);
        p.set_data(&centers, &mags, 500.0);
        assert!(p.needs_transform());
        p.render().unwrap();

        match p.decimation() {
            Decimation::Tree(plan) => assert_eq!(plan.source_len(), 2049),
            other => panic!("expected tree plan, got {:?}", other),
        }
        assert_eq!(p.peak_tracker().len(), p.displayed_bins());
    }

    #[test]
    fn test_mismatched_frame_is_truncated() {
        let mut p = SpectrumPipeline::new(NYQUIST);
        p.resize(100.0, 100.0);
        let (centers, mags) = fft_frame(64);
        p.set_data(&centers[..40], &mags, 100.0);
        p.render().unwrap();
        assert_eq!(p.peak_tracker().len(), p.displayed_bins());
    }

    #[test]
    fn test_degenerate_geometry_is_empty() {
        let mut p = SpectrumPipeline::new(NYQUIST);
        p.resize(300.0, 200.0);
        assert!(p.render().unwrap().is_empty());

        let mut p = pipeline_with_data(257);
        p.resize(0.0, 200.0);
        assert!(p.render().unwrap().is_empty());
        p.resize(300.0, 0.0);
        assert!(p.render().unwrap().is_empty());
    }

    #[test]
    fn test_peaks_double_the_batch() {
        let mut p = pipeline_with_data(257);
        p.set_peaks_enabled(true);
        let with_peaks = p.render().unwrap().len();
        p.set_peaks_enabled(false);
        let without = p.render().unwrap().len();
        assert_eq!(with_peaks, 2 * without);
    }

    #[test]
    fn test_baseline_data_units_follow_vertical_axis() {
        let mut p = pipeline_with_data(129);
        p.set_peaks_enabled(false);
        p.set_magnitude_range(-100.0, 0.0);
        p.set_baseline_data_units(-50.0);
        let batch = p.render().unwrap();
        // bottom corners sit on the baseline, half way up a 200 px plot
        assert!((batch.quads[0][3][1] - 100.0).abs() < 1e-3);

        p.set_baseline_display_units(7.0);
        let batch = p.render().unwrap();
        assert_eq!(batch.quads[0][3][1], 7.0);
    }

    #[test]
    fn test_draw_submits_to_surface() {
        let mut p = pipeline_with_data(129);
        let mut surface = NullSurface::default();
        p.draw(&mut surface).unwrap();
        p.draw(&mut surface).unwrap();
        assert_eq!(surface.submitted, 2);
    }

    #[test]
    fn test_fmax_marker_position() {
        let mut p = pipeline_with_data(129);
        p.set_frequency_range(20.0, 20000.0);
        p.render().unwrap();
        let x = p.fmax_screen().unwrap();
        // 1 kHz sits a bit past half way on 20 Hz..20 kHz (3 decades)
        assert!((x - 300.0 * (50.0f32).log10() / 3.0).abs() < 0.5);
    }
}
