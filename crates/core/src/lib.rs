//! Data-to-geometry pipeline of the spectraplot analyzer.
//!
//! Raw dB spectra come in, get decimated to what the plot can resolve,
//! pick up a peak-hold overlay and leave as flat quad geometry for a
//! rasterizer. No GUI code lives here.

pub mod analyzer;
pub mod constants;
pub mod peaks;
pub mod pipeline;
pub mod quads;
pub mod rebin;
pub mod transform;
pub mod weighting;

pub use analyzer::{SpectrumAnalyzer, SpectrumFrame};
pub use peaks::{PeakParams, PeakTracker};
pub use pipeline::SpectrumPipeline;
pub use quads::{Baseline, NullSurface, QuadBatch, QuadGeometryBuilder, RenderSurface};
pub use rebin::{BinEdges, BlockPlan, Decimation, LogBinTree, RebinPlan};
pub use transform::{AxisScale, CoordinateTransform};
pub use weighting::Weighting;
