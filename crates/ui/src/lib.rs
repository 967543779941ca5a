//! egui rendering for the spectraplot pipeline.

pub mod theme;
pub mod visualizer;
pub mod widgets;

pub use visualizer::{render_spectrum, EguiSurface};
