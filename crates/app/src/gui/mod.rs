//! Spectraplot GUI: eframe window around the display pipeline.

mod app;
mod controls;

pub use app::run_gui;
