use egui::epaint::{Mesh, Shape};
use egui::{Color32, Pos2, Rect, Sense, Stroke};
use spectraplot_core::{QuadBatch, RenderSurface, SpectrumFrame, SpectrumPipeline};

use crate::theme;

/// Turns a quad batch into an egui mesh placed inside a widget rect.
///
/// Plot coordinates are bottom-up with the origin at the lower left corner
/// of the rect; egui is top-down, so y is flipped here.
pub struct EguiSurface {
    rect: Rect,
    mesh: Mesh,
}

impl Default for EguiSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl EguiSurface {
    pub fn new() -> Self {
        Self {
            rect: Rect::NOTHING,
            mesh: Mesh::default(),
        }
    }

    /// Moves the surface. Returns true if the rect changed, in which case
    /// the current mesh is stale.
    pub fn set_rect(&mut self, rect: Rect) -> bool {
        if rect == self.rect {
            return false;
        }
        self.rect = rect;
        true
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    fn to_screen(&self, corner: [f32; 2]) -> Pos2 {
        Pos2::new(self.rect.min.x + corner[0], self.rect.max.y - corner[1])
    }
}

fn to_color32(rgb: [f32; 3]) -> Color32 {
    let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgb(c(rgb[0]), c(rgb[1]), c(rgb[2]))
}

impl RenderSurface for EguiSurface {
    fn submit_geometry(&mut self, batch: &QuadBatch) {
        self.mesh.clear();
        for (quad, color) in batch.quads.iter().zip(&batch.colors) {
            let base = self.mesh.vertices.len() as u32;
            for (&corner, &rgb) in quad.iter().zip(color) {
                self.mesh
                    .colored_vertex(self.to_screen(corner), to_color32(rgb));
            }
            self.mesh.add_triangle(base, base + 1, base + 2);
            self.mesh.add_triangle(base, base + 2, base + 3);
        }
    }
}

/// Renders the spectrum plot, feeding it every frame received since the
/// last repaint.
pub fn render_spectrum(
    ui: &mut egui::Ui,
    pipeline: &mut SpectrumPipeline,
    surface: &mut EguiSurface,
    frames: &[SpectrumFrame],
    height: f32,
) -> anyhow::Result<egui::Response> {
    let (rect, response) =
        ui.allocate_exact_size(egui::vec2(ui.available_width(), height), Sense::hover());

    pipeline.resize(rect.width(), rect.height());
    let moved = surface.set_rect(rect);
    if moved {
        log::debug!("plot area now {:.0}x{:.0}", rect.width(), rect.height());
    }

    for frame in frames {
        pipeline.set_frame(frame);
        pipeline.draw(surface)?;
    }
    if frames.is_empty() && (moved || pipeline.needs_transform()) {
        pipeline.draw(surface)?;
    }

    if ui.is_rect_visible(rect) {
        let painter = ui.painter_at(rect);
        let dark_mode = ui.visuals().dark_mode;

        paint_background(&painter, rect, dark_mode);
        painter.add(Shape::mesh(surface.mesh().clone()));

        // loudest frequency marker
        if !pipeline.geometry().is_empty() {
            if let Some(x) = pipeline.fmax_screen() {
                painter.vline(
                    rect.min.x + x,
                    rect.y_range(),
                    Stroke::new(1.0, theme::PEAK_RED),
                );
            }
        }

        painter.rect_stroke(
            rect.shrink(0.5),
            0.0,
            Stroke::new(1.0, theme::PLOT_BORDER),
            egui::StrokeKind::Inside,
        );

        if frames.is_empty() && pipeline.geometry().is_empty() {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Waiting for audio...",
                egui::FontId::proportional(14.0),
                theme::PLOT_BORDER,
            );
        }
    }

    Ok(response)
}

/// Vertical gradient on the upper half, flat on the lower half.
fn paint_background(painter: &egui::Painter, rect: Rect, dark_mode: bool) {
    let (top, bottom) = if dark_mode {
        (theme::PLOT_TOP_DARK, theme::PLOT_BOTTOM_DARK)
    } else {
        (theme::PLOT_TOP_LIGHT, theme::PLOT_BOTTOM_LIGHT)
    };

    let middle = rect.center().y;
    let mut mesh = Mesh::default();
    mesh.colored_vertex(rect.left_top(), top);
    mesh.colored_vertex(rect.right_top(), top);
    mesh.colored_vertex(Pos2::new(rect.right(), middle), bottom);
    mesh.colored_vertex(Pos2::new(rect.left(), middle), bottom);
    mesh.add_triangle(0, 1, 2);
    mesh.add_triangle(0, 2, 3);
    painter.add(Shape::mesh(mesh));

    painter.rect_filled(
        Rect::from_min_max(Pos2::new(rect.left(), middle), rect.right_bottom()),
        0.0,
        bottom,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectraplot_core::quads::PeakOverlay;
    use spectraplot_core::{BinEdges, QuadGeometryBuilder};

    #[test]
    fn test_two_triangles_per_quad() {
        let edges = BinEdges::new(vec![0.0, 1.0], vec![1.0, 2.0]).unwrap();
        let mut builder = QuadGeometryBuilder::new();
        let overlay = PeakOverlay {
            y: &[8.0, 9.0],
            intensity: &[1.0, 0.0],
        };
        let batch = builder.build(&edges, &[5.0, 6.0], Some(overlay), 0.0);

        let mut surface = EguiSurface::new();
        surface.set_rect(Rect::from_min_size(Pos2::new(10.0, 20.0), egui::vec2(100.0, 50.0)));
        surface.submit_geometry(batch);

        assert_eq!(surface.mesh().vertices.len(), 4 * 4);
        assert_eq!(surface.mesh().indices.len(), 4 * 6);
    }

    #[test]
    fn test_y_is_flipped_into_rect() {
        let edges = BinEdges::new(vec![2.0], vec![4.0]).unwrap();
        let mut builder = QuadGeometryBuilder::new();
        let batch = builder.build(&edges, &[30.0], None, 0.0);

        let mut surface = EguiSurface::new();
        surface.set_rect(Rect::from_min_size(Pos2::new(10.0, 20.0), egui::vec2(100.0, 50.0)));
        surface.submit_geometry(batch);

        let v = &surface.mesh().vertices;
        // top-left corner of the bar: 30 px above the bottom edge at y = 70
        assert_eq!(v[0].pos, Pos2::new(12.0, 40.0));
        // bottom-right corner sits on the baseline
        assert_eq!(v[2].pos, Pos2::new(14.0, 70.0));
        assert_eq!(v[0].color, Color32::from_rgb(0, 128, 0));
    }

    #[test]
    fn test_set_rect_reports_changes() {
        let mut surface = EguiSurface::new();
        let rect = Rect::from_min_size(Pos2::ZERO, egui::vec2(10.0, 10.0));
        assert!(surface.set_rect(rect));
        assert!(!surface.set_rect(rect));
    }

    #[test]
    fn test_peak_colour_fades_to_white() {
        assert_eq!(to_color32([1.0, 0.0, 0.0]), Color32::from_rgb(255, 0, 0));
        assert_eq!(to_color32([1.0, 1.0, 1.0]), Color32::WHITE);
    }
}
