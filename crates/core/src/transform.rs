//! Data to pixel mapping for one plot axis.
//!
//! Screen coordinates grow from `start_border` towards `length - end_border`.
//! The vertical axis is bottom-up, the surface flips it if its own origin is
//! at the top.

/// Smallest value fed to `log10` on a logarithmic axis.
const LOG_FLOOR: f32 = 1e-30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisScale {
    Linear,
    Logarithmic,
}

#[derive(Debug, Clone)]
pub struct CoordinateTransform {
    coord_min: f32,
    coord_max: f32,
    length: f32,
    start_border: f32,
    end_border: f32,
    scale: AxisScale,
}

impl CoordinateTransform {
    pub fn new(coord_min: f32, coord_max: f32, length: f32, start_border: f32, end_border: f32) -> Self {
        Self {
            coord_min,
            coord_max,
            length,
            start_border,
            end_border,
            scale: AxisScale::Linear,
        }
    }

    pub fn set_range(&mut self, coord_min: f32, coord_max: f32) {
        self.coord_min = coord_min;
        self.coord_max = coord_max;
    }

    pub fn set_length(&mut self, length: f32) {
        self.length = length;
    }

    pub fn set_borders(&mut self, start_border: f32, end_border: f32) {
        self.start_border = start_border;
        self.end_border = end_border;
    }

    pub fn set_linear(&mut self) {
        self.scale = AxisScale::Linear;
    }

    pub fn set_logarithmic(&mut self) {
        self.scale = AxisScale::Logarithmic;
    }

    pub fn scale(&self) -> AxisScale {
        self.scale
    }

    pub fn range(&self) -> (f32, f32) {
        (self.coord_min, self.coord_max)
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    /// Usable pixel span once both borders are removed.
    fn span(&self) -> f32 {
        self.length - self.start_border - self.end_border
    }

    /// Position of `value` on the axis as a fraction of the range.
    fn fraction(&self, value: f32) -> Option<f32> {
        match self.scale {
            AxisScale::Linear => {
                let range = self.coord_max - self.coord_min;
                (range != 0.0).then(|| (value - self.coord_min) / range)
            }
            AxisScale::Logarithmic => {
                let min = self.coord_min.max(LOG_FLOOR);
                let max = self.coord_max.max(LOG_FLOOR);
                let decades = (max / min).log10();
                (decades != 0.0).then(|| (value.max(LOG_FLOOR) / min).log10() / decades)
            }
        }
    }

    /// Maps a data value to a pixel position.
    pub fn to_screen(&self, value: f32) -> f32 {
        match self.fraction(value) {
            Some(f) => self.start_border + f * self.span(),
            None => self.start_border,
        }
    }

    /// Maps a pixel position back to a data value.
    pub fn to_plot(&self, pixel: f32) -> f32 {
        let span = self.span();
        if span == 0.0 {
            return self.coord_min;
        }
        let f = (pixel - self.start_border) / span;
        match self.scale {
            AxisScale::Linear => self.coord_min + f * (self.coord_max - self.coord_min),
            AxisScale::Logarithmic => {
                let min = self.coord_min.max(LOG_FLOOR);
                let max = self.coord_max.max(LOG_FLOOR);
                min * (max / min).powf(f)
            }
        }
    }

    /// Maps every value of `values` into `out`, replacing its contents.
    pub fn to_screen_into(&self, values: &[f32], out: &mut Vec<f32>) {
        out.clear();
        out.extend(values.iter().map(|&v| self.to_screen(v)));
    }
}
