//! Drawing boundary between renderers and their output device.
//!
//! Renderers work purely in pixel space against the [`Surface`] trait; the
//! frontend decides how pixels become glyphs, braille dots, or half blocks.

/// RGB color with straight alpha.
///
/// Surfaces have no layering; alpha is flattened against the theme
/// background (black) at draw time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Opacity in [0, 1].
    pub a: f32,
}

impl Color {
    /// Fully opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 1.0 }
    }

    /// Neutral gray of the given level.
    pub const fn gray(level: u8) -> Self {
        Color::rgb(level, level, level)
    }

    /// Same color with a different opacity.
    pub fn with_alpha(self, a: f32) -> Self {
        Color { a, ..self }
    }

    /// Flatten against a black background.
    pub fn flattened(self) -> (u8, u8, u8) {
        let a = self.a.clamp(0.0, 1.0);
        (
            (self.r as f32 * a) as u8,
            (self.g as f32 * a) as u8,
            (self.b as f32 * a) as u8,
        )
    }

    /// Perceived brightness after flattening, used by cell rasterizers to
    /// pick a winning color when draws overlap.
    pub fn luma(self) -> f32 {
        let (r, g, b) = self.flattened();
        0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32
    }
}

/// Base text color of the player theme.
pub const FOREGROUND: Color = Color::rgb(224, 224, 224);

/// Orange accent used for spectral peaks and hot trails.
pub const ACCENT: Color = Color::rgb(249, 115, 22);

/// Vertical gradient defined by `(position, color)` stops, position in [0, 1]
/// spanning the full surface height.
#[derive(Debug, Clone)]
pub struct Gradient {
    stops: Vec<(f32, Color)>,
}

impl Gradient {
    /// Build a gradient from unordered stops.
    pub fn new(mut stops: Vec<(f32, Color)>) -> Self {
        stops.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        Gradient { stops }
    }

    /// Color at normalized position `t`, clamped to the stop range.
    pub fn sample(&self, t: f32) -> Color {
        let Some(first) = self.stops.first() else {
            return FOREGROUND;
        };
        let Some(last) = self.stops.last() else {
            return FOREGROUND;
        };
        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }
        for pair in self.stops.windows(2) {
            let (p0, c0) = pair[0];
            let (p1, c1) = pair[1];
            if t >= p0 && t <= p1 {
                let span = p1 - p0;
                let f = if span > 0.0 { (t - p0) / span } else { 0.0 };
                return Color {
                    r: lerp_u8(c0.r, c1.r, f),
                    g: lerp_u8(c0.g, c1.g, f),
                    b: lerp_u8(c0.b, c1.b, f),
                    a: c0.a + (c1.a - c0.a) * f,
                };
            }
        }
        last.1
    }
}

fn lerp_u8(a: u8, b: u8, f: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * f) as u8
}

/// Owned RGB pixel grid used as persistent off-surface storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Black buffer of the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        PixelBuffer {
            width,
            height,
            data: vec![0; width * height * 3],
        }
    }

    /// Buffer width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Buffer height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Read one pixel. Panics outside the buffer.
    pub fn pixel(&self, x: usize, y: usize) -> (u8, u8, u8) {
        let idx = (y * self.width + x) * 3;
        (self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }

    /// Write one pixel. Panics outside the buffer.
    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: (u8, u8, u8)) {
        let idx = (y * self.width + x) * 3;
        self.data[idx] = rgb.0;
        self.data[idx + 1] = rgb.1;
        self.data[idx + 2] = rgb.2;
    }

    /// Move all content down by `rows` pixels. The vacated top rows keep
    /// their stale content and are expected to be overwritten by the caller.
    pub fn shift_down(&mut self, rows: usize) {
        if rows == 0 || rows >= self.height {
            return;
        }
        let stride = self.width * 3;
        let moved = (self.height - rows) * stride;
        self.data.copy_within(0..moved, rows * stride);
    }
}

/// Drawing operations a visualizer frontend must provide.
///
/// Coordinates are pixels with the origin at the top-left. Glyph calls
/// address the top-left corner of the glyph's cell.
pub trait Surface {
    /// Wipe the whole drawing area.
    fn clear(&mut self);

    /// Draw one monospace glyph whose cell starts at `(x, y)`.
    fn glyph(&mut self, ch: char, x: f32, y: f32, color: Color);

    /// Stroke an open polyline with the given width in pixels.
    fn stroke(&mut self, points: &[(f32, f32)], width: f32, color: Color);

    /// Fill the vertical spans between a curve and a horizontal baseline,
    /// sampling the gradient at `y / surface_height`.
    fn fill_under_curve(&mut self, points: &[(f32, f32)], baseline_y: f32, gradient: &Gradient);

    /// Copy a pixel buffer over the full drawing area.
    fn blit(&mut self, pixels: &PixelBuffer);
}

/// Surface that discards every draw call.
///
/// Stands in when no drawing context exists, so schedulers and renderers
/// degrade to doing no visible work instead of failing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn clear(&mut self) {}
    fn glyph(&mut self, _ch: char, _x: f32, _y: f32, _color: Color) {}
    fn stroke(&mut self, _points: &[(f32, f32)], _width: f32, _color: Color) {}
    fn fill_under_curve(&mut self, _points: &[(f32, f32)], _baseline_y: f32, _gradient: &Gradient) {}
    fn blit(&mut self, _pixels: &PixelBuffer) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_flattens_against_black() {
        assert_eq!(FOREGROUND.flattened(), (224, 224, 224));
        assert_eq!(FOREGROUND.with_alpha(0.5).flattened(), (112, 112, 112));
        assert_eq!(FOREGROUND.with_alpha(0.0).flattened(), (0, 0, 0));
    }

    #[test]
    fn gradient_interpolates_between_stops() {
        let gradient = Gradient::new(vec![
            (0.0, Color::gray(0)),
            (1.0, Color::gray(200)),
        ]);
        assert_eq!(gradient.sample(0.0).r, 0);
        assert_eq!(gradient.sample(0.5).r, 100);
        assert_eq!(gradient.sample(1.0).r, 200);
        // Clamped outside the stop range.
        assert_eq!(gradient.sample(2.0).r, 200);
    }

    #[test]
    fn gradient_handles_unsorted_stops() {
        let gradient = Gradient::new(vec![
            (1.0, Color::gray(200)),
            (0.0, Color::gray(0)),
            (0.5, Color::gray(20)),
        ]);
        assert_eq!(gradient.sample(0.5).r, 20);
        assert!(gradient.sample(0.25).r <= 20);
    }

    #[test]
    fn shift_down_moves_rows() {
        let mut buffer = PixelBuffer::new(2, 3);
        buffer.set_pixel(0, 0, (10, 20, 30));
        buffer.set_pixel(1, 1, (40, 50, 60));

        buffer.shift_down(1);

        assert_eq!(buffer.pixel(0, 1), (10, 20, 30));
        assert_eq!(buffer.pixel(1, 2), (40, 50, 60));
        // Top row keeps stale content for the caller to overwrite.
        assert_eq!(buffer.pixel(0, 0), (10, 20, 30));
    }

    #[test]
    fn shift_down_by_full_height_is_a_no_op() {
        let mut buffer = PixelBuffer::new(2, 2);
        buffer.set_pixel(0, 0, (1, 2, 3));
        buffer.shift_down(2);
        assert_eq!(buffer.pixel(0, 0), (1, 2, 3));
    }
}
