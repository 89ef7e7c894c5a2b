//! Cell rasterizer turning pixel-space draws into terminal output.
//!
//! The drawing area is the character grid of the visualizer pane; every
//! glyph cell spans the 2×4 logical pixels of one braille character.
//! Strokes and fills accumulate braille dots, full-frame blits become
//! upper/lower half-block pairs, and glyph draws place the character
//! itself. Overlapping dot draws keep the brightest contributing color.

use chroma_core::{Color, Gradient, PixelBuffer, Surface, SurfaceMetrics};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color as TermColor;
use ratatui::widgets::Widget;

/// Logical pixels per cell, horizontally.
pub const CELL_WIDTH_PX: usize = 2;

/// Logical pixels per cell, vertically.
pub const CELL_HEIGHT_PX: usize = 4;

/// Unicode braille patterns base code point; dot bits are OR'd onto it.
const BRAILLE_BASE: u32 = 0x2800;

/// Braille dot bit for pixel `(x, y)` within a cell.
const DOT_BITS: [[u8; CELL_HEIGHT_PX]; CELL_WIDTH_PX] = [
    [0x01, 0x02, 0x04, 0x40],
    [0x08, 0x10, 0x20, 0x80],
];

/// Upper half block; fg paints the top half cell, bg the bottom.
const HALF_BLOCK: char = '\u{2580}';

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Cell {
    #[default]
    Empty,
    /// Accumulated braille dots and the brightest color that touched them.
    Dots { bits: u8, rgb: (u8, u8, u8), luma: f32 },
    /// One directly placed character.
    Glyph { ch: char, rgb: (u8, u8, u8) },
    /// Half-block pair from a blit.
    Half { top: (u8, u8, u8), bottom: (u8, u8, u8) },
}

/// Character-grid drawing surface for the visualizer pane.
///
/// Renderers draw through the [`Surface`] trait in pixel space; the grid
/// renders as a ratatui widget afterwards. Glyph and blit writes own their
/// cells outright, while dots only accumulate into empty or dot cells.
#[derive(Debug, Clone)]
pub struct TerminalSurface {
    cols: usize,
    rows: usize,
    cells: Vec<Cell>,
}

impl TerminalSurface {
    /// Surface covering a `cols` × `rows` character area.
    pub fn new(cols: u16, rows: u16) -> Self {
        let cols = cols as usize;
        let rows = rows as usize;
        TerminalSurface {
            cols,
            rows,
            cells: vec![Cell::Empty; cols * rows],
        }
    }

    /// Follow a terminal resize. Content is dropped when the size changes;
    /// the next frame redraws it at the new geometry.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        let cols = cols as usize;
        let rows = rows as usize;
        if cols == self.cols && rows == self.rows {
            return;
        }
        self.cols = cols;
        self.rows = rows;
        self.cells = vec![Cell::Empty; cols * rows];
    }

    /// Pixel-space geometry renderers are given.
    pub fn metrics(&self) -> SurfaceMetrics {
        SurfaceMetrics {
            width_px: (self.cols * CELL_WIDTH_PX) as f32,
            height_px: (self.rows * CELL_HEIGHT_PX) as f32,
            cell_width_px: CELL_WIDTH_PX as f32,
            cell_height_px: CELL_HEIGHT_PX as f32,
        }
    }

    fn width_px(&self) -> i64 {
        (self.cols * CELL_WIDTH_PX) as i64
    }

    fn height_px(&self) -> i64 {
        (self.rows * CELL_HEIGHT_PX) as i64
    }

    fn set_dot(&mut self, px: i64, py: i64, color: Color) {
        if px < 0 || py < 0 || px >= self.width_px() || py >= self.height_px() {
            return;
        }
        let bit = DOT_BITS[(px % CELL_WIDTH_PX as i64) as usize]
            [(py % CELL_HEIGHT_PX as i64) as usize];
        let idx = (py / CELL_HEIGHT_PX as i64) as usize * self.cols
            + (px / CELL_WIDTH_PX as i64) as usize;
        match &mut self.cells[idx] {
            cell @ Cell::Empty => {
                *cell = Cell::Dots {
                    bits: bit,
                    rgb: color.flattened(),
                    luma: color.luma(),
                };
            }
            Cell::Dots { bits, rgb, luma } => {
                *bits |= bit;
                let candidate = color.luma();
                if candidate > *luma {
                    *rgb = color.flattened();
                    *luma = candidate;
                }
            }
            // Direct glyph and blit writes own their cells.
            Cell::Glyph { .. } | Cell::Half { .. } => {}
        }
    }

    /// Stamp a dot disc of the given radius around `(x, y)`.
    fn plot(&mut self, x: f32, y: f32, radius: i64, color: Color) {
        let cx = x.round() as i64;
        let cy = y.round() as i64;
        if radius <= 0 {
            self.set_dot(cx, cy, color);
            return;
        }
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.set_dot(cx + dx, cy + dy, color);
                }
            }
        }
    }
}

impl Surface for TerminalSurface {
    fn clear(&mut self) {
        self.cells.fill(Cell::Empty);
    }

    fn glyph(&mut self, ch: char, x: f32, y: f32, color: Color) {
        let col = (x / CELL_WIDTH_PX as f32).floor() as i64;
        let row = (y / CELL_HEIGHT_PX as f32).floor() as i64;
        if col < 0 || row < 0 || col >= self.cols as i64 || row >= self.rows as i64 {
            return;
        }
        self.cells[row as usize * self.cols + col as usize] = Cell::Glyph {
            ch,
            rgb: color.flattened(),
        };
    }

    fn stroke(&mut self, points: &[(f32, f32)], width: f32, color: Color) {
        let radius = ((width - 1.0) / 2.0).round() as i64;
        if points.len() == 1 {
            self.plot(points[0].0, points[0].1, radius, color);
            return;
        }
        for pair in points.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0);
            let n = steps as usize;
            for i in 0..=n {
                let t = i as f32 / n as f32;
                self.plot(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t, radius, color);
            }
        }
    }

    fn fill_under_curve(&mut self, points: &[(f32, f32)], baseline_y: f32, gradient: &Gradient) {
        let height = self.height_px();
        if height == 0 {
            return;
        }
        let baseline = baseline_y.round() as i64;
        let mut fill_column = |px: i64, y: f32| {
            let y = y.round() as i64;
            let (top, bottom) = if y <= baseline { (y, baseline) } else { (baseline, y) };
            for py in top.max(0)..=bottom.min(height - 1) {
                let color = gradient.sample(py as f32 / height as f32);
                self.set_dot(px, py, color);
            }
        };

        for pair in points.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            let (x0, y0, x1, y1) = if x0 <= x1 { (x0, y0, x1, y1) } else { (x1, y1, x0, y0) };
            let span = x1 - x0;
            if span < f32::EPSILON {
                fill_column(x0.round() as i64, y0.min(y1));
                continue;
            }
            let first = x0.ceil() as i64;
            let last = x1.floor() as i64;
            for px in first..=last {
                let t = (px as f32 - x0) / span;
                fill_column(px, y0 + (y1 - y0) * t);
            }
        }
    }

    fn blit(&mut self, pixels: &PixelBuffer) {
        if pixels.width() == 0 || pixels.height() == 0 {
            self.clear();
            return;
        }
        for row in 0..self.rows {
            for col in 0..self.cols {
                let x = col * CELL_WIDTH_PX;
                let y = row * CELL_HEIGHT_PX;
                self.cells[row * self.cols + col] = Cell::Half {
                    top: average_block(pixels, x, y),
                    bottom: average_block(pixels, x, y + CELL_HEIGHT_PX / 2),
                };
            }
        }
    }
}

/// Mean color of the 2×2 pixel block at `(x, y)`, clamped to the buffer.
fn average_block(pixels: &PixelBuffer, x: usize, y: usize) -> (u8, u8, u8) {
    let mut sum = (0u32, 0u32, 0u32);
    for dy in 0..CELL_HEIGHT_PX / 2 {
        for dx in 0..CELL_WIDTH_PX {
            let px = (x + dx).min(pixels.width() - 1);
            let py = (y + dy).min(pixels.height() - 1);
            let (r, g, b) = pixels.pixel(px, py);
            sum.0 += u32::from(r);
            sum.1 += u32::from(g);
            sum.2 += u32::from(b);
        }
    }
    let n = (CELL_WIDTH_PX * CELL_HEIGHT_PX / 2) as u32;
    ((sum.0 / n) as u8, (sum.1 / n) as u8, (sum.2 / n) as u8)
}

impl Widget for &TerminalSurface {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let cols = self.cols.min(area.width as usize);
        let rows = self.rows.min(area.height as usize);
        for row in 0..rows {
            for col in 0..cols {
                let x = area.x + col as u16;
                let y = area.y + row as u16;
                match self.cells[row * self.cols + col] {
                    Cell::Empty => {}
                    Cell::Dots { bits, rgb, .. } => {
                        let ch =
                            char::from_u32(BRAILLE_BASE + u32::from(bits)).unwrap_or(HALF_BLOCK);
                        buf[(x, y)]
                            .set_char(ch)
                            .set_fg(TermColor::Rgb(rgb.0, rgb.1, rgb.2));
                    }
                    Cell::Glyph { ch, rgb } => {
                        buf[(x, y)]
                            .set_char(ch)
                            .set_fg(TermColor::Rgb(rgb.0, rgb.1, rgb.2));
                    }
                    Cell::Half { top, bottom } => {
                        buf[(x, y)]
                            .set_char(HALF_BLOCK)
                            .set_fg(TermColor::Rgb(top.0, top.1, top.2))
                            .set_bg(TermColor::Rgb(bottom.0, bottom.1, bottom.2));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroma_core::{ACCENT, FOREGROUND};

    fn rendered(surface: &TerminalSurface) -> Buffer {
        let area = Rect::new(0, 0, surface.cols as u16, surface.rows as u16);
        let mut buf = Buffer::empty(area);
        surface.render(area, &mut buf);
        buf
    }

    fn rgb(color: Color) -> TermColor {
        let (r, g, b) = color.flattened();
        TermColor::Rgb(r, g, b)
    }

    #[test]
    fn metrics_follow_the_cell_grid() {
        let surface = TerminalSurface::new(10, 5);
        let metrics = surface.metrics();
        assert_eq!(metrics.width_px, 20.0);
        assert_eq!(metrics.height_px, 20.0);
        assert_eq!(metrics.columns(), 10);
        assert_eq!(metrics.rows(), 5);
    }

    #[test]
    fn stroke_endpoints_land_in_their_cells() {
        let mut surface = TerminalSurface::new(4, 2);
        surface.stroke(&[(0.0, 0.0), (3.0, 7.0)], 1.0, FOREGROUND);

        let buf = rendered(&surface);
        assert_ne!(buf[(0, 0)].symbol(), " ", "start dot must mark its cell");
        assert_ne!(buf[(1, 1)].symbol(), " ", "end dot must mark its cell");
        assert_eq!(buf[(0, 0)].fg, rgb(FOREGROUND));
        // The diagonal never enters the opposite corners.
        assert_eq!(buf[(1, 0)].symbol(), " ");
        assert_eq!(buf[(0, 1)].symbol(), " ");
    }

    #[test]
    fn single_dot_renders_braille_dot_one() {
        let mut surface = TerminalSurface::new(2, 1);
        surface.stroke(&[(0.0, 0.0), (0.0, 0.0)], 1.0, FOREGROUND);

        let buf = rendered(&surface);
        assert_eq!(buf[(0, 0)].symbol(), "\u{2801}");
    }

    #[test]
    fn overlapping_dots_keep_the_brightest_color() {
        let mut surface = TerminalSurface::new(1, 1);
        surface.stroke(&[(0.0, 0.0), (0.0, 0.0)], 1.0, Color::gray(40));
        surface.stroke(&[(1.0, 0.0), (1.0, 0.0)], 1.0, ACCENT);
        surface.stroke(&[(0.0, 1.0), (0.0, 1.0)], 1.0, Color::gray(10));

        let buf = rendered(&surface);
        // Dots 1, 4, and 2 of the cell, colored by the accent.
        assert_eq!(buf[(0, 0)].symbol(), "\u{280B}");
        assert_eq!(buf[(0, 0)].fg, rgb(ACCENT));
    }

    #[test]
    fn glyph_cells_ignore_later_dots() {
        let mut surface = TerminalSurface::new(2, 1);
        surface.glyph('A', 0.0, 0.0, FOREGROUND);
        surface.stroke(&[(0.0, 0.0), (1.0, 0.0)], 1.0, ACCENT);

        let buf = rendered(&surface);
        assert_eq!(buf[(0, 0)].symbol(), "A");
        assert_eq!(buf[(0, 0)].fg, rgb(FOREGROUND));
    }

    #[test]
    fn glyph_addresses_cells_by_pixel_origin() {
        let mut surface = TerminalSurface::new(3, 2);
        surface.glyph('x', 2.0, 4.0, FOREGROUND);

        let buf = rendered(&surface);
        assert_eq!(buf[(1, 1)].symbol(), "x");
        assert_eq!(buf[(0, 0)].symbol(), " ");
    }

    #[test]
    fn fill_reaches_the_baseline_with_gradient_color() {
        let mut surface = TerminalSurface::new(4, 4);
        let gradient = Gradient::new(vec![(0.0, ACCENT), (1.0, ACCENT)]);
        surface.fill_under_curve(&[(0.0, 4.0), (7.0, 4.0)], 15.0, &gradient);

        let buf = rendered(&surface);
        for col in 0..4 {
            for row in 1..4 {
                assert_eq!(
                    buf[(col, row)].symbol(),
                    "\u{28FF}",
                    "cell ({col},{row}) must be fully dotted"
                );
                assert_eq!(buf[(col, row)].fg, rgb(ACCENT));
            }
            assert_eq!(buf[(col, 0)].symbol(), " ", "above the curve stays empty");
        }
    }

    #[test]
    fn blit_maps_a_two_px_strip_to_one_half_row() {
        let mut surface = TerminalSurface::new(4, 4);
        let mut pixels = PixelBuffer::new(8, 16);
        for x in 0..8 {
            pixels.set_pixel(x, 0, (100, 150, 200));
            pixels.set_pixel(x, 1, (100, 150, 200));
        }
        surface.blit(&pixels);

        let buf = rendered(&surface);
        assert_eq!(buf[(0, 0)].symbol(), "\u{2580}");
        assert_eq!(buf[(0, 0)].fg, TermColor::Rgb(100, 150, 200));
        assert_eq!(buf[(0, 0)].bg, TermColor::Rgb(0, 0, 0));
        // The strip is exactly one half block tall; the next row is black.
        assert_eq!(buf[(0, 1)].fg, TermColor::Rgb(0, 0, 0));
    }

    #[test]
    fn blit_averages_each_half_block() {
        let mut surface = TerminalSurface::new(1, 1);
        let mut pixels = PixelBuffer::new(2, 4);
        pixels.set_pixel(0, 0, (255, 255, 255));
        surface.blit(&pixels);

        let buf = rendered(&surface);
        // One of four pixels in the top block is white.
        assert_eq!(buf[(0, 0)].fg, TermColor::Rgb(63, 63, 63));
        assert_eq!(buf[(0, 0)].bg, TermColor::Rgb(0, 0, 0));
    }

    #[test]
    fn clear_wipes_every_cell() {
        let mut surface = TerminalSurface::new(2, 2);
        surface.glyph('A', 0.0, 0.0, FOREGROUND);
        surface.stroke(&[(2.0, 4.0), (3.0, 7.0)], 1.0, ACCENT);

        surface.clear();

        let buf = rendered(&surface);
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(buf[(x, y)].symbol(), " ");
            }
        }
    }

    #[test]
    fn resize_drops_content_and_updates_metrics() {
        let mut surface = TerminalSurface::new(2, 2);
        surface.glyph('A', 0.0, 0.0, FOREGROUND);

        surface.resize(3, 1);
        assert_eq!(surface.metrics().width_px, 6.0);
        assert_eq!(surface.metrics().height_px, 4.0);

        let buf = rendered(&surface);
        assert_eq!(buf[(0, 0)].symbol(), " ");
    }

    #[test]
    fn resize_to_the_same_size_keeps_content() {
        let mut surface = TerminalSurface::new(2, 2);
        surface.glyph('A', 0.0, 0.0, FOREGROUND);

        surface.resize(2, 2);

        let buf = rendered(&surface);
        assert_eq!(buf[(0, 0)].symbol(), "A");
    }

    #[test]
    fn widget_respects_the_target_area_origin() {
        let mut surface = TerminalSurface::new(2, 1);
        surface.glyph('A', 0.0, 0.0, FOREGROUND);

        let area = Rect::new(3, 2, 2, 1);
        let mut buf = Buffer::empty(Rect::new(0, 0, 6, 4));
        surface.render(area, &mut buf);

        assert_eq!(buf[(3, 2)].symbol(), "A");
        assert_eq!(buf[(0, 0)].symbol(), " ");
    }

    #[test]
    fn zero_sized_surface_accepts_draws() {
        let mut surface = TerminalSurface::new(0, 0);
        surface.glyph('A', 0.0, 0.0, FOREGROUND);
        surface.stroke(&[(0.0, 0.0), (5.0, 5.0)], 3.0, ACCENT);
        surface.fill_under_curve(
            &[(0.0, 0.0), (4.0, 2.0)],
            3.0,
            &Gradient::new(vec![(0.0, FOREGROUND)]),
        );
        surface.blit(&PixelBuffer::new(0, 0));
        surface.clear();
        assert_eq!(surface.metrics().columns(), 0);
    }

    #[test]
    fn out_of_bounds_draws_are_clipped() {
        let mut surface = TerminalSurface::new(2, 2);
        surface.stroke(&[(-10.0, -10.0), (-1.0, -1.0)], 1.0, FOREGROUND);
        surface.glyph('A', 100.0, 100.0, FOREGROUND);

        let buf = rendered(&surface);
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(buf[(x, y)].symbol(), " ");
            }
        }
    }
}
