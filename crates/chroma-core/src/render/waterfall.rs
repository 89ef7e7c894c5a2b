//! Scrolling spectrogram.

use crate::analysis::SampleSnapshot;
use crate::state::SurfaceMetrics;
use crate::surface::{ACCENT, PixelBuffer, Surface};

use super::{Renderer, magnitude_unit};

/// Pixels the history scrolls down per tick; also the height of the fresh
/// strip painted at the top.
const SCROLL_PX: usize = 2;

/// Bin values above this fraction recolor to the accent hue.
const HOT_THRESHOLD: f32 = 0.85;

/// Spectrogram renderer with a persistent scroll buffer.
///
/// The buffer survives across ticks and is reallocated only when the surface
/// size changes; each tick shifts history down and paints one new strip of
/// frequency data at the top.
#[derive(Debug, Clone)]
pub struct WaterfallRenderer {
    buffer: PixelBuffer,
}

impl WaterfallRenderer {
    /// Renderer with an empty history.
    pub fn new() -> Self {
        WaterfallRenderer {
            buffer: PixelBuffer::new(0, 0),
        }
    }
}

impl Default for WaterfallRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for WaterfallRenderer {
    fn render(
        &mut self,
        snapshot: &SampleSnapshot,
        surface: &mut dyn Surface,
        metrics: SurfaceMetrics,
    ) {
        let w = metrics.width_px as usize;
        let h = metrics.height_px as usize;
        if w == 0 || h == 0 {
            surface.clear();
            return;
        }

        if self.buffer.width() != w || self.buffer.height() != h {
            self.buffer = PixelBuffer::new(w, h);
        }

        self.buffer.shift_down(SCROLL_PX);

        let bins = &snapshot.frequency;
        if bins.is_empty() {
            surface.clear();
            surface.blit(&self.buffer);
            return;
        }

        for x in 0..w {
            let bin = bins[x * bins.len() / w];
            let value = magnitude_unit(bin);

            // Warm monochrome ramp with a slightly cooler blue channel;
            // hot bins flip to the accent color.
            let rgb = if value > HOT_THRESHOLD {
                (ACCENT.r, ACCENT.g, ACCENT.b)
            } else {
                let base = (value * 224.0) as u8;
                (base, base, (value * 200.0) as u8)
            };

            for y in 0..SCROLL_PX.min(h) {
                self.buffer.set_pixel(x, y, rgb);
            }
        }

        surface.clear();
        surface.blit(&self.buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::{RecordingSurface, cell_metrics, uniform_spectrum};

    #[test]
    fn history_scrolls_down_each_tick() {
        let mut renderer = WaterfallRenderer::new();
        let mut surface = RecordingSurface::new();
        let metrics = cell_metrics(4, 2); // 8x8 px

        renderer.render(&uniform_spectrum(255), &mut surface, metrics);
        let first = surface.blits[0].clone();
        let hot = first.pixel(0, 0);
        assert_eq!(hot, (ACCENT.r, ACCENT.g, ACCENT.b));

        renderer.render(&uniform_spectrum(0), &mut surface, metrics);
        let second = surface.blits.last().unwrap();

        // The hot strip moved down by the scroll increment.
        assert_eq!(second.pixel(0, SCROLL_PX), hot);
        // The fresh strip at the top is silent black.
        assert_eq!(second.pixel(0, 0), (0, 0, 0));
    }

    #[test]
    fn seeded_content_scrolls_out_completely() {
        let mut renderer = WaterfallRenderer::new();
        let mut surface = RecordingSurface::new();
        let metrics = cell_metrics(4, 2); // 8 px tall
        let height = metrics.height_px as usize;

        renderer.render(&uniform_spectrum(255), &mut surface, metrics);

        // After enough ticks that K * scroll >= height, nothing from the
        // seeded frame can remain visible.
        let ticks = height / SCROLL_PX;
        for _ in 0..ticks {
            renderer.render(&uniform_spectrum(0), &mut surface, metrics);
        }

        let last = surface.blits.last().unwrap();
        for y in 0..height {
            for x in 0..metrics.width_px as usize {
                assert_eq!(last.pixel(x, y), (0, 0, 0), "stale pixel at ({x}, {y})");
            }
        }
    }

    #[test]
    fn buffer_reallocates_on_resize() {
        let mut renderer = WaterfallRenderer::new();
        let mut surface = RecordingSurface::new();

        renderer.render(&uniform_spectrum(255), &mut surface, cell_metrics(4, 2));
        renderer.render(&uniform_spectrum(0), &mut surface, cell_metrics(8, 4));

        let resized = surface.blits.last().unwrap();
        assert_eq!(resized.width(), 16);
        assert_eq!(resized.height(), 16);
        // History from the old geometry is gone.
        assert_eq!(resized.pixel(0, SCROLL_PX), (0, 0, 0));
    }

    #[test]
    fn moderate_bins_use_the_monochrome_ramp() {
        let mut renderer = WaterfallRenderer::new();
        let mut surface = RecordingSurface::new();

        renderer.render(&uniform_spectrum(128), &mut surface, cell_metrics(4, 2));

        let buffer = surface.blits.last().unwrap();
        let value = 128.0 / 255.0;
        let expected = (
            (value * 224.0) as u8,
            (value * 224.0) as u8,
            (value * 200.0) as u8,
        );
        assert_eq!(buffer.pixel(0, 0), expected);
    }
}
