//! Visualizer rendering algorithms.
//!
//! Six interchangeable renderers map one [`SampleSnapshot`] plus the current
//! [`SurfaceMetrics`] onto a [`Surface`]. Renderers own their transient
//! state (scroll buffers, rain columns) and reset it themselves when the
//! surface geometry changes; nothing is shared between algorithms.

mod braille;
mod lissajous;
mod matrix;
mod spectrum;
mod waterfall;
mod waveform;

pub use braille::BrailleRenderer;
pub use lissajous::LissajousRenderer;
pub use matrix::MatrixRenderer;
pub use spectrum::SpectrumRenderer;
pub use waterfall::WaterfallRenderer;
pub use waveform::WaveformRenderer;

use crate::analysis::SampleSnapshot;
use crate::state::{SurfaceMetrics, VisualizerMode};
use crate::surface::{Color, Surface};

/// One visualizer algorithm.
///
/// Every call clears and repaints the full drawn region, so switching modes
/// never layers stale output.
pub trait Renderer {
    /// Paint one frame.
    fn render(
        &mut self,
        snapshot: &SampleSnapshot,
        surface: &mut dyn Surface,
        metrics: SurfaceMetrics,
    );
}

/// Fixed mapping from each non-off mode to its renderer instance.
///
/// Built once at startup and never remapped; per-renderer state lives for
/// the lifetime of the registry.
#[derive(Debug, Default)]
pub struct RendererRegistry {
    spectrum: SpectrumRenderer,
    waterfall: WaterfallRenderer,
    waveform: WaveformRenderer,
    lissajous: LissajousRenderer,
    braille: BrailleRenderer,
    matrix: MatrixRenderer,
}

impl RendererRegistry {
    /// Registry with all six renderers ready.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer for a mode, or `None` for [`VisualizerMode::Off`].
    pub fn renderer_mut(&mut self, mode: VisualizerMode) -> Option<&mut dyn Renderer> {
        match mode {
            VisualizerMode::Off => None,
            VisualizerMode::Spectrum => Some(&mut self.spectrum),
            VisualizerMode::Waterfall => Some(&mut self.waterfall),
            VisualizerMode::Waveform => Some(&mut self.waveform),
            VisualizerMode::Lissajous => Some(&mut self.lissajous),
            VisualizerMode::Braille => Some(&mut self.braille),
            VisualizerMode::Matrix => Some(&mut self.matrix),
        }
    }
}

/// Normalize a magnitude byte to [0, 1].
pub(crate) fn magnitude_unit(byte: u8) -> f32 {
    byte as f32 / 255.0
}

/// Center an amplitude byte to [-1, 1].
pub(crate) fn amplitude_signed(byte: u8) -> f32 {
    (byte as f32 - 128.0) / 128.0
}

/// Average a bin slice to [0, 1] as if `per_column` bins contributed.
///
/// Slices at the right edge of the spectrum may be shorter than the column
/// width; the missing bins count as silence.
pub(crate) fn padded_average(bins: &[u8], per_column: usize) -> f32 {
    if per_column == 0 {
        return 0.0;
    }
    let sum: u32 = bins.iter().map(|&b| u32::from(b)).sum();
    sum as f32 / per_column as f32 / 255.0
}

/// Grayscale ramp shared by the character-grid renderers: dim floor at 80,
/// full intensity at 220.
pub(crate) fn intensity_gray(intensity: f32) -> Color {
    Color::gray((80.0 + intensity.clamp(0.0, 1.0) * 140.0) as u8)
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::analysis::{BIN_COUNT, FFT_SIZE, SampleSnapshot};
    use crate::state::SurfaceMetrics;
    use crate::surface::{Color, Gradient, PixelBuffer, Surface};

    /// Surface that records every draw call for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingSurface {
        pub clears: usize,
        pub glyphs: Vec<(char, f32, f32, Color)>,
        pub strokes: Vec<(Vec<(f32, f32)>, f32, Color)>,
        pub fills: Vec<(Vec<(f32, f32)>, f32)>,
        pub blits: Vec<PixelBuffer>,
    }

    impl RecordingSurface {
        pub fn new() -> Self {
            Self::default()
        }

        /// Glyph drawn at an exact cell origin, if any.
        pub fn glyph_at(&self, x: f32, y: f32) -> Option<(char, Color)> {
            self.glyphs
                .iter()
                .find(|(_, gx, gy, _)| *gx == x && *gy == y)
                .map(|(ch, _, _, color)| (*ch, *color))
        }
    }

    impl Surface for RecordingSurface {
        fn clear(&mut self) {
            self.clears += 1;
            self.glyphs.clear();
            self.strokes.clear();
            self.fills.clear();
            self.blits.clear();
        }

        fn glyph(&mut self, ch: char, x: f32, y: f32, color: Color) {
            self.glyphs.push((ch, x, y, color));
        }

        fn stroke(&mut self, points: &[(f32, f32)], width: f32, color: Color) {
            self.strokes.push((points.to_vec(), width, color));
        }

        fn fill_under_curve(&mut self, points: &[(f32, f32)], baseline_y: f32, _gradient: &Gradient) {
            self.fills.push((points.to_vec(), baseline_y));
        }

        fn blit(&mut self, pixels: &PixelBuffer) {
            self.blits.push(pixels.clone());
        }
    }

    /// Metrics for a terminal-like grid of 2x4 px glyph cells.
    pub fn cell_metrics(cols: usize, rows: usize) -> SurfaceMetrics {
        SurfaceMetrics {
            width_px: cols as f32 * 2.0,
            height_px: rows as f32 * 4.0,
            cell_width_px: 2.0,
            cell_height_px: 4.0,
        }
    }

    /// Snapshot with every frequency bin at `byte` and a silent waveform.
    pub fn uniform_spectrum(byte: u8) -> SampleSnapshot {
        SampleSnapshot {
            frequency: vec![byte; BIN_COUNT],
            time_domain: vec![128; FFT_SIZE],
        }
    }

    /// Snapshot with a flat time-domain amplitude and a silent spectrum.
    pub fn uniform_wave(byte: u8) -> SampleSnapshot {
        SampleSnapshot {
            frequency: vec![0; BIN_COUNT],
            time_domain: vec![byte; FFT_SIZE],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::VisualizerMode;

    #[test]
    fn registry_covers_every_rendering_mode() {
        let mut registry = RendererRegistry::new();
        for mode in VisualizerMode::all() {
            let renderer = registry.renderer_mut(mode);
            assert_eq!(
                renderer.is_some(),
                !mode.is_off(),
                "mode {mode} registry entry mismatch"
            );
        }
    }

    #[test]
    fn byte_normalization_conventions() {
        assert_eq!(magnitude_unit(0), 0.0);
        assert_eq!(magnitude_unit(255), 1.0);
        assert_eq!(amplitude_signed(128), 0.0);
        assert_eq!(amplitude_signed(0), -1.0);
        assert!((amplitude_signed(255) - 0.992).abs() < 0.001);
    }

    #[test]
    fn padded_average_counts_missing_bins_as_silence() {
        assert_eq!(padded_average(&[255, 255], 2), 1.0);
        assert_eq!(padded_average(&[255, 255], 4), 0.5);
        assert_eq!(padded_average(&[], 4), 0.0);
        assert_eq!(padded_average(&[255], 0), 0.0);
    }
}
