//! Block-glyph spectrum bars.

use crate::analysis::SampleSnapshot;
use crate::state::SurfaceMetrics;
use crate::surface::{ACCENT, Surface};

use super::{Renderer, intensity_gray, padded_average};

/// Glyph ramp from full block down to empty, indexed by remaining fill.
const BLOCKS: [char; 9] = ['█', '▇', '▆', '▅', '▄', '▃', '▂', '▁', ' '];

/// Column averages above this light the top rows in the accent color.
const PEAK_THRESHOLD: f32 = 0.6;

/// Stateless bar-spectrum renderer.
///
/// Frequency bins are partitioned evenly across the glyph columns; each
/// column's average drives a bar built from graduated block glyphs, with the
/// fractional top cell picking a partial block.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpectrumRenderer;

impl Renderer for SpectrumRenderer {
    fn render(
        &mut self,
        snapshot: &SampleSnapshot,
        surface: &mut dyn Surface,
        metrics: SurfaceMetrics,
    ) {
        surface.clear();

        let cols = metrics.columns();
        let rows = metrics.rows();
        if cols == 0 || rows == 0 {
            return;
        }

        let bins = &snapshot.frequency;
        let bins_per_col = (bins.len() / cols).max(1);

        for col in 0..cols {
            let start = col * bins_per_col;
            if start >= bins.len() {
                break;
            }
            let end = (start + bins_per_col).min(bins.len());
            let avg = padded_average(&bins[start..end], bins_per_col);
            let bar_height = avg * rows as f32;

            for row in 0..rows {
                let row_from_bottom = (rows - 1 - row) as f32;
                let fill = bar_height - row_from_bottom;
                if fill <= 0.0 {
                    continue;
                }

                let (ch, intensity) = if fill >= 1.0 {
                    (BLOCKS[0], 1.0)
                } else {
                    let idx = ((1.0 - fill) * (BLOCKS.len() - 1) as f32) as usize;
                    (BLOCKS[idx.min(BLOCKS.len() - 1)], fill)
                };
                if ch == ' ' {
                    continue;
                }

                let is_peak = row_from_bottom >= rows as f32 - 2.0 && avg > PEAK_THRESHOLD;
                let color = if is_peak { ACCENT } else { intensity_gray(intensity) };

                surface.glyph(
                    ch,
                    col as f32 * metrics.cell_width_px,
                    row as f32 * metrics.cell_height_px,
                    color,
                );
            }
        }
    }
}
