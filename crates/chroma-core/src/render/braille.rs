//! Spectrum bars rasterized onto the braille dot lattice.

use crate::analysis::SampleSnapshot;
use crate::state::SurfaceMetrics;
use crate::surface::{ACCENT, Surface};

use super::{Renderer, intensity_gray, padded_average};

/// Braille pattern bits by dot position, `[column][row]` with rows top to
/// bottom. Unicode braille numbers dots 1-3 and 7 down the left column,
/// 4-6 and 8 down the right.
const DOT_BITS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40],
    [0x08, 0x10, 0x20, 0x80],
];

/// Dot count above which a cell flips to the accent color.
const ACCENT_THRESHOLD: f32 = 0.7;

/// Braille bar renderer.
///
/// Each terminal cell carries a 2x4 dot matrix, so the bar field runs at
/// double the horizontal and quadruple the vertical resolution of the
/// character grid. Bars grow from the bottom edge; each cell packs its lit
/// dots into a single braille character.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrailleRenderer;

impl BrailleRenderer {
    /// Stateless renderer.
    pub fn new() -> Self {
        BrailleRenderer
    }
}

impl Renderer for BrailleRenderer {
    fn render(
        &mut self,
        snapshot: &SampleSnapshot,
        surface: &mut dyn Surface,
        metrics: SurfaceMetrics,
    ) {
        surface.clear();

        let cols = metrics.columns();
        let rows = metrics.rows();
        let bins = &snapshot.frequency;
        if cols == 0 || rows == 0 || bins.is_empty() {
            return;
        }

        let dot_cols = cols * 2;
        let dot_rows = rows * 4;
        let per_column = (bins.len() / dot_cols).max(1);

        let mut heights = vec![0usize; dot_cols];
        for (dc, height) in heights.iter_mut().enumerate() {
            let start = dc * per_column;
            if start >= bins.len() {
                break;
            }
            let end = (start + per_column).min(bins.len());
            let avg = padded_average(&bins[start..end], per_column);
            *height = ((avg * dot_rows as f32).round() as usize).min(dot_rows);
        }

        for row in 0..rows {
            for col in 0..cols {
                let mut bits = 0u8;
                for (side, column_bits) in DOT_BITS.iter().enumerate() {
                    let bar = heights[col * 2 + side];
                    for (dr, &bit) in column_bits.iter().enumerate() {
                        let dot_row = row * 4 + dr;
                        // Lit when the dot sits inside the bar, measured
                        // from the bottom edge.
                        if dot_rows - dot_row <= bar {
                            bits |= bit;
                        }
                    }
                }
                if bits == 0 {
                    continue;
                }
                let Some(ch) = char::from_u32(0x2800 + u32::from(bits)) else {
                    continue;
                };
                let intensity = bits.count_ones() as f32 / 8.0;
                let color = if intensity > ACCENT_THRESHOLD {
                    ACCENT
                } else {
                    intensity_gray(intensity)
                };
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
