//! Falling glyph rain driven by spectrum energy.

use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::analysis::SampleSnapshot;
use crate::state::SurfaceMetrics;
use crate::surface::{ACCENT, Color, Surface};

use super::{Renderer, padded_average};

/// Glyph pool for the rain columns.
const GLYPHS: [char; 46] = [
    'ア', 'イ', 'ウ', 'エ', 'オ', 'カ', 'キ', 'ク', 'ケ', 'コ', 'サ', 'シ', 'ス', 'セ', 'ソ',
    'タ', 'チ', 'ツ', 'テ', 'ト', 'ナ', 'ニ', 'ヌ', 'ネ', 'ノ', 'ハ', 'ヒ', 'フ', 'ヘ', 'ホ',
    'マ', 'ミ', 'ム', 'メ', 'モ', 'ヤ', 'ユ', 'ヨ', 'ラ', 'リ', 'ル', 'レ', 'ロ', 'ワ', 'ヲ',
    'ン',
];

/// Chance per column per tick that one glyph in the column mutates.
const MUTATION_CHANCE: f32 = 0.05;

/// Column energy above which the head glyph uses the accent color.
const HEAD_ENERGY_THRESHOLD: f32 = 0.5;

/// Rows past the bottom edge a head may travel before wrapping.
const WRAP_MARGIN: f32 = 4.0;

/// Base fall rate in rows per second at unit speed and silent input.
const FALL_RATE: f32 = 10.0;

#[derive(Debug, Clone)]
struct Column {
    /// Head position in fractional rows; negative means above the screen.
    head: f32,
    speed: f32,
    glyphs: Vec<char>,
}

impl Column {
    fn seeded(rng: &mut SmallRng, rows: usize) -> Self {
        let mut column = Column {
            head: rng.random::<f32>() * rows as f32 * 2.0 - rows as f32,
            speed: 0.0,
            glyphs: Vec::new(),
        };
        column.reroll(rng, rows);
        column
    }

    /// New speed and glyph run; used at seed time and on wrap.
    fn reroll(&mut self, rng: &mut SmallRng, rows: usize) {
        self.speed = 0.5 + rng.random::<f32>() * 1.5;
        self.glyphs = (0..rows).map(|_| random_glyph(rng)).collect();
    }

    fn wrap(&mut self, rng: &mut SmallRng, rows: usize) {
        self.head = -(rng.random::<f32>() * rows as f32);
        self.reroll(rng, rows);
    }
}

fn random_glyph(rng: &mut SmallRng) -> char {
    GLYPHS[rng.random_range(0..GLYPHS.len())]
}

/// Glyph rain renderer.
///
/// Columns persist across ticks and are reseeded wholesale when the column
/// count changes. Fall speed scales with the average spectrum energy, and
/// per-column energy tints the trail and promotes hot heads to the accent
/// color.
#[derive(Debug)]
pub struct MatrixRenderer {
    columns: Vec<Column>,
    rng: SmallRng,
    last_tick: Option<Instant>,
}

impl MatrixRenderer {
    /// Renderer with OS-seeded randomness and no columns yet.
    pub fn new() -> Self {
        MatrixRenderer {
            columns: Vec::new(),
            rng: SmallRng::from_os_rng(),
            last_tick: None,
        }
    }

    /// Move every head by the time elapsed since the previous tick.
    fn advance(&mut self, now: Instant, cols: usize, rows: usize, avg_energy: f32) {
        let dt = self
            .last_tick
            .map(|tick| now.duration_since(tick).as_secs_f32())
            .unwrap_or(0.0);
        self.last_tick = Some(now);

        if self.columns.len() != cols {
            self.columns = (0..cols)
                .map(|_| Column::seeded(&mut self.rng, rows))
                .collect();
        }

        let rate = 0.5 + avg_energy * 2.0;
        for column in self.columns.iter_mut() {
            column.head += column.speed * rate * dt * FALL_RATE;
            if column.head > rows as f32 + WRAP_MARGIN {
                column.wrap(&mut self.rng, rows);
            }
            if !column.glyphs.is_empty() && self.rng.random::<f32>() < MUTATION_CHANCE {
                let idx = self.rng.random_range(0..column.glyphs.len());
                column.glyphs[idx] = random_glyph(&mut self.rng);
            }
        }
    }
}

impl Default for MatrixRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for MatrixRenderer {
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

        let total: u32 = bins.iter().map(|&b| u32::from(b)).sum();
        let avg_energy = total as f32 / bins.len() as f32 / 255.0;
        self.advance(Instant::now(), cols, rows, avg_energy);

        let per_column = (bins.len() / cols).max(1);
        for (col, column) in self.columns.iter().enumerate() {
            if column.glyphs.is_empty() {
                continue;
            }
            let start = col * per_column;
            let energy = if start >= bins.len() {
                0.0
            } else {
                let end = (start + per_column).min(bins.len());
                padded_average(&bins[start..end], per_column)
            };

            for row in 0..rows {
                let dist = column.head - row as f32;
                if dist < 0.0 || dist > rows as f32 {
                    continue;
                }
                let ch = column.glyphs[row % column.glyphs.len()];
                let color = if dist < 1.0 {
                    if energy > HEAD_ENERGY_THRESHOLD {
                        ACCENT
                    } else {
                        Color::rgb(255, 255, 255)
                    }
                } else {
                    let fade = 1.0 - dist / rows as f32;
                    let green = (40.0 + fade * 120.0 + energy * 60.0) as u8;
                    Color::rgb(0, green, 0)
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
