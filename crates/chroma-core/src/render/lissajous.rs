//! Phase-space portrait of the time-domain signal.

use crate::analysis::SampleSnapshot;
use crate::state::SurfaceMetrics;
use crate::surface::{FOREGROUND, Surface};

use super::{Renderer, amplitude_signed};

/// Fraction of the shorter half-axis the figure may reach.
const RADIUS_SCALE: f32 = 0.85;

/// Fraction of the sample window used as the delay between the X and Y
/// coordinates of each point. A mono signal plotted against a delayed copy
/// of itself traces ellipses whose shape follows the dominant pitch.
const DELAY_FRACTION: f32 = 0.015;

const CROSSHAIR_ALPHA: f32 = 0.05;
const GLOW_WIDTH: f32 = 3.0;
const GLOW_ALPHA: f32 = 0.4;
const LINE_WIDTH: f32 = 1.5;

/// Lissajous curve renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct LissajousRenderer;

impl LissajousRenderer {
    /// Stateless renderer.
    pub fn new() -> Self {
        LissajousRenderer
    }
}

impl Renderer for LissajousRenderer {
    fn render(
        &mut self,
        snapshot: &SampleSnapshot,
        surface: &mut dyn Surface,
        metrics: SurfaceMetrics,
    ) {
        surface.clear();

        let width = metrics.width_px;
        let height = metrics.height_px;
        if width <= 0.0 || height <= 0.0 {
            return;
        }

        let cx = width / 2.0;
        let cy = height / 2.0;

        let vertical = [(cx, 0.0), (cx, height)];
        let horizontal = [(0.0, cy), (width, cy)];
        surface.stroke(&vertical, 1.0, FOREGROUND.with_alpha(CROSSHAIR_ALPHA));
        surface.stroke(&horizontal, 1.0, FOREGROUND.with_alpha(CROSSHAIR_ALPHA));

        let samples = &snapshot.time_domain;
        let delay = ((samples.len() as f32 * DELAY_FRACTION) as usize).max(1);
        if samples.len() <= delay + 1 {
            return;
        }

        let radius = cx.min(cy) * RADIUS_SCALE;
        let mut curve = Vec::with_capacity(samples.len() - delay);
        for i in 0..samples.len() - delay {
            let xs = amplitude_signed(samples[i]);
            let ys = amplitude_signed(samples[i + delay]);
            curve.push((cx + xs * radius, cy - ys * radius));
        }

        surface.stroke(&curve, GLOW_WIDTH, FOREGROUND.with_alpha(GLOW_ALPHA));
        surface.stroke(&curve, LINE_WIDTH, FOREGROUND);
    }
}
