//! Oscilloscope trace with a filled body and layered strokes.

use crate::analysis::SampleSnapshot;
use crate::state::SurfaceMetrics;
use crate::surface::{FOREGROUND, Gradient, Surface};

use super::{Renderer, amplitude_signed};

/// Fraction of the half-height the trace may swing.
const AMPLITUDE_SCALE: f32 = 0.85;

/// Line segments each curve span is flattened into.
const CURVE_STEPS: usize = 4;

const GLOW_WIDTH: f32 = 3.0;
const GLOW_ALPHA: f32 = 0.4;
const LINE_WIDTH: f32 = 1.5;
const FILL_EDGE_ALPHA: f32 = 0.15;
const FILL_MID_ALPHA: f32 = 0.04;
const CENTERLINE_ALPHA: f32 = 0.06;

/// Time-domain trace renderer.
///
/// Consecutive samples are joined with quadratic spans running from midpoint
/// to midpoint with the sample itself as the control point, which rounds off
/// the corners of the raw polyline. The body between the trace and the
/// centerline is filled with a faint vertical gradient, then the trace
/// itself is drawn twice: a wide translucent glow pass under a thin bright
/// pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct WaveformRenderer;

impl WaveformRenderer {
    /// Stateless renderer.
    pub fn new() -> Self {
        WaveformRenderer
    }
}

impl Renderer for WaveformRenderer {
    fn render(
        &mut self,
        snapshot: &SampleSnapshot,
        surface: &mut dyn Surface,
        metrics: SurfaceMetrics,
    ) {
        surface.clear();

        let width = metrics.width_px;
        let height = metrics.height_px;
        let samples = &snapshot.time_domain;
        if width <= 0.0 || height <= 0.0 || samples.is_empty() {
            return;
        }

        let mid_y = height / 2.0;
        let slice = width / samples.len() as f32;

        let points: Vec<(f32, f32)> = samples
            .iter()
            .enumerate()
            .map(|(i, &byte)| (i as f32 * slice, trace_y(byte, mid_y)))
            .collect();

        let mut curve = Vec::with_capacity(points.len() * CURVE_STEPS);
        curve.push(points[0]);
        let mut pen = points[0];
        for i in 1..points.len().saturating_sub(1) {
            let next = points[i + 1];
            let mid = (
                (points[i].0 + next.0) / 2.0,
                (points[i].1 + next.1) / 2.0,
            );
            append_quadratic(&mut curve, pen, points[i], mid);
            pen = mid;
        }
        if points.len() > 1 {
            curve.push(points[points.len() - 1]);
        }

        let fill = Gradient::new(vec![
            (0.0, FOREGROUND.with_alpha(FILL_EDGE_ALPHA)),
            (0.5, FOREGROUND.with_alpha(FILL_MID_ALPHA)),
            (1.0, FOREGROUND.with_alpha(FILL_EDGE_ALPHA)),
        ]);
        surface.fill_under_curve(&curve, mid_y, &fill);

        surface.stroke(&curve, GLOW_WIDTH, FOREGROUND.with_alpha(GLOW_ALPHA));
        surface.stroke(&curve, LINE_WIDTH, FOREGROUND);

        let centerline = [(0.0, mid_y), (width, mid_y)];
        surface.stroke(&centerline, 1.0, FOREGROUND.with_alpha(CENTERLINE_ALPHA));
    }
}

fn trace_y(byte: u8, mid_y: f32) -> f32 {
    mid_y - amplitude_signed(byte) * mid_y * AMPLITUDE_SCALE
}

/// Flatten one quadratic span into `CURVE_STEPS` line segments, excluding
/// the start point (the caller already holds it).
fn append_quadratic(
    out: &mut Vec<(f32, f32)>,
    p0: (f32, f32),
    control: (f32, f32),
    p1: (f32, f32),
) {
    for step in 1..=CURVE_STEPS {
        let t = step as f32 / CURVE_STEPS as f32;
        let u = 1.0 - t;
        let w0 = u * u;
        let w1 = 2.0 * u * t;
        let w2 = t * t;
        out.push((
            w0 * p0.0 + w1 * control.0 + w2 * p1.0,
            w0 * p0.1 + w1 * control.1 + w2 * p1.1,
        ));
    }
}
