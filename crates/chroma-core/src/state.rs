//! Shared state types for the playback engine and visualizer subsystem.

use std::fmt;

use crate::analysis::AnalysisHandle;

/// Lifecycle of the playback engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    /// No source loaded, or the last load failed.
    #[default]
    Unloaded,
    /// Source opened, waiting for metadata.
    Loading,
    /// Source ready, not playing.
    Paused,
    /// Source ready and audibly playing.
    Playing,
    /// Natural end of track reached with repeat off.
    Ended,
}

/// Snapshot of everything the engine knows about playback.
///
/// Produced only by [`PlaybackEngine`](crate::engine::PlaybackEngine);
/// observers receive a fresh clone after every mutation.
#[derive(Debug, Clone, Default)]
pub struct PlaybackState {
    /// Where the engine is in its lifecycle.
    pub transport: TransportState,
    /// Playback position in seconds. Never exceeds `duration` once known.
    pub current_time: f64,
    /// Track length in seconds. `None` until metadata arrives, and stays
    /// `None` for unbounded sources (which disables seeking).
    pub duration: Option<f64>,
    /// Output volume, always clamped to [0, 1].
    pub volume: f32,
    /// When set, end-of-track restarts from position 0 instead of stopping.
    pub repeat: bool,
    /// Handle to the analysis tap once the graph has been built.
    pub analysis: Option<AnalysisHandle>,
}

impl PlaybackState {
    /// Whether the source is audibly playing.
    pub fn is_playing(&self) -> bool {
        self.transport == TransportState::Playing
    }

    /// Playback progress in [0, 1], or 0 while the duration is unknown.
    pub fn progress(&self) -> f64 {
        match self.duration {
            Some(d) if d > 0.0 => (self.current_time / d).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

/// Active visualizer algorithm, cycled forward by the `v` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisualizerMode {
    /// Rendering disabled; the scheduler only clears the surface.
    #[default]
    Off,
    /// Block-glyph spectrum bars.
    Spectrum,
    /// Scrolling spectrogram.
    Waterfall,
    /// Oscilloscope waveform.
    Waveform,
    /// Dual-channel phase figure.
    Lissajous,
    /// Braille dot-matrix spectrum.
    Braille,
    /// Falling-glyph rain driven by spectral energy.
    Matrix,
}

impl VisualizerMode {
    /// All modes in cycling order.
    pub const fn all() -> [VisualizerMode; 7] {
        [
            VisualizerMode::Off,
            VisualizerMode::Spectrum,
            VisualizerMode::Waterfall,
            VisualizerMode::Waveform,
            VisualizerMode::Lissajous,
            VisualizerMode::Braille,
            VisualizerMode::Matrix,
        ]
    }

    /// The next mode in cycling order, wrapping back to [`VisualizerMode::Off`].
    pub fn next(self) -> Self {
        let modes = Self::all();
        let idx = modes.iter().position(|m| *m == self).unwrap_or(0);
        modes[(idx + 1) % modes.len()]
    }

    /// Whether rendering is disabled.
    pub fn is_off(self) -> bool {
        self == VisualizerMode::Off
    }

    /// Parse a mode name as given on the command line.
    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "off" => Some(VisualizerMode::Off),
            "spectrum" => Some(VisualizerMode::Spectrum),
            "waterfall" => Some(VisualizerMode::Waterfall),
            "waveform" => Some(VisualizerMode::Waveform),
            "lissajous" => Some(VisualizerMode::Lissajous),
            "braille" => Some(VisualizerMode::Braille),
            "matrix" => Some(VisualizerMode::Matrix),
            _ => None,
        }
    }

    /// Get string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualizerMode::Off => "off",
            VisualizerMode::Spectrum => "spectrum",
            VisualizerMode::Waterfall => "waterfall",
            VisualizerMode::Waveform => "waveform",
            VisualizerMode::Lissajous => "lissajous",
            VisualizerMode::Braille => "braille",
            VisualizerMode::Matrix => "matrix",
        }
    }
}

impl fmt::Display for VisualizerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometry of the drawing surface, recomputed on every resize.
///
/// All renderers work in pixel space; the cell dimensions describe the
/// footprint of one monospace glyph for the character-grid algorithms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMetrics {
    /// Drawable width in pixels.
    pub width_px: f32,
    /// Drawable height in pixels.
    pub height_px: f32,
    /// Width of one glyph cell in pixels.
    pub cell_width_px: f32,
    /// Height of one glyph cell in pixels.
    pub cell_height_px: f32,
}

impl SurfaceMetrics {
    /// Full glyph columns that fit the surface.
    pub fn columns(&self) -> usize {
        if self.cell_width_px > 0.0 {
            (self.width_px / self.cell_width_px) as usize
        } else {
            0
        }
    }

    /// Full glyph rows that fit the surface.
    pub fn rows(&self) -> usize {
        if self.cell_height_px > 0.0 {
            (self.height_px / self.cell_height_px) as usize
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_cycle_is_total() {
        let modes = VisualizerMode::all();
        for start in modes {
            let mut mode = start;
            for _ in 0..modes.len() {
                mode = mode.next();
            }
            assert_eq!(mode, start, "cycling {} times must return to start", modes.len());
        }
    }

    #[test]
    fn mode_cycle_visits_every_mode() {
        let mut seen = Vec::new();
        let mut mode = VisualizerMode::Off;
        for _ in 0..VisualizerMode::all().len() {
            seen.push(mode);
            mode = mode.next();
        }
        for expected in VisualizerMode::all() {
            assert!(seen.contains(&expected), "cycle must visit {expected}");
        }
    }

    #[test]
    fn mode_round_trips_through_names() {
        for mode in VisualizerMode::all() {
            assert_eq!(VisualizerMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(VisualizerMode::from_str("SPECTRUM"), Some(VisualizerMode::Spectrum));
        assert_eq!(VisualizerMode::from_str("nope"), None);
    }

    #[test]
    fn metrics_cell_counts() {
        let metrics = SurfaceMetrics {
            width_px: 160.0,
            height_px: 80.0,
            cell_width_px: 2.0,
            cell_height_px: 4.0,
        };
        assert_eq!(metrics.columns(), 80);
        assert_eq!(metrics.rows(), 20);
    }

    #[test]
    fn progress_handles_unknown_duration() {
        let mut state = PlaybackState::default();
        state.current_time = 42.0;
        assert_eq!(state.progress(), 0.0);

        state.duration = Some(84.0);
        assert_eq!(state.progress(), 0.5);
    }
}
