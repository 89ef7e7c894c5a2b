//! Frame pacing for the visualizer loop.
//!
//! The host drives this on every wake-up of its event loop; the scheduler
//! decides which wake-ups become visualizer frames. Pacing is measured from
//! the last accepted frame, so rendering settles at the target rate no
//! matter how often the host polls.

use std::time::{Duration, Instant};

use crate::analysis::AnalysisHandle;
use crate::render::RendererRegistry;
use crate::state::{SurfaceMetrics, VisualizerMode};
use crate::surface::Surface;

/// Default visualizer frame rate.
pub const TARGET_FPS: u32 = 30;

/// What a single scheduler wake-up did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Loop not running, or no analysis tap to sample.
    Idle,
    /// Woke up before the frame interval elapsed.
    Dropped,
    /// Rendering is off; the surface was wiped.
    Cleared,
    /// A renderer drew a frame.
    Rendered,
}

/// Paced render loop over the renderer registry.
#[derive(Debug)]
pub struct FrameScheduler {
    interval: Duration,
    last_tick: Option<Instant>,
    running: bool,
    reduced_motion: bool,
    registry: RendererRegistry,
}

impl FrameScheduler {
    /// Scheduler at the default frame rate.
    pub fn new(reduced_motion: bool) -> Self {
        Self::with_rate(TARGET_FPS, reduced_motion)
    }

    /// Scheduler at a custom frame rate.
    pub fn with_rate(fps: u32, reduced_motion: bool) -> Self {
        FrameScheduler {
            interval: Duration::from_secs_f64(1.0 / f64::from(fps.max(1))),
            last_tick: None,
            running: false,
            reduced_motion,
            registry: RendererRegistry::new(),
        }
    }

    /// Start or stop the loop to follow the transport.
    ///
    /// The loop runs only while audio is playing and an analysis tap exists;
    /// under reduced motion it never runs. Stopping clears the pacing clock
    /// so the next start renders immediately.
    pub fn sync_transport(&mut self, playing: bool, has_tap: bool) {
        let desired = playing && has_tap && !self.reduced_motion;
        if desired == self.running {
            return;
        }
        self.running = desired;
        if desired {
            log::debug!("visualizer loop started");
        } else {
            log::debug!("visualizer loop stopped");
            self.last_tick = None;
        }
    }

    /// Stop the loop unconditionally.
    pub fn stop(&mut self) {
        self.running = false;
        self.last_tick = None;
    }

    /// Whether wake-ups currently produce frames.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the reduced-motion preference suppresses the loop.
    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    /// Offer the scheduler a wake-up at `now`.
    ///
    /// Wake-ups closer together than the frame interval are dropped. An
    /// accepted wake-up either wipes the surface (mode off) or pulls one
    /// snapshot from the tap and hands it to the active renderer. While the
    /// loop is stopped the surface is left untouched, freezing the last
    /// frame.
    pub fn frame(
        &mut self,
        now: Instant,
        mode: VisualizerMode,
        tap: Option<&AnalysisHandle>,
        surface: &mut dyn Surface,
        metrics: SurfaceMetrics,
    ) -> FrameOutcome {
        if !self.running {
            return FrameOutcome::Idle;
        }
        if let Some(last) = self.last_tick {
            if now.duration_since(last) < self.interval {
                return FrameOutcome::Dropped;
            }
        }
        self.last_tick = Some(now);

        if mode.is_off() {
            surface.clear();
            return FrameOutcome::Cleared;
        }
        let Some(tap) = tap else {
            return FrameOutcome::Idle;
        };
        let snapshot = tap.snapshot();
        match self.registry.renderer_mut(mode) {
            Some(renderer) => {
                renderer.render(&snapshot, surface, metrics);
                FrameOutcome::Rendered
            }
            None => FrameOutcome::Idle,
        }
    }
}
