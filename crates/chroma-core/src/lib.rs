//! Playback engine and real-time audio visualizer core.
//!
//! This crate holds everything about the player that is independent of the
//! audio device and the terminal: the playback state machine, the FFT
//! analysis tap, six visualizer render algorithms, and the frame scheduler
//! that paces them. Hosts supply two things at the edges: a
//! [`MediaBackend`] that decodes and outputs audio, and a [`Surface`] the
//! renderers draw on.
//!
//! # Traits
//!
//! - [`MediaBackend`] - Decoding and output facade driven by the engine
//! - [`Surface`] - Drawing target for the render algorithms
//! - [`Renderer`] - One visualizer algorithm
//!
//! # Example
//!
//! ```ignore
//! use chroma_core::{FrameScheduler, PlaybackEngine, VisualizerMode};
//!
//! let mut engine = PlaybackEngine::new(open_backend);
//! engine.load("track.ogg")?;
//! engine.toggle_play();
//!
//! let mut scheduler = FrameScheduler::new(false);
//! loop {
//!     engine.pump();
//!     let state = engine.state();
//!     scheduler.sync_transport(state.is_playing(), state.analysis.is_some());
//!     scheduler.frame(
//!         std::time::Instant::now(),
//!         VisualizerMode::Spectrum,
//!         state.analysis.as_ref(),
//!         &mut surface,
//!         metrics,
//!     );
//! }
//! ```

#![warn(missing_docs)]

pub mod analysis;
pub mod bindings;
pub mod engine;
pub mod error;
pub mod render;
pub mod scheduler;
pub mod state;
pub mod surface;

pub use analysis::{AnalysisHandle, BIN_COUNT, FFT_SIZE, SampleSnapshot, SampleSource};
pub use bindings::{Command, InputBindings};
pub use engine::{
    BackendOpener, INITIAL_VOLUME, MediaBackend, PlaybackEngine, SourceEvent, StateObserver,
};
pub use error::{ChromaError, Result};
pub use render::{Renderer, RendererRegistry};
pub use scheduler::{FrameOutcome, FrameScheduler, TARGET_FPS};
pub use state::{PlaybackState, SurfaceMetrics, TransportState, VisualizerMode};
pub use surface::{ACCENT, Color, FOREGROUND, Gradient, NullSurface, PixelBuffer, Surface};
