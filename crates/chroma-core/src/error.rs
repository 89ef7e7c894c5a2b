//! Error handling for playback and visualization components.

use thiserror::Error;

/// Convenient result alias for engine and visualizer operations.
pub type Result<T> = std::result::Result<T, ChromaError>;

/// Errors that may occur while opening, playing, or visualizing a source.
///
/// None of these are fatal: every variant degrades to "transport stays
/// paused" or "visualizer stays blank" rather than aborting the process.
#[derive(Debug, Clone, Error)]
pub enum ChromaError {
    /// Source could not be opened or decoded. Playback stays inert until the
    /// next user-initiated load.
    #[error("source unavailable: {reason}")]
    SourceUnavailable {
        /// Human-readable description of the open/decode failure.
        reason: String,
    },
    /// The audio runtime refused a play or resume request. The engine
    /// swallows this; transport state stays unchanged and the caller may
    /// simply retry.
    #[error("playback rejected by the audio runtime")]
    PlaybackRejected,
    /// No drawing context is available. The scheduler performs no work.
    #[error("drawing surface unavailable")]
    SurfaceUnavailable,
}

impl From<String> for ChromaError {
    fn from(s: String) -> Self {
        ChromaError::SourceUnavailable { reason: s }
    }
}

impl From<&str> for ChromaError {
    fn from(s: &str) -> Self {
        ChromaError::SourceUnavailable { reason: s.to_string() }
    }
}
