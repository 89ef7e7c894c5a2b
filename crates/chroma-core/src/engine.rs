//! Playback state machine.
//!
//! [`PlaybackEngine`] owns the authoritative [`PlaybackState`] and is the
//! only component that mutates it. Hosts feed it user commands and backend
//! events; interested parties register observers and receive a fresh state
//! clone after every mutation.

use std::fmt;

use crate::analysis::AnalysisHandle;
use crate::error::{ChromaError, Result};
use crate::state::{PlaybackState, TransportState};

/// Volume applied to a freshly constructed engine.
pub const INITIAL_VOLUME: f32 = 0.2;

/// Event reported by a media backend during [`PlaybackEngine::pump`].
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// Source metadata became available. `None` means the duration is
    /// unknown and will stay unknown (unbounded or undecodable length).
    MetadataLoaded {
        /// Track length in seconds, when the source reports one.
        duration: Option<f64>,
    },
    /// Playback position moved.
    PositionChanged {
        /// New position in seconds.
        seconds: f64,
    },
    /// The source played to its natural end.
    Ended,
}

/// Decoding and output facade the engine drives.
///
/// Backends are deliberately dumb: they own the audio runtime and report
/// what happened, while all lifecycle decisions (repeat, seeks, lazy
/// analysis setup) live in the engine.
pub trait MediaBackend {
    /// Start or restart audible playback.
    ///
    /// An `Err` means the audio runtime refused; the engine leaves the
    /// transport unchanged so the user can retry.
    fn play(&mut self) -> Result<()>;

    /// Halt audible playback without losing position.
    fn pause(&mut self);

    /// Jump to an absolute position in seconds. Callers clamp first.
    fn seek_to(&mut self, seconds: f64);

    /// Apply an output volume in [0, 1].
    fn set_volume(&mut self, volume: f32);

    /// Build the sample analysis graph, or return the existing handle.
    ///
    /// Called lazily on the first play request so backends can defer
    /// device acquisition until a user gesture demands it.
    fn ensure_analysis(&mut self) -> Result<AnalysisHandle>;

    /// Wake a suspended audio runtime. Called after [`Self::ensure_analysis`]
    /// and before [`Self::play`] on every unpause.
    fn resume(&mut self) -> Result<()>;

    /// Drain events that occurred since the last poll.
    fn poll_events(&mut self) -> Vec<SourceEvent>;
}

/// Factory the engine uses to open a source path into a backend.
pub type BackendOpener = Box<dyn FnMut(&str) -> Result<Box<dyn MediaBackend>>>;

/// Callback receiving a state clone after every engine mutation.
pub type StateObserver = Box<dyn FnMut(&PlaybackState)>;

/// Owner of the playback lifecycle.
pub struct PlaybackEngine {
    opener: BackendOpener,
    backend: Option<Box<dyn MediaBackend>>,
    state: PlaybackState,
    observers: Vec<StateObserver>,
    last_error: Option<ChromaError>,
}

impl PlaybackEngine {
    /// Engine with no source loaded.
    pub fn new(opener: BackendOpener) -> Self {
        PlaybackEngine {
            opener,
            backend: None,
            state: PlaybackState {
                volume: INITIAL_VOLUME,
                ..PlaybackState::default()
            },
            observers: Vec::new(),
            last_error: None,
        }
    }

    /// Open a source, replacing whatever was loaded before.
    ///
    /// Volume and repeat survive the swap; position, duration, and the
    /// analysis handle reset. On failure the engine returns to `Unloaded`
    /// with the error recorded, and the call reports it.
    pub fn load(&mut self, source: &str) -> Result<()> {
        self.teardown();
        self.state.transport = TransportState::Loading;
        self.notify();

        match (self.opener)(source) {
            Ok(mut backend) => {
                backend.set_volume(self.state.volume);
                self.backend = Some(backend);
                self.last_error = None;
                Ok(())
            }
            Err(err) => {
                log::warn!("failed to open {source}: {err}");
                self.state.transport = TransportState::Unloaded;
                self.notify();
                Err(self.record(err))
            }
        }
    }

    /// Flip between playing and paused.
    ///
    /// The first transition into playback builds the analysis graph and
    /// wakes the audio runtime, strictly in that order, before the play
    /// request itself. A refused play leaves the transport where it was;
    /// the user gesture that triggered it can simply be repeated.
    pub fn toggle_play(&mut self) {
        match self.state.transport {
            TransportState::Unloaded | TransportState::Loading => {}
            TransportState::Playing => {
                if let Some(backend) = self.backend.as_mut() {
                    backend.pause();
                }
                self.state.transport = TransportState::Paused;
                self.notify();
            }
            TransportState::Paused | TransportState::Ended => self.start_playback(),
        }
    }

    fn start_playback(&mut self) {
        let Some(backend) = self.backend.as_mut() else {
            return;
        };

        if self.state.analysis.is_none() {
            match backend.ensure_analysis() {
                Ok(handle) => {
                    self.state.analysis = Some(handle);
                }
                Err(err) => {
                    log::warn!("analysis graph unavailable: {err}");
                    self.record(err);
                    self.notify();
                    return;
                }
            }
        }
        if let Err(err) = backend.resume() {
            log::debug!("audio runtime refused to resume: {err}");
            self.record(err);
            return;
        }
        match backend.play() {
            Ok(()) => {
                if self.state.transport == TransportState::Ended {
                    self.state.current_time = 0.0;
                }
                self.state.transport = TransportState::Playing;
                self.last_error = None;
                self.notify();
            }
            Err(err) => {
                log::debug!("play request rejected: {err}");
                self.record(err);
                self.notify();
            }
        }
    }

    /// Seek relative to the current position.
    pub fn seek(&mut self, delta: f64) {
        self.seek_to(self.state.current_time + delta);
    }

    /// Seek to an absolute position in seconds.
    ///
    /// A no-op until the duration is known; targets are clamped to
    /// `[0, duration]`. Non-finite targets are ignored.
    pub fn seek_to(&mut self, seconds: f64) {
        let Some(duration) = self.state.duration else {
            return;
        };
        if !seconds.is_finite() {
            return;
        }
        let clamped = seconds.clamp(0.0, duration);
        if let Some(backend) = self.backend.as_mut() {
            backend.seek_to(clamped);
        }
        self.state.current_time = clamped;
        if self.state.transport == TransportState::Ended {
            self.state.transport = TransportState::Paused;
        }
        self.notify();
    }

    /// Nudge the volume by `delta`, clamping to [0, 1].
    pub fn adjust_volume(&mut self, delta: f32) {
        if !delta.is_finite() {
            return;
        }
        self.set_volume(self.state.volume + delta);
    }

    /// Set the volume outright, clamping to [0, 1].
    ///
    /// Works with no source loaded; the value is applied to the next
    /// backend at open time.
    pub fn set_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            return;
        }
        self.state.volume = volume.clamp(0.0, 1.0);
        if let Some(backend) = self.backend.as_mut() {
            backend.set_volume(self.state.volume);
        }
        self.notify();
    }

    /// Flip end-of-track behavior between stop and restart.
    pub fn toggle_repeat(&mut self) {
        self.state.repeat = !self.state.repeat;
        self.notify();
    }

    /// Drain backend events and fold them into the state.
    pub fn pump(&mut self) {
        let events = match self.backend.as_mut() {
            Some(backend) => backend.poll_events(),
            None => return,
        };
        for event in events {
            self.handle_event(event);
        }
    }

    /// Fold one backend event into the state.
    ///
    /// Events are ignored with no source loaded; a late event from a
    /// backend torn down mid-flight must not resurrect the transport.
    pub fn handle_event(&mut self, event: SourceEvent) {
        if self.backend.is_none() {
            return;
        }
        match event {
            SourceEvent::MetadataLoaded { duration } => {
                self.state.duration = duration.filter(|d| d.is_finite() && *d > 0.0);
                if self.state.transport == TransportState::Loading {
                    self.state.transport = TransportState::Paused;
                }
                self.notify();
            }
            SourceEvent::PositionChanged { seconds } => {
                if !seconds.is_finite() {
                    return;
                }
                self.state.current_time = match self.state.duration {
                    Some(duration) => seconds.clamp(0.0, duration),
                    None => seconds.max(0.0),
                };
                self.notify();
            }
            SourceEvent::Ended => self.finish_track(),
        }
    }

    /// End-of-track policy: restart when repeat is on, otherwise park the
    /// transport at `Ended` with the position pinned to the duration.
    fn finish_track(&mut self) {
        if self.state.repeat {
            if let Some(backend) = self.backend.as_mut() {
                backend.seek_to(0.0);
                match backend.play() {
                    Ok(()) => {
                        self.state.current_time = 0.0;
                        self.state.transport = TransportState::Playing;
                        self.notify();
                        return;
                    }
                    Err(err) => {
                        log::warn!("repeat restart rejected: {err}");
                        self.record(err);
                    }
                }
            }
        }
        self.state.current_time = self.state.duration.unwrap_or(self.state.current_time);
        self.state.transport = TransportState::Ended;
        self.notify();
    }

    /// Register an observer and immediately hand it the current state.
    pub fn observe(&mut self, mut observer: StateObserver) {
        observer(&self.state);
        self.observers.push(observer);
    }

    /// Clone of the current state.
    pub fn state(&self) -> PlaybackState {
        self.state.clone()
    }

    /// Handle to the analysis tap, if the graph has been built.
    pub fn analysis(&self) -> Option<AnalysisHandle> {
        self.state.analysis.clone()
    }

    /// The most recent error the engine absorbed, if any.
    pub fn last_error(&self) -> Option<&ChromaError> {
        self.last_error.as_ref()
    }

    /// Drop the backend and reset everything except volume and repeat.
    ///
    /// Safe to call repeatedly; with nothing loaded it does no work.
    pub fn teardown(&mut self) {
        if self.backend.is_none() && self.state.transport == TransportState::Unloaded {
            return;
        }
        if let Some(mut backend) = self.backend.take() {
            backend.pause();
        }
        self.state = PlaybackState {
            volume: self.state.volume,
            repeat: self.state.repeat,
            ..PlaybackState::default()
        };
        self.notify();
    }

    fn record(&mut self, err: ChromaError) -> ChromaError {
        self.last_error = Some(err.clone());
        err
    }

    fn notify(&mut self) {
        let snapshot = self.state.clone();
        for observer in &mut self.observers {
            observer(&snapshot);
        }
    }
}

impl fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("state", &self.state)
            .field("backend", &self.backend.is_some())
            .field("observers", &self.observers.len())
            .field("last_error", &self.last_error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct StubBackend;

    impl MediaBackend for StubBackend {
        fn play(&mut self) -> Result<()> {
            Ok(())
        }
        fn pause(&mut self) {}
        fn seek_to(&mut self, _seconds: f64) {}
        fn set_volume(&mut self, _volume: f32) {}
        fn ensure_analysis(&mut self) -> Result<AnalysisHandle> {
            Ok(AnalysisHandle::default())
        }
        fn resume(&mut self) -> Result<()> {
            Ok(())
        }
        fn poll_events(&mut self) -> Vec<SourceEvent> {
            Vec::new()
        }
    }

    fn stub_engine() -> PlaybackEngine {
        PlaybackEngine::new(Box::new(|_| Ok(Box::new(StubBackend) as Box<dyn MediaBackend>)))
    }

    #[test]
    fn fresh_engine_starts_quiet_and_unloaded() {
        let engine = stub_engine();
        let state = engine.state();
        assert_eq!(state.transport, TransportState::Unloaded);
        assert_eq!(state.volume, INITIAL_VOLUME);
        assert_eq!(state.duration, None);
        assert!(!state.repeat);
        assert!(state.analysis.is_none());
    }

    #[test]
    fn toggle_play_without_a_source_is_inert() {
        let mut engine = stub_engine();
        engine.toggle_play();
        assert_eq!(engine.state().transport, TransportState::Unloaded);
    }

    #[test]
    fn volume_adjusts_clamp_without_a_backend() {
        let mut engine = stub_engine();
        engine.adjust_volume(2.0);
        assert_eq!(engine.state().volume, 1.0);
        engine.adjust_volume(-3.0);
        assert_eq!(engine.state().volume, 0.0);
        engine.adjust_volume(f32::NAN);
        assert_eq!(engine.state().volume, 0.0);
    }

    #[test]
    fn observers_get_an_immediate_snapshot_and_updates() {
        let mut engine = stub_engine();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        engine.observe(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        engine.toggle_repeat();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failed_load_records_the_error_and_unloads() {
        let mut engine = PlaybackEngine::new(Box::new(|path| {
            Err(ChromaError::SourceUnavailable {
                reason: format!("no such file: {path}"),
            })
        }));

        let result = engine.load("missing.ogg");
        assert!(result.is_err());
        assert_eq!(engine.state().transport, TransportState::Unloaded);
        assert!(matches!(
            engine.last_error(),
            Some(ChromaError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn metadata_moves_loading_to_paused() {
        let mut engine = stub_engine();
        engine.load("track.ogg").unwrap();
        assert_eq!(engine.state().transport, TransportState::Loading);

        engine.handle_event(SourceEvent::MetadataLoaded { duration: Some(120.0) });
        let state = engine.state();
        assert_eq!(state.transport, TransportState::Paused);
        assert_eq!(state.duration, Some(120.0));
    }

    #[test]
    fn non_finite_durations_stay_unknown() {
        let mut engine = stub_engine();
        engine.load("stream.ogg").unwrap();

        engine.handle_event(SourceEvent::MetadataLoaded {
            duration: Some(f64::INFINITY),
        });
        let state = engine.state();
        assert_eq!(state.duration, None);
        assert_eq!(state.transport, TransportState::Paused);

        // Seeking stays disabled while the duration is unknown.
        engine.seek_to(30.0);
        assert_eq!(engine.state().current_time, 0.0);
    }

    #[test]
    fn teardown_is_idempotent_and_keeps_preferences() {
        let mut engine = stub_engine();
        engine.load("track.ogg").unwrap();
        engine.toggle_repeat();
        engine.adjust_volume(0.3);

        engine.teardown();
        engine.teardown();

        let state = engine.state();
        assert_eq!(state.transport, TransportState::Unloaded);
        assert!(state.repeat);
        assert!((state.volume - 0.5).abs() < 1e-6);
        assert_eq!(state.duration, None);
    }
}
