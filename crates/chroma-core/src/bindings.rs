//! Keyboard command routing with visibility and text-entry gates.

use crate::engine::PlaybackEngine;
use crate::state::VisualizerMode;

/// Player command produced by a key press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Flip between playing and paused.
    TogglePlay,
    /// Seek relative to the current position, in seconds.
    Seek(f64),
    /// Nudge the volume, in [0, 1] steps.
    AdjustVolume(f32),
    /// Advance to the next visualizer mode.
    CycleMode,
    /// Flip end-of-track repeat.
    ToggleRepeat,
}

/// Gatekeeper between raw key presses and the engine.
///
/// Commands are dropped while the player is not visible or while a text
/// entry field has focus, so typing never fights the transport.
#[derive(Debug, Clone, Copy)]
pub struct InputBindings {
    visible: bool,
    text_entry: bool,
}

impl InputBindings {
    /// Bindings for a visible player with no text entry active.
    pub fn new() -> Self {
        InputBindings {
            visible: true,
            text_entry: false,
        }
    }

    /// Gate all commands on player visibility.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Gate all commands while a text entry field has focus.
    pub fn set_text_entry(&mut self, active: bool) {
        self.text_entry = active;
    }

    /// Whether commands currently pass through.
    pub fn active(&self) -> bool {
        self.visible && !self.text_entry
    }

    /// Route one command to the engine, or drop it when gated.
    ///
    /// Returns whether the command was delivered.
    pub fn dispatch(
        &self,
        command: Command,
        engine: &mut PlaybackEngine,
        mode: &mut VisualizerMode,
    ) -> bool {
        if !self.active() {
            return false;
        }
        match command {
            Command::TogglePlay => engine.toggle_play(),
            Command::Seek(delta) => engine.seek(delta),
            Command::AdjustVolume(delta) => engine.adjust_volume(delta),
            Command::CycleMode => *mode = mode.next(),
            Command::ToggleRepeat => engine.toggle_repeat(),
        }
        true
    }
}

impl Default for InputBindings {
    fn default() -> Self {
        Self::new()
    }
}
