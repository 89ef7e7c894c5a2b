//! Command-line argument parsing for the chroma player.
//!
//! This module handles parsing and validation of CLI arguments including:
//! - Audio file path specification
//! - Initial visualizer mode and volume
//! - Frame rate and reduced-motion overrides
//! - Help text generation

use std::env;

use chroma_core::VisualizerMode;

/// Parsed command-line arguments.
#[derive(Debug)]
pub struct CliArgs {
    /// Audio file path to play
    pub file_path: Option<String>,
    /// Initial visualizer mode (None = start with rendering off)
    pub mode: Option<VisualizerMode>,
    /// Initial volume override in [0, 1] (None = engine default)
    pub volume: Option<f32>,
    /// Visualizer frame rate override (None = default rate)
    pub fps: Option<u32>,
    /// Whether animated rendering is disabled
    pub reduced_motion: bool,
    /// Whether terminal focus loss should keep accepting keys
    pub no_focus_gate: bool,
    /// Whether help was requested
    pub show_help: bool,
    /// Whether the version banner was requested
    pub show_version: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            file_path: None,
            mode: None,
            volume: None,
            fps: None,
            reduced_motion: false,
            no_focus_gate: false,
            show_help: false,
            show_version: false,
        }
    }
}

impl CliArgs {
    /// Parse arguments from the command line and environment.
    ///
    /// `CHROMA_REDUCED_MOTION` (any value except `0`) is equivalent to
    /// passing `--reduced-motion`.
    pub fn parse() -> Self {
        let mut args = Self::parse_from(env::args().skip(1));
        if !args.reduced_motion
            && env::var_os("CHROMA_REDUCED_MOTION").is_some_and(|value| value != "0")
        {
            args.reduced_motion = true;
        }
        args
    }

    /// Parse arguments from an explicit list.
    pub fn parse_from<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut args = Self::default();
        let mut iter = iter.into_iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--reduced-motion" => {
                    args.reduced_motion = true;
                }
                "--no-focus-gate" => {
                    args.no_focus_gate = true;
                }
                "--help" | "-h" => {
                    args.show_help = true;
                }
                "--version" | "-V" => {
                    args.show_version = true;
                }
                "--mode" => match iter.next() {
                    Some(value) => args.apply_mode(&value),
                    None => {
                        eprintln!("--mode requires an argument (off, spectrum, ...)");
                        args.show_help = true;
                    }
                },
                _ if arg.starts_with("--mode=") => {
                    let value = arg["--mode=".len()..].to_string();
                    args.apply_mode(&value);
                }
                "--volume" => match iter.next() {
                    Some(value) => args.apply_volume(&value),
                    None => {
                        eprintln!("--volume requires an argument (0.0 to 1.0)");
                        args.show_help = true;
                    }
                },
                _ if arg.starts_with("--volume=") => {
                    let value = arg["--volume=".len()..].to_string();
                    args.apply_volume(&value);
                }
                "--fps" => match iter.next() {
                    Some(value) => args.apply_fps(&value),
                    None => {
                        eprintln!("--fps requires an argument (frames per second)");
                        args.show_help = true;
                    }
                },
                _ if arg.starts_with("--fps=") => {
                    let value = arg["--fps=".len()..].to_string();
                    args.apply_fps(&value);
                }
                _ if arg.starts_with('-') => {
                    eprintln!("Unknown flag: {}", arg);
                    args.show_help = true;
                }
                _ => {
                    args.file_path = Some(arg);
                }
            }
        }

        args
    }

    fn apply_mode(&mut self, value: &str) {
        match VisualizerMode::from_str(value) {
            Some(mode) => self.mode = Some(mode),
            None => {
                eprintln!("Unknown visualizer mode: {}", value);
                self.show_help = true;
            }
        }
    }

    fn apply_volume(&mut self, value: &str) {
        match value.parse::<f32>() {
            Ok(volume) if volume.is_finite() && (0.0..=1.0).contains(&volume) => {
                self.volume = Some(volume);
            }
            _ => {
                eprintln!("Invalid volume (expected 0.0 to 1.0): {}", value);
                self.show_help = true;
            }
        }
    }

    fn apply_fps(&mut self, value: &str) {
        match value.parse::<u32>() {
            Ok(fps) if fps > 0 => self.fps = Some(fps),
            _ => {
                eprintln!("Invalid frame rate: {}", value);
                self.show_help = true;
            }
        }
    }

    /// Print help text to stderr.
    pub fn print_help() {
        eprintln!(
            "Usage:\n  chroma [options] <audio-file>\n\n\
             Options:\n\
             \x20 --mode <name>        Start with a visualizer active:\n\
             \x20                        off (default), spectrum, waterfall, waveform,\n\
             \x20                        lissajous, braille, matrix\n\
             \x20 --volume <value>     Initial volume from 0.0 to 1.0 (default 0.2)\n\
             \x20 --fps <rate>         Visualizer frame rate (default 30)\n\
             \x20 --reduced-motion     Disable animated rendering entirely\n\
             \x20 --no-focus-gate      Keep accepting keys when the terminal loses focus\n\
             \x20 -h, --help           Show this help\n\
             \x20 -V, --version        Show the version\n\n\
             Keys:\n\
             \x20 space                Play / pause\n\
             \x20 left / right         Seek 5 seconds back / forward\n\
             \x20 up / down, + / -     Volume up / down\n\
             \x20 v                    Cycle visualizer mode\n\
             \x20 r                    Toggle repeat\n\
             \x20 q, esc               Quit\n\n\
             The CHROMA_REDUCED_MOTION environment variable (any value except 0)\n\
             also disables animated rendering.\n\n\
             Examples:\n\
             \x20 chroma song.ogg                  # Play with the visualizer off\n\
             \x20 chroma --mode spectrum song.ogg  # Start with spectrum bars\n"
        );
    }
}
