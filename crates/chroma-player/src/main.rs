//! chroma - terminal music player with audio-reactive visualizers.
//!
//! Plays one audio file through the system output and renders the decoded
//! signal with a selectable visualizer:
//! - Spectrum bars, waterfall, waveform, lissajous, braille scope, matrix rain
//! - Transport control from the keyboard (seek, volume, repeat)
//! - Braille and half-block rasterization for sub-cell resolution

mod args;
mod audio;
mod tui;

use std::path::Path;

use chroma_core::{PlaybackEngine, TARGET_FPS, VisualizerMode};

use args::CliArgs;
use audio::RodioBackend;
use tui::TuiOptions;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("chroma - audio playback with terminal visualizers");
    println!("==================================================\n");

    // Parse command-line arguments
    let args = CliArgs::parse();

    if args.show_version {
        println!("chroma {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.show_help {
        CliArgs::print_help();
        return if args.file_path.is_none() {
            Ok(())
        } else {
            Err("invalid arguments".into())
        };
    }

    let Some(file_path) = args.file_path else {
        CliArgs::print_help();
        return Err("no audio file given".into());
    };

    let title = Path::new(&file_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_path.clone());

    let mut engine = PlaybackEngine::new(RodioBackend::opener());
    engine.load(&file_path)?;
    // Deliver the probed metadata so the transport leaves Loading before
    // the first toggle.
    engine.pump();

    if let Some(volume) = args.volume {
        engine.set_volume(volume);
    }

    // Launching the player is the play gesture; space toggles from there.
    engine.toggle_play();
    if let Some(err) = engine.last_error() {
        return Err(format!("playback failed to start: {err}").into());
    }

    println!("Playing: {title}");

    let options = TuiOptions {
        title,
        mode: args.mode.unwrap_or(VisualizerMode::Off),
        fps: args.fps.unwrap_or(TARGET_FPS),
        reduced_motion: args.reduced_motion,
        focus_gate: !args.no_focus_gate,
    };

    let result = tui::run(&mut engine, options);
    engine.teardown();

    result?;
    Ok(())
}
