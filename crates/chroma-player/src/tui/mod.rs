//! Ratatui frontend for the chroma player.
//!
//! One loop owns the whole session: keyboard dispatch through the input
//! gates, pumping backend events into the engine, pacing the visualizer
//! through the frame scheduler, and drawing chrome plus the rasterized
//! surface. The terminal is restored on quit and from a panic hook.

mod surface;

pub use surface::TerminalSurface;

use std::io::{self, Stdout, stdout};
use std::time::{Duration, Instant};

use chroma_core::{
    ACCENT, Command, FrameScheduler, InputBindings, PlaybackEngine, PlaybackState, TransportState,
    VisualizerMode,
};
use crossterm::event::{
    self, DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEventKind, KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use ratatui::{Frame, Terminal};

/// Seconds moved per arrow-key seek.
const SEEK_STEP_SECS: f64 = 5.0;

/// Volume moved per volume key.
const VOLUME_STEP: f32 = 0.05;

/// Outer loop budget (~30 FPS); the scheduler paces actual render work.
const FRAME_BUDGET: Duration = Duration::from_millis(33);

/// Input poll timeout inside one loop pass.
const POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// Frontend configuration assembled from the command line.
pub struct TuiOptions {
    /// Name shown in the header, usually the source file name.
    pub title: String,
    /// Visualizer mode active at startup.
    pub mode: VisualizerMode,
    /// Visualizer frame rate.
    pub fps: u32,
    /// Suppress animated rendering entirely.
    pub reduced_motion: bool,
    /// Drop transport keys while the terminal is unfocused.
    pub focus_gate: bool,
}

/// What a key press asks the frontend to do.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    Dispatch(Command),
    Quit,
}

/// Restore terminal to normal state.
///
/// Safe to call multiple times; failures are ignored because there is no
/// better place left to report them.
fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), DisableFocusChange, LeaveAlternateScreen);
}

/// Run the player UI until the user quits.
pub fn run(engine: &mut PlaybackEngine, options: TuiOptions) -> io::Result<()> {
    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen, EnableFocusChange)?;

    // Restore the terminal before any panic message prints.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, engine, &options);

    let _ = std::panic::take_hook();
    restore_terminal();
    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    engine: &mut PlaybackEngine,
    options: &TuiOptions,
) -> io::Result<()> {
    let mut bindings = InputBindings::new();
    let mut mode = options.mode;
    let mut scheduler = FrameScheduler::with_rate(options.fps, options.reduced_motion);
    let mut surface = TerminalSurface::new(0, 0);

    loop {
        let frame_start = Instant::now();

        if event::poll(POLL_TIMEOUT)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match map_key(key.code, key.modifiers) {
                        Some(Action::Quit) => break,
                        Some(Action::Dispatch(command)) => {
                            bindings.dispatch(command, engine, &mut mode);
                        }
                        None => {}
                    }
                }
                Event::FocusGained if options.focus_gate => bindings.set_visible(true),
                Event::FocusLost if options.focus_gate => bindings.set_visible(false),
                _ => {}
            }
        }

        engine.pump();
        let state = engine.state();
        scheduler.sync_transport(state.is_playing(), state.analysis.is_some());

        // The surface covers the visualizer pane; recompute its geometry
        // before the frame so resizes land immediately.
        let size = terminal.size()?;
        let pane = visualizer_inner(layout_chunks(Rect::new(0, 0, size.width, size.height))[1]);
        surface.resize(pane.width, pane.height);

        let analysis = engine.analysis();
        let metrics = surface.metrics();
        scheduler.frame(Instant::now(), mode, analysis.as_ref(), &mut surface, metrics);

        terminal.draw(|f| draw_ui(f, &state, mode, &surface, options, bindings.active()))?;

        let frame_time = frame_start.elapsed();
        if frame_time < FRAME_BUDGET {
            std::thread::sleep(FRAME_BUDGET - frame_time);
        }
    }

    scheduler.stop();
    Ok(())
}

/// Translate one key press into a frontend action.
fn map_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char(' ') => Some(Action::Dispatch(Command::TogglePlay)),
        KeyCode::Left => Some(Action::Dispatch(Command::Seek(-SEEK_STEP_SECS))),
        KeyCode::Right => Some(Action::Dispatch(Command::Seek(SEEK_STEP_SECS))),
        KeyCode::Up | KeyCode::Char('+') | KeyCode::Char('=') => {
            Some(Action::Dispatch(Command::AdjustVolume(VOLUME_STEP)))
        }
        KeyCode::Down | KeyCode::Char('-') | KeyCode::Char('_') => {
            Some(Action::Dispatch(Command::AdjustVolume(-VOLUME_STEP)))
        }
        KeyCode::Char('v') | KeyCode::Char('V') => Some(Action::Dispatch(Command::CycleMode)),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Dispatch(Command::ToggleRepeat)),
        _ => None,
    }
}

/// Main layout: header, visualizer pane, progress, footer.
fn layout_chunks(area: Rect) -> [Rect; 4] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2], chunks[3]]
}

/// Drawable area inside the visualizer pane's border.
fn visualizer_inner(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(area)
}

fn accent() -> Color {
    let (r, g, b) = ACCENT.flattened();
    Color::Rgb(r, g, b)
}

fn draw_ui(
    f: &mut Frame,
    state: &PlaybackState,
    mode: VisualizerMode,
    surface: &TerminalSurface,
    options: &TuiOptions,
    input_active: bool,
) {
    let chunks = layout_chunks(f.area());
    draw_header(f, chunks[0], state, options);
    draw_visualizer(f, chunks[1], mode, surface, options.reduced_motion);
    draw_progress(f, chunks[2], state);
    draw_footer(f, chunks[3], state, mode, input_active);
}

/// Header with source name, time readout, and transport status.
fn draw_header(f: &mut Frame, area: Rect, state: &PlaybackState, options: &TuiOptions) {
    let (status, status_color) = transport_label(state.transport);
    let total = match state.duration {
        Some(duration) => format_time(duration),
        None => "--:--".to_string(),
    };

    let line = Line::from(vec![
        Span::raw(" "),
        Span::styled(&options.title, Style::default().fg(Color::White).bold()),
        Span::raw("  "),
        Span::styled(
            format!("{} / {}", format_time(state.current_time), total),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("  "),
        Span::styled(status, Style::default().fg(status_color)),
    ]);

    let header =
        Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(" chroma "));
    f.render_widget(header, area);
}

fn draw_visualizer(
    f: &mut Frame,
    area: Rect,
    mode: VisualizerMode,
    surface: &TerminalSurface,
    reduced_motion: bool,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" visualizer: {mode} "));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if reduced_motion {
        let notice = Paragraph::new(Line::from(Span::styled(
            "visualizer disabled (reduced motion)",
            Style::default().fg(Color::DarkGray),
        )))
        .centered();
        f.render_widget(notice, inner);
    } else {
        f.render_widget(surface, inner);
    }
}

fn draw_progress(f: &mut Frame, area: Rect, state: &PlaybackState) {
    let label = match state.duration {
        Some(duration) => format!(
            "{} / {}",
            format_time(state.current_time),
            format_time(duration)
        ),
        None => format_time(state.current_time),
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(accent()).bg(Color::Black))
        .ratio(state.progress())
        .label(label);
    f.render_widget(gauge, area);
}

/// Footer with the key help and live volume/repeat readout.
fn draw_footer(
    f: &mut Frame,
    area: Rect,
    state: &PlaybackState,
    mode: VisualizerMode,
    input_active: bool,
) {
    let controls = "[space] play  [←/→] seek  [+/-] volume  [v] visualizer  [r] repeat  [q] quit";
    let volume_info = format!("  vol {:>3}%", (state.volume * 100.0).round() as u32);
    let mode_info = format!("  viz: {mode}");
    let repeat_info = if state.repeat { "  repeat on" } else { "" };
    let focus_info = if input_active { "" } else { "  unfocused" };

    let footer = Paragraph::new(Line::from(vec![
        Span::styled(controls, Style::default().fg(Color::DarkGray)),
        Span::styled(volume_info, Style::default().fg(Color::Green)),
        Span::styled(mode_info, Style::default().fg(Color::Cyan)),
        Span::styled(repeat_info, Style::default().fg(Color::Yellow)),
        Span::styled(focus_info, Style::default().fg(Color::Magenta)),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

fn transport_label(transport: TransportState) -> (&'static str, Color) {
    match transport {
        TransportState::Unloaded => ("no source", Color::DarkGray),
        TransportState::Loading => ("loading", Color::DarkGray),
        TransportState::Paused => ("⏸ paused", Color::Yellow),
        TransportState::Playing => ("▶ playing", Color::Green),
        TransportState::Ended => ("■ ended", Color::DarkGray),
    }
}

/// Format seconds as MM:SS.
fn format_time(seconds: f64) -> String {
    // Guard against NaN, infinity, or negative values
    if !seconds.is_finite() || seconds < 0.0 {
        return "--:--".to_string();
    }
    // Clamp to 99:59 to keep the readout width fixed
    let clamped = seconds.min(5999.0);
    let mins = (clamped / 60.0) as u32;
    let secs = (clamped % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}
