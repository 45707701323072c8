use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
    },
};
use log::{debug, info, trace};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};

use tasketa::report::format_truncated_percentage;
use tasketa::{DisplayProgress, RunState};

use crate::app::{App, DEFAULT_TITLE};

// Upper bound on how long we block waiting for input when no tick is pending.
const IDLE_POLL: Duration = Duration::from_millis(250);

pub fn run(app: &mut App) -> Result<()> {
    info!("Initializing TUI");
    trace!("Enabling raw mode");
    enable_raw_mode().context("Failed to enable raw mode")?;

    trace!("Entering alternate screen");
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
        .context("Failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
    info!("Terminal initialized successfully");

    let res = run_loop(&mut terminal, app);

    // Teardown cancels the refresh loop even when the event loop errored.
    app.stop();

    trace!("Cleaning up TUI");
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen,
        SetTitle(DEFAULT_TITLE)
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    info!("TUI cleanup completed");

    res
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    info!("Event loop started");
    let mut shown_title = String::new();

    loop {
        if shown_title != app.title {
            execute!(terminal.backend_mut(), SetTitle(&app.title))
                .context("Failed to set terminal title")?;
            shown_title = app.title.clone();
        }

        terminal
            .draw(|frame| draw(frame, app))
            .context("Failed to draw frame")?;

        let timeout = app.next_tick_in().unwrap_or(IDLE_POLL).min(IDLE_POLL);

        if event::poll(timeout).context("Failed to poll for events")? {
            match event::read().context("Failed to read event")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
                    let alt = key.modifiers.contains(KeyModifiers::ALT);
                    match key.code {
                        KeyCode::Char('c') if ctrl => {
                            info!("Quit key pressed, exiting event loop");
                            return Ok(());
                        }
                        KeyCode::Char('u') if ctrl => {
                            debug!("Clearing input");
                            app.clear_input();
                        }
                        KeyCode::Enter if ctrl || alt => {
                            info!("Calculating (Ctrl/Alt+Enter)");
                            app.calculate();
                        }
                        KeyCode::F(5) => {
                            info!("Calculating (F5)");
                            app.calculate();
                        }
                        KeyCode::Enter => app.input.push('\n'),
                        KeyCode::Tab => app.input.push('\t'),
                        KeyCode::Esc => {
                            info!("Stop key pressed");
                            app.stop();
                        }
                        KeyCode::Backspace => {
                            app.input.pop();
                        }
                        KeyCode::Char(c) if !ctrl => app.input.push(c),
                        other => trace!("Unhandled key: {:?}", other),
                    }
                }
                Event::Paste(text) => {
                    debug!("Pasted {} bytes", text.len());
                    app.input.push_str(&text.replace("\r\n", "\n"));
                }
                Event::Resize(width, height) => {
                    debug!("Terminal resized: {}x{}", width, height);
                }
                other => trace!("Other event: {:?}", other),
            }
        }

        app.on_tick();
    }
}

fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Min(6),
            Constraint::Length(5),
        ])
        .split(frame.size());

    draw_header(frame, chunks[0], app);
    draw_result(frame, chunks[1], app);
    draw_input(frame, chunks[2], app);
    draw_logs(frame, chunks[3], app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let (ratio, label) = match app.progress {
        DisplayProgress::Waiting => (0.0, "waiting".to_string()),
        DisplayProgress::Percent(value) => (
            (value / 100.0).clamp(0.0, 1.0),
            format!("{}%", format_truncated_percentage(value)),
        ),
        DisplayProgress::Finished => (1.0, "done".to_string()),
    };
    let state = match app.state() {
        RunState::Idle => "idle",
        RunState::Running if app.is_ticking() => "running",
        RunState::Running => "stopped",
        RunState::Completed => "complete",
        RunState::Failed => "failed",
    };
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} [{}]", app.title, state)),
        )
        .gauge_style(
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, area);
}

fn draw_result(frame: &mut Frame, area: Rect, app: &App) {
    let style = match app.state() {
        RunState::Failed => Style::default().fg(Color::Red),
        RunState::Completed => Style::default().fg(Color::Green),
        _ => Style::default(),
    };
    let text = if app.result.is_empty() {
        "Paste a task status response below, then press Ctrl+Enter or F5."
    } else {
        app.result.as_str()
    };
    let result = Paragraph::new(text)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title("Result"))
        .wrap(Wrap { trim: false });
    frame.render_widget(result, area);
}

fn draw_input(frame: &mut Frame, area: Rect, app: &App) {
    let title = "Task status (Ctrl+Enter/F5=calculate, Esc=stop, Ctrl+U=clear, Ctrl+C=quit)";
    // Keep the tail of long pastes visible.
    let visible = area.height.saturating_sub(2) as usize;
    let all: Vec<&str> = app.input.lines().collect();
    let skip = all.len().saturating_sub(visible.max(1));
    let lines: Vec<Line> = all[skip..]
        .iter()
        .map(|line| Line::raw(line.to_string()))
        .collect();
    let input = Paragraph::new(lines)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(input, area);
}

fn draw_logs(frame: &mut Frame, area: Rect, app: &App) {
    let logs = app
        .logs
        .iter()
        .rev()
        .take(3)
        .map(|entry| Line::raw(entry.clone()))
        .collect::<Vec<_>>();
    let log_widget = Paragraph::new(logs)
        .block(Block::default().borders(Borders::ALL).title("Logs"))
        .wrap(Wrap { trim: true });
    frame.render_widget(log_widget, area);
}
