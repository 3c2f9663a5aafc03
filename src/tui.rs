use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};
use ratatui::Terminal;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::warn;

use crate::core::board::{FieldBoard, CURRENT_STATUS, DURATION, END_DATE, INITIATE_ANOTHER};
use crate::core::counters::{CounterRow, COUNTER_ROWS};
use crate::core::endpoints::JobAction;
use crate::core::error::StatusError;
use crate::core::event::WidgetEvent;
use crate::core::formatter::{format_elapsed, format_event_line, PLACEHOLDER};
use crate::core::source::HttpStatusSource;
use crate::core::state::WidgetState;
use crate::core::widget::StatusWidget;

type Widget = StatusWidget<HttpStatusSource, FieldBoard>;
type ActionResult = (JobAction, Result<(), String>);
type ActionSender = mpsc::Sender<ActionResult>;

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self, StatusError> {
        enable_raw_mode().map_err(StatusError::terminal)?;
        let mut stdout = io::stdout();
        stdout
            .execute(EnterAlternateScreen)
            .map_err(StatusError::terminal)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = stdout.execute(LeaveAlternateScreen);
    }
}

#[derive(Debug)]
struct AppState {
    history: Vec<String>,
    board: FieldBoard,
    widget_state: WidgetState,
    timers: usize,
    render_passes: u64,
    last_error: Option<String>,
    pending_action: Option<JobAction>,
    app_base: String,
    should_quit: bool,
    scroll_offset: usize,
    view_lines: usize,
    tick: u64,
    started_at: Instant,
}

impl AppState {
    fn new(app_base: String) -> Self {
        Self {
            history: vec!["Connecting to status endpoint...".to_string()],
            board: FieldBoard::new(),
            widget_state: WidgetState::Uninitialized,
            timers: 0,
            render_passes: 0,
            last_error: None,
            pending_action: None,
            app_base,
            should_quit: false,
            scroll_offset: 0,
            view_lines: 1,
            tick: 0,
            started_at: Instant::now(),
        }
    }

    fn push_history(&mut self, line: impl Into<String>) {
        const MAX_LINES: usize = 500;
        if self.history.len() >= MAX_LINES {
            let drain_count = self.history.len().saturating_sub(MAX_LINES - 1);
            self.history.drain(0..drain_count);
        }
        self.history.push(line.into());
        self.clamp_scroll();
    }

    fn apply_event(&mut self, event: &WidgetEvent) {
        let line = format_event_line(event);
        match event {
            WidgetEvent::PollFailed(message) => self.last_error = Some(message.clone()),
            WidgetEvent::Polled { .. } => {
                self.last_error = None;
                // polls land every second; only log when the reported state changes
                let last = self.history.iter().rev().find(|l| l.starts_with("status: "));
                if last == Some(&line) {
                    return;
                }
            }
            _ => {}
        }
        self.push_history(line);
    }

    fn set_view_lines(&mut self, lines: usize) {
        self.view_lines = lines.max(1);
        self.clamp_scroll();
    }

    fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.max_scroll();
        self.scroll_offset = (self.scroll_offset + lines).min(max_scroll);
    }

    fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    fn max_scroll(&self) -> usize {
        self.history.len().saturating_sub(self.view_lines)
    }

    fn clamp_scroll(&mut self) {
        let max_scroll = self.max_scroll();
        if self.scroll_offset > max_scroll {
            self.scroll_offset = max_scroll;
        }
    }

    fn accepts_actions(&self) -> bool {
        self.widget_state == WidgetState::Polling && self.pending_action.is_none()
    }
}

pub fn run(
    widget: Widget,
    mut events: UnboundedReceiver<WidgetEvent>,
    runtime: Handle,
) -> Result<(), StatusError> {
    let _guard = TerminalGuard::enter()?;
    let stdout = io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(StatusError::terminal)?;

    let (action_tx, action_rx) = mpsc::channel::<ActionResult>();
    let mut app = AppState::new(widget.config().endpoints.app_base.clone());

    let starter = widget.clone();
    runtime.spawn(async move {
        if let Err(err) = starter.start().await {
            warn!(event = "status.tui.start_failed", error = %err);
        }
    });

    let result = event_loop(
        &mut terminal,
        &mut app,
        &widget,
        &mut events,
        &runtime,
        (&action_tx, &action_rx),
    );
    widget.stop();
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    widget: &Widget,
    events: &mut UnboundedReceiver<WidgetEvent>,
    runtime: &Handle,
    (action_tx, action_rx): (&ActionSender, &mpsc::Receiver<ActionResult>),
) -> Result<(), StatusError> {
    loop {
        while let Ok(event) = events.try_recv() {
            app.apply_event(&event);
        }

        while let Ok((action, result)) = action_rx.try_recv() {
            app.pending_action = None;
            match result {
                Ok(()) => app.push_history(format!("{} requested.", action.name())),
                Err(message) => app.push_history(format!("error: {} failed: {message}", action.name())),
            }
        }

        app.board = widget.with_board(FieldBoard::clone);
        app.widget_state = widget.state();
        app.timers = widget.active_timers();
        app.render_passes = widget.render_passes();

        let size = terminal.size().map_err(StatusError::terminal)?;
        let history_height = size.height.saturating_sub(22).max(3) as usize;
        app.set_view_lines(history_height.saturating_sub(2).max(1));

        app.tick = app.tick.wrapping_add(1);

        let view: &AppState = app;
        terminal
            .draw(|frame| {
                let layout = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(7),
                        Constraint::Length(COUNTER_ROWS.len() as u16 + 3),
                        Constraint::Min(3),
                        Constraint::Length(3),
                    ])
                    .split(frame.size());

                frame.render_widget(render_header(view, layout[0].width as usize), layout[0]);
                frame.render_widget(render_counters(&view.board), layout[1]);
                frame.render_widget(render_history(view, layout[2].height as usize), layout[2]);
                frame.render_widget(render_footer(view), layout[3]);
            })
            .map_err(StatusError::terminal)?;

        if event::poll(Duration::from_millis(100)).map_err(StatusError::terminal)? {
            if let Event::Key(key) = event::read().map_err(StatusError::terminal)? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        app.should_quit = true;
                    }
                    KeyCode::Char('q') | KeyCode::Esc => {
                        app.should_quit = true;
                    }
                    KeyCode::Char('p') => request_action(app, widget, runtime, action_tx, JobAction::Pause),
                    KeyCode::Char('r') => request_action(app, widget, runtime, action_tx, JobAction::Resume),
                    KeyCode::Char('s') => request_action(app, widget, runtime, action_tx, JobAction::Stop),
                    KeyCode::PageUp => {
                        let step = app.view_lines.saturating_sub(1).max(1);
                        app.scroll_up(step);
                    }
                    KeyCode::PageDown => {
                        let step = app.view_lines.saturating_sub(1).max(1);
                        app.scroll_down(step);
                    }
                    KeyCode::Up => app.scroll_up(1),
                    KeyCode::Down => app.scroll_down(1),
                    _ => {}
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn request_action(
    app: &mut AppState,
    widget: &Widget,
    runtime: &Handle,
    action_tx: &ActionSender,
    action: JobAction,
) {
    if !app.accepts_actions() {
        return;
    }
    app.pending_action = Some(action);
    app.push_history(format!(">> {}", action.name()));

    let widget = widget.clone();
    let tx = action_tx.clone();
    runtime.spawn(async move {
        let result = widget
            .source()
            .post_action(action)
            .await
            .map_err(|e| e.to_string());
        let _ = tx.send((action, result));
    });
}

fn render_header(app: &AppState, width: usize) -> Paragraph<'static> {
    let board = &app.board;
    let monitor = match app.widget_state {
        WidgetState::Uninitialized => "Connecting",
        WidgetState::Polling => "Polling",
        WidgetState::Idle => "Idle",
    };
    let title = if board.icon().is_some() {
        "Bulk export [done]"
    } else {
        "Bulk export"
    };

    let bar_width = width.saturating_sub(30).clamp(10, 40);
    let progress_bar = render_progress_bar(app, bar_width);
    let nodes = match (count(board, "totalNodesCompleted"), count(board, "totalNodesSubmitted")) {
        (Some(done), Some(total)) => format!("nodes {done}/{total}"),
        _ => "nodes --/--".to_string(),
    };

    let mut text = vec![
        Line::from(vec![
            Span::raw("Status: "),
            Span::raw(board.text_or(CURRENT_STATUS, PLACEHOLDER).to_string()),
        ]),
        Line::from(vec![
            Span::raw("End date: "),
            Span::raw(board.text_or(END_DATE, PLACEHOLDER).to_string()),
            Span::raw("   Duration: "),
            Span::raw(board.text_or(DURATION, PLACEHOLDER).to_string()),
        ]),
        Line::from(vec![
            Span::raw(progress_bar),
            Span::raw(" "),
            Span::raw(nodes),
        ]),
        Line::from(format!(
            "Monitor: {monitor}   timers {}   renders {}   watching {}",
            app.timers,
            app.render_passes,
            format_elapsed(app.started_at.elapsed())
        )),
    ];
    if let Some(error) = &app.last_error {
        text.push(Line::from(format!("last poll failed: {error}")));
    }

    Paragraph::new(text)
        .block(Block::default().title(title).borders(Borders::ALL))
        .wrap(Wrap { trim: true })
}

fn count(board: &FieldBoard, field: &str) -> Option<u64> {
    board.text(field)?.parse().ok()
}

fn render_progress_bar(app: &AppState, width: usize) -> String {
    let width = width.max(10);
    let mut bar = String::with_capacity(width + 2);
    bar.push('[');

    let ratio = match (
        count(&app.board, "totalNodesCompleted"),
        count(&app.board, "totalNodesSubmitted"),
    ) {
        (Some(done), Some(total)) if total > 0 => Some((done as f64 / total as f64).clamp(0.0, 1.0)),
        _ => None,
    };

    if app.widget_state == WidgetState::Idle {
        let filled = if ratio.is_some() || app.board.icon().is_some() { width } else { 0 };
        for idx in 0..width {
            bar.push(if idx < filled { '=' } else { ' ' });
        }
        bar.push(']');
        return bar;
    }

    if let Some(ratio) = ratio {
        let filled = ((ratio * width as f64).round() as usize).min(width);
        for idx in 0..width {
            if idx < filled {
                bar.push('=');
            } else if idx == filled && filled < width {
                bar.push('>');
            } else {
                bar.push(' ');
            }
        }
        bar.push(']');
        return bar;
    }

    let pos = (app.tick as usize) % width;
    for idx in 0..width {
        if idx == pos {
            bar.push('>');
        } else if idx < pos {
            bar.push('=');
        } else {
            bar.push(' ');
        }
    }
    bar.push(']');
    bar
}

fn render_counters(board: &FieldBoard) -> Table<'static> {
    let cell = |field: Option<&'static str>| -> Cell<'static> {
        match field {
            Some(field) => Cell::from(board.text_or(field, PLACEHOLDER).to_string()),
            None => Cell::from(""),
        }
    };
    let rows: Vec<Row> = COUNTER_ROWS
        .iter()
        .map(|row: &CounterRow| {
            Row::new(vec![
                Cell::from(row.title),
                cell(row.submitted),
                cell(row.completed),
                cell(row.skipped),
                cell(row.errors),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(18),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(9),
        Constraint::Length(8),
    ];

    Table::new(rows, widths)
        .header(Row::new(vec!["", "Submitted", "Completed", "Skipped", "Errors"]))
        .block(Block::default().title("Counters").borders(Borders::ALL))
}

fn render_history(app: &AppState, height: usize) -> Paragraph<'static> {
    let max_lines = height.saturating_sub(2).max(1);
    let end = app.history.len().saturating_sub(app.scroll_offset);
    let start = end.saturating_sub(max_lines);
    let lines: Vec<Line> = app.history[start..end]
        .iter()
        .map(|line| Line::from(line.clone()))
        .collect();

    Paragraph::new(lines)
        .block(Block::default().title("Session").borders(Borders::ALL))
        .wrap(Wrap { trim: false })
}

fn render_footer(app: &AppState) -> Paragraph<'static> {
    let mut spans = Vec::new();
    if app.widget_state == WidgetState::Polling {
        spans.push(Span::raw("[p] pause  [r] resume  [s] stop  "));
    }
    spans.push(Span::raw("[q] quit"));
    if app.board.is_visible(INITIATE_ANOTHER) {
        spans.push(Span::raw(format!(
            "   Start another export: {}",
            app.app_base
        )));
    }

    Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::board::StatusBoard;
    use crate::core::snapshot::InProgress;

    fn app() -> AppState {
        AppState::new("http://app".to_string())
    }

    #[test]
    fn repeated_poll_lines_are_collapsed() {
        let mut app = app();
        let polled = WidgetEvent::Polled {
            processing_state: "RUNNING".into(),
            in_progress: InProgress::Flag(true),
        };
        app.apply_event(&polled);
        app.apply_event(&polled);
        app.apply_event(&WidgetEvent::PollFailed("timeout".into()));
        assert_eq!(app.last_error.as_deref(), Some("timeout"));
        app.apply_event(&polled);

        let status_lines = app.history.iter().filter(|l| l.starts_with("status: ")).count();
        assert_eq!(status_lines, 1);
        assert_eq!(app.last_error, None);
    }

    #[test]
    fn progress_bar_tracks_node_counters() {
        let mut app = app();
        app.widget_state = WidgetState::Polling;
        app.board.set_text("totalNodesSubmitted", "10");
        app.board.set_text("totalNodesCompleted", "5");
        assert_eq!(render_progress_bar(&app, 10), "[=====>    ]");

        app.widget_state = WidgetState::Idle;
        assert_eq!(render_progress_bar(&app, 10), "[==========]");
    }

    #[test]
    fn actions_only_while_polling() {
        let mut app = app();
        assert!(!app.accepts_actions());
        app.widget_state = WidgetState::Polling;
        assert!(app.accepts_actions());
        app.pending_action = Some(JobAction::Pause);
        assert!(!app.accepts_actions());
    }

    #[test]
    fn scroll_stays_within_history() {
        let mut app = app();
        for idx in 0..20 {
            app.push_history(format!("line {idx}"));
        }
        app.set_view_lines(5);
        app.scroll_up(100);
        assert_eq!(app.scroll_offset, app.history.len() - 5);
        app.scroll_down(100);
        assert_eq!(app.scroll_offset, 0);
    }
}
