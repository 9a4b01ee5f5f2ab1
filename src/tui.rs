//! src/tui.rs (feature = "dashboard")
//!
//! A minimal terminal dashboard, generalizing `original_source/ui/
//! terminal.go`'s `termui`-based widget layout (a logs pane plus three
//! stat panes: requests/sec, completed, failed) onto `ratatui` +
//! `crossterm`, the modern-Rust successor to `termui` used elsewhere in
//! the example pack for the same shape of widget.
//!
//! This is an optional external adapter (spec.md §1: "thin adapters...
//! described only where the core consumes from or produces to them"); the
//! core pipeline never depends on this module being compiled in.

use std::io::Stdout;
use std::sync::Mutex;

use crossterm::event::{self, Event, KeyCode};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Terminal;
use tokio_util::sync::CancellationToken;

use crate::monitor::DashboardSink;

struct TuiState {
    logs: String,
    requests_per_second: String,
    completed: String,
    failed: String,
}

impl Default for TuiState {
    fn default() -> Self {
        Self {
            logs: String::new(),
            requests_per_second: "0 r/s".to_string(),
            completed: "0/0 (0%)".to_string(),
            failed: "0".to_string(),
        }
    }
}

/// The concrete `DashboardSink` backed by a raw-mode terminal. Construct
/// with `Tui::start`, which enters the alternate screen; drop (or call
/// `Tui::stop`) to restore the terminal.
pub struct Tui {
    terminal: Mutex<Terminal<CrosstermBackend<Stdout>>>,
    state: Mutex<TuiState>,
}

impl Tui {
    pub fn start() -> std::io::Result<Self> {
        enable_raw_mode()?;
        std::io::stdout().execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(std::io::stdout());
        let terminal = Terminal::new(backend)?;
        Ok(Self {
            terminal: Mutex::new(terminal),
            state: Mutex::new(TuiState::default()),
        })
    }

    pub fn stop(&self) -> std::io::Result<()> {
        disable_raw_mode()?;
        std::io::stdout().execute(LeaveAlternateScreen)?;
        Ok(())
    }

    /// Polls for a `q` keypress and cancels `halt` when seen, mirroring
    /// `ui.Handle("/sys/kbd/q", ...)` in the original terminal UI.
    pub async fn run_input_loop(&self, halt: CancellationToken) {
        loop {
            if halt.is_cancelled() {
                break;
            }
            let has_event = tokio::task::spawn_blocking(|| {
                event::poll(std::time::Duration::from_millis(200)).unwrap_or(false)
            })
            .await
            .unwrap_or(false);

            if has_event {
                if let Ok(Event::Key(key)) = event::read() {
                    if key.code == KeyCode::Char('q') {
                        halt.cancel();
                        break;
                    }
                }
            }
        }
    }

    fn render(&self) {
        let state = self.state.lock().expect("tui state mutex poisoned");
        let mut terminal = self.terminal.lock().expect("tui terminal mutex poisoned");
        let _ = terminal.draw(|frame| {
            let area = frame.area();
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(3)])
                .split(area);
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Percentage(34),
                    Constraint::Percentage(33),
                    Constraint::Percentage(33),
                ])
                .split(rows[0]);

            frame.render_widget(
                Paragraph::new(state.requests_per_second.clone())
                    .block(Block::default().borders(Borders::ALL).title("Requests per second")),
                cols[0],
            );
            frame.render_widget(
                Paragraph::new(state.completed.clone())
                    .block(Block::default().borders(Borders::ALL).title("Requests completed")),
                cols[1],
            );
            frame.render_widget(
                Paragraph::new(state.failed.clone())
                    .block(Block::default().borders(Borders::ALL).title("Failed requests").style(Style::default().fg(Color::Red))),
                cols[2],
            );
            frame.render_widget(
                Paragraph::new(state.logs.clone())
                    .block(Block::default().borders(Borders::ALL).title("Logs")),
                rows[1],
            );
        });
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

impl DashboardSink for Tui {
    fn add_log(&self, line: &str) {
        {
            let mut state = self.state.lock().expect("tui state mutex poisoned");
            state.logs = format!("{line}\n{}", state.logs);
        }
        self.render();
    }

    fn set_requests_per_second(&self, rps: f64) {
        {
            let mut state = self.state.lock().expect("tui state mutex poisoned");
            state.requests_per_second = format!("{rps:.1} r/s");
        }
        self.render();
    }

    fn set_completed(&self, completed: u64, total: u64) {
        {
            let mut state = self.state.lock().expect("tui state mutex poisoned");
            state.completed = if total == 0 {
                "0/0 (0%)".to_string()
            } else {
                let percent = completed as f64 / total as f64 * 100.0;
                format!("{completed}/{total} ({percent:.2}%)")
            };
        }
        self.render();
    }

    fn set_failed(&self, failed: u64) {
        {
            let mut state = self.state.lock().expect("tui state mutex poisoned");
            state.failed = failed.to_string();
        }
        self.render();
    }
}
