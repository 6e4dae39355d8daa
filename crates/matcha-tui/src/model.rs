//! TUI application model (Elm architecture).

use std::io;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Terminal;
use tracing::debug;

use matcha_plot::FigureSet;

use crate::chart::{render_figure, render_progress};
use crate::footer::render_footer;
use crate::header::render_header;
use crate::keymap::{map_key, KeyAction};
use crate::logs::{render_logs, LogScrollState};
use crate::messages::TuiMessage;

/// Log lines kept in memory.
pub const MAX_LOGS: usize = 500;

/// TUI application state (Elm Model).
pub struct TuiApp {
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Whether the user asked to cancel the running computation.
    pub cancel_requested: bool,
    /// Progress per calculator, indexed like `models`.
    pub progress: Vec<f64>,
    pub models: Vec<String>,
    /// Finished calculators with their durations.
    pub completed: Vec<(String, Duration)>,
    /// Figures of the plotted model, once rendered.
    pub figures: Option<FigureSet>,
    pub logs: Vec<String>,
    pub log_scroll: LogScrollState,
    pub show_logs: bool,
    /// Cosmology and grid summary for the header.
    pub summary: String,
    pub errors: Vec<String>,
    pub terminal_width: u16,
    pub terminal_height: u16,
    start_time: Option<Instant>,
    finished_after: Option<Duration>,
    rx: Receiver<TuiMessage>,
}

impl TuiApp {
    #[must_use]
    pub fn new(rx: Receiver<TuiMessage>) -> Self {
        Self {
            should_quit: false,
            cancel_requested: false,
            progress: Vec::new(),
            models: Vec::new(),
            completed: Vec::new(),
            figures: None,
            logs: Vec::new(),
            log_scroll: LogScrollState::new(),
            show_logs: true,
            summary: String::new(),
            errors: Vec::new(),
            terminal_width: 80,
            terminal_height: 24,
            start_time: None,
            finished_after: None,
            rx,
        }
    }

    /// Set the header summary line.
    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = summary.into();
    }

    /// Drain pending messages (Elm Update).
    pub fn update(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            self.handle_message(msg);
        }
    }

    /// Handle a single message.
    pub fn handle_message(&mut self, msg: TuiMessage) {
        match msg {
            TuiMessage::Progress {
                index,
                progress,
                model,
            } => {
                if self.progress.len() <= index {
                    self.progress.resize(index + 1, 0.0);
                    self.models.resize(index + 1, String::new());
                }
                self.progress[index] = progress;
                self.models[index] = model;
            }
            TuiMessage::Log(line) => self.push_log(line),
            TuiMessage::Started => {
                self.start_time = Some(Instant::now());
                self.finished_after = None;
                self.progress.clear();
                self.models.clear();
                self.completed.clear();
                self.errors.clear();
                self.figures = None;
            }
            TuiMessage::Complete { model, duration } => {
                self.completed.push((model, duration));
            }
            TuiMessage::Figures(figures) => {
                self.figures = Some(*figures);
            }
            TuiMessage::Quit => {
                self.should_quit = true;
            }
            TuiMessage::Tick => {}
            TuiMessage::Resize { width, height } => {
                self.terminal_width = width;
                self.terminal_height = height;
            }
            TuiMessage::KeyPress(action) => self.handle_key_action(action),
            TuiMessage::Error(err) => {
                self.push_log(format!("[ERROR] {err}"));
                self.errors.push(err);
            }
            TuiMessage::Finished => {
                self.finished_after = self.elapsed();
                self.push_log("Run finished".to_string());
            }
        }
    }

    fn push_log(&mut self, line: String) {
        self.logs.push(line);
        if self.logs.len() > MAX_LOGS {
            let dropped = self.logs.len() - MAX_LOGS;
            self.logs.drain(..dropped);
            self.log_scroll.on_trimmed(dropped);
        }
        self.log_scroll.on_new_line(self.logs.len());
    }

    /// Handle a keyboard action.
    pub fn handle_key_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::Quit => self.should_quit = true,
            KeyAction::Cancel => {
                self.cancel_requested = true;
                self.should_quit = true;
            }
            KeyAction::ToggleLogs => self.show_logs = !self.show_logs,
            other => {
                self.log_scroll.apply(other, self.logs.len());
            }
        }
    }

    /// Time since the run started, frozen once it finished.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.finished_after
            .or_else(|| self.start_time.map(|t| t.elapsed()))
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished_after.is_some()
    }

    /// Header, main and footer rects.
    #[must_use]
    pub fn compute_layout(area: Rect) -> (Rect, Rect, Rect) {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(2),
            ])
            .split(area);
        (outer[0], outer[1], outer[2])
    }

    /// Split the main area into the figures (top, 65%) and the status row.
    /// The status row holds progress and, when shown, the run log.
    #[must_use]
    pub fn compute_main_layout(main: Rect, show_logs: bool) -> (Rect, Rect, Option<Rect>) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(main);
        if !show_logs {
            return (rows[0], rows[1], None);
        }
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(rows[1]);
        (rows[0], cols[0], Some(cols[1]))
    }

    fn render_figures(&self, frame: &mut ratatui::Frame, area: Rect) {
        let Some(figures) = &self.figures else {
            let text = if self.errors.is_empty() {
                "Computing..."
            } else {
                "No figures: the run failed"
            };
            let placeholder = Paragraph::new(Line::raw(text))
                .block(Block::default().borders(Borders::ALL).title(" Figures "));
            frame.render_widget(placeholder, area);
            return;
        };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);
        for (figure, col) in figures.figures().into_iter().zip(cols.iter()) {
            render_figure(frame, *col, figure);
        }
    }

    /// Render the full TUI view (Elm View).
    pub fn render(&self, frame: &mut ratatui::Frame) {
        let (header_area, main_area, footer_area) = Self::compute_layout(frame.area());

        let models = if self.models.is_empty() {
            "N/A".to_string()
        } else {
            self.models.join(", ")
        };
        let summary = match self.elapsed() {
            Some(d) => format!("{} | {:.1}s", self.summary, d.as_secs_f64()),
            None => self.summary.clone(),
        };
        render_header(frame, header_area, &summary, &models);

        let (figures_area, progress_area, logs_area) =
            Self::compute_main_layout(main_area, self.show_logs);
        self.render_figures(frame, figures_area);

        let names: Vec<&str> = self.models.iter().map(String::as_str).collect();
        render_progress(frame, progress_area, &names, &self.progress);

        if let Some(logs_area) = logs_area {
            render_logs(frame, logs_area, &self.logs, self.log_scroll.offset());
        }

        render_footer(frame, footer_area);
    }

    /// Enter raw mode and the alternate screen.
    pub fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        Terminal::new(CrosstermBackend::new(stdout))
    }

    /// Restore the terminal.
    pub fn teardown_terminal(
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        terminal::disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        Ok(())
    }

    /// Run the event loop on the real terminal until the user quits.
    pub fn run(&mut self) -> io::Result<()> {
        let mut terminal = Self::setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        Self::teardown_terminal(&mut terminal)?;
        debug!(cancelled = self.cancel_requested, "TUI closed");
        result
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        let tick_rate = Duration::from_millis(250);
        loop {
            terminal.draw(|frame| self.render(frame))?;
            if self.should_quit {
                return Ok(());
            }

            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key_action(map_key(key));
                    }
                    Event::Resize(width, height) => {
                        self.handle_message(TuiMessage::Resize { width, height });
                    }
                    _ => {}
                }
            }

            self.update();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{unbounded, Sender};
    use matcha_core::results::{BinSeries, MassBin, ResultsTable};
    use matcha_plot::PlotSpec;
    use ratatui::backend::TestBackend;
    use std::collections::BTreeMap;

    fn make_app() -> (TuiApp, Sender<TuiMessage>) {
        let (tx, rx) = unbounded();
        (TuiApp::new(rx), tx)
    }

    fn figures() -> FigureSet {
        let mut bins = BTreeMap::new();
        for (i, log_ms) in [9.0, 10.0].into_iter().enumerate() {
            let shift = i as f64;
            bins.insert(
                MassBin::from_log_mass(log_ms).unwrap(),
                BinSeries::new(
                    vec![0.0, 1.0, 3.0],
                    vec![1e-2 / (1.0 + shift), 1e-3, 1e-4],
                    vec![log_ms, log_ms - 0.5, log_ms - 1.5],
                    vec![12.0 + shift, 11.8, 11.2],
                    1e-2,
                    12.0 + shift,
                )
                .unwrap(),
            );
        }
        let results = ResultsTable::new("Behroozi", 0.0, bins);
        let spec = PlotSpec::new(vec!["9".to_string(), "10".to_string()]);
        matcha_plot::render(&results, &spec).unwrap()
    }

    fn screen(app: &TuiApp, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        let frame = terminal.draw(|frame| app.render(frame)).unwrap();
        frame
            .buffer
            .content()
            .iter()
            .map(|cell| cell.symbol().to_string())
            .collect()
    }

    #[test]
    fn initial_state() {
        let (app, _tx) = make_app();
        assert!(!app.should_quit);
        assert!(app.progress.is_empty());
        assert!(app.figures.is_none());
        assert!(app.show_logs);
        assert!(app.elapsed().is_none());
    }

    #[test]
    fn progress_grows_for_sparse_index() {
        let (mut app, tx) = make_app();
        tx.send(TuiMessage::Progress {
            index: 2,
            progress: 0.8,
            model: "Tinker08".to_string(),
        })
        .unwrap();
        app.update();
        assert_eq!(app.progress.len(), 3);
        assert_eq!(app.models[2], "Tinker08");
        assert!(app.progress[0].abs() < f64::EPSILON);
    }

    #[test]
    fn started_resets_the_run() {
        let (mut app, _tx) = make_app();
        app.handle_message(TuiMessage::Figures(Box::new(figures())));
        app.handle_message(TuiMessage::Complete {
            model: "PS".into(),
            duration: Duration::from_millis(3),
        });
        app.handle_message(TuiMessage::Started);
        assert!(app.figures.is_none());
        assert!(app.completed.is_empty());
        assert!(app.elapsed().is_some());
        assert!(!app.is_finished());
    }

    #[test]
    fn finished_freezes_elapsed() {
        let (mut app, _tx) = make_app();
        app.handle_message(TuiMessage::Started);
        app.handle_message(TuiMessage::Finished);
        let frozen = app.elapsed();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(app.elapsed(), frozen);
        assert!(app.is_finished());
    }

    #[test]
    fn errors_are_logged() {
        let (mut app, _tx) = make_app();
        app.handle_message(TuiMessage::Error("unknown colormap: foo".into()));
        assert_eq!(app.errors, vec!["unknown colormap: foo".to_string()]);
        assert_eq!(app.logs[0], "[ERROR] unknown colormap: foo");
    }

    #[test]
    fn log_cap() {
        let (mut app, _tx) = make_app();
        for i in 0..MAX_LOGS + 10 {
            app.handle_message(TuiMessage::Log(format!("msg {i}")));
        }
        assert_eq!(app.logs.len(), MAX_LOGS);
        assert_eq!(app.logs[0], "msg 10");
        assert_eq!(app.log_scroll.offset(), MAX_LOGS - 1);
    }

    #[test]
    fn keys_drive_the_model() {
        let (mut app, _tx) = make_app();
        for i in 0..20 {
            app.handle_message(TuiMessage::Log(format!("log {i}")));
        }
        app.handle_message(TuiMessage::KeyPress(KeyAction::ScrollUp));
        assert_eq!(app.log_scroll.offset(), 18);
        app.handle_key_action(KeyAction::ToggleLogs);
        assert!(!app.show_logs);
        app.handle_key_action(KeyAction::Quit);
        assert!(app.should_quit);
        assert!(!app.cancel_requested);
    }

    #[test]
    fn cancel_quits_and_flags() {
        let (mut app, _tx) = make_app();
        app.handle_key_action(KeyAction::Cancel);
        assert!(app.should_quit);
        assert!(app.cancel_requested);
    }

    #[test]
    fn layout_fills_the_area() {
        let area = Rect::new(0, 0, 100, 30);
        let (header, main, footer) = TuiApp::compute_layout(area);
        assert_eq!(header.height, 3);
        assert_eq!(footer.height, 2);
        assert_eq!(header.height + main.height + footer.height, area.height);

        let (figs, progress, logs) = TuiApp::compute_main_layout(main, true);
        let logs = logs.unwrap();
        assert_eq!(figs.height + progress.height, main.height);
        assert_eq!(progress.width + logs.width, main.width);

        let (_, progress, logs) = TuiApp::compute_main_layout(main, false);
        assert!(logs.is_none());
        assert_eq!(progress.width, main.width);
    }

    #[test]
    fn renders_placeholder_before_figures() {
        let (mut app, _tx) = make_app();
        app.set_summary("z0=0 | samples=3");
        app.handle_message(TuiMessage::Started);
        let text = screen(&app, 120, 40);
        assert!(text.contains("Computing..."));
        assert!(text.contains("z0=0 | samples=3"));
        assert!(text.contains("quit"));
    }

    #[test]
    fn renders_both_figures() {
        let (mut app, _tx) = make_app();
        app.handle_message(TuiMessage::Progress {
            index: 0,
            progress: 1.0,
            model: "Behroozi".into(),
        });
        app.handle_message(TuiMessage::Figures(Box::new(figures())));
        app.handle_message(TuiMessage::Log("Behroozi: 2 bins".into()));
        let fs = app.figures.as_ref().unwrap();
        let text = screen(&app, 160, 50);
        assert!(text.contains(&fs.nvir.title));
        assert!(text.contains(&fs.stellar_mass.title));
        assert!(text.contains("Model: Behroozi"));
        assert!(text.contains("Behroozi: 2 bins"));
    }

    #[test]
    fn renders_failure_placeholder() {
        let (mut app, _tx) = make_app();
        app.handle_message(TuiMessage::Error("root not bracketed".into()));
        assert!(screen(&app, 120, 40).contains("the run failed"));
    }

    #[test]
    fn event_loop_exits_when_quit_requested() {
        let (mut app, _tx) = make_app();
        app.should_quit = true;
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        app.event_loop(&mut terminal).unwrap();
    }
}
