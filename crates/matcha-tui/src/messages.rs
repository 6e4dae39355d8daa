//! TUI message types (Elm Messages).

use std::time::Duration;

use matcha_plot::FigureSet;

/// Messages that drive the TUI update cycle.
#[derive(Debug, Clone)]
pub enum TuiMessage {
    /// Progress update from a calculator.
    Progress {
        index: usize,
        progress: f64,
        model: String,
    },
    /// Log message.
    Log(String),
    /// A run started; clears the previous one.
    Started,
    /// One calculator finished.
    Complete { model: String, duration: Duration },
    /// Figures rendered from the plotted results.
    Figures(Box<FigureSet>),
    /// Quit the application.
    Quit,
    /// Tick event for periodic updates.
    Tick,
    /// Terminal resize event.
    Resize { width: u16, height: u16 },
    /// Key press event forwarded from the event loop.
    KeyPress(crate::keymap::KeyAction),
    /// Error message.
    Error(String),
    /// All calculations finished; freezes the elapsed timer.
    Finished,
}
