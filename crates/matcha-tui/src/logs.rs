//! Run log panel and its scroll state.

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, List, ListItem};
use ratatui::Frame;

use crate::keymap::KeyAction;
use crate::styles::ColorTheme;

/// Lines moved by `PageUp`/`PageDown`.
pub const PAGE: usize = 10;

/// Scroll position of the log panel. While following, the view sticks to
/// the newest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogScrollState {
    offset: usize,
    follow: bool,
}

impl LogScrollState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            offset: 0,
            follow: true,
        }
    }

    /// Index of the first line to show.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn is_following(&self) -> bool {
        self.follow
    }

    /// A line was appended; `total` is the new line count.
    pub fn on_new_line(&mut self, total: usize) {
        if self.follow {
            self.offset = total.saturating_sub(1);
        }
    }

    /// `dropped` lines were removed from the front of the log.
    pub fn on_trimmed(&mut self, dropped: usize) {
        self.offset = self.offset.saturating_sub(dropped);
    }

    /// Apply a navigation key. Returns `false` for keys that do not scroll.
    pub fn apply(&mut self, action: KeyAction, total: usize) -> bool {
        match action {
            KeyAction::ScrollUp => self.back(1),
            KeyAction::ScrollDown => self.forward(1, total),
            KeyAction::PageUp => self.back(PAGE),
            KeyAction::PageDown => self.forward(PAGE, total),
            KeyAction::Home => {
                self.follow = false;
                self.offset = 0;
            }
            KeyAction::End => {
                self.follow = true;
                self.offset = total.saturating_sub(1);
            }
            _ => return false,
        }
        true
    }

    fn back(&mut self, lines: usize) {
        self.follow = false;
        self.offset = self.offset.saturating_sub(lines);
    }

    fn forward(&mut self, lines: usize, total: usize) {
        let last = total.saturating_sub(1);
        self.offset = (self.offset + lines).min(last);
        self.follow = self.offset >= last;
    }
}

impl Default for LogScrollState {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the scrollable log panel. Lines tagged `[ERROR]` or `[WARN]` are
/// colored.
pub fn render_logs(frame: &mut Frame, area: Rect, logs: &[String], scroll_offset: usize) {
    let theme = ColorTheme::default();
    let visible_height = area.height.saturating_sub(2) as usize;
    let total = logs.len();
    // keep the last page full when scrolled to the bottom
    let first = scroll_offset.min(total.saturating_sub(visible_height));

    let items: Vec<ListItem> = logs
        .iter()
        .skip(first)
        .take(visible_height)
        .map(|log| {
            let style = if log.starts_with("[ERROR]") {
                theme.error_style()
            } else if log.starts_with("[WARN]") {
                theme.warning_style()
            } else {
                Style::default()
            };
            ListItem::new(Line::raw(log.as_str())).style(style)
        })
        .collect();

    let title = if total > visible_height {
        let pct = (first * 100) / total.saturating_sub(visible_height).max(1);
        format!(" Run log ({pct}%) ")
    } else {
        " Run log ".to_string()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(theme.muted_style()),
    );

    frame.render_widget(list, area);
}
