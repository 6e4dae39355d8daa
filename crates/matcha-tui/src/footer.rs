//! TUI footer panel.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::styles::ColorTheme;

const SHORTCUTS: [(&str, &str); 5] = [
    ("q", "quit"),
    ("l", "logs"),
    ("↑/↓", "scroll"),
    ("PgUp/PgDn", "page"),
    ("Ctrl-C", "cancel"),
];

/// Render the footer panel with keyboard shortcuts.
pub fn render_footer(frame: &mut Frame, area: Rect) {
    let theme = ColorTheme::default();
    let mut spans = Vec::with_capacity(SHORTCUTS.len() * 2);
    for (i, (key, action)) in SHORTCUTS.iter().enumerate() {
        spans.push(Span::styled(*key, theme.key_style()));
        let sep = if i + 1 < SHORTCUTS.len() { " | " } else { "" };
        spans.push(Span::raw(format!(": {action}{sep}")));
    }

    let block = Block::default().borders(Borders::TOP);
    let paragraph = Paragraph::new(vec![Line::from(spans)]).block(block);
    frame.render_widget(paragraph, area);
}
