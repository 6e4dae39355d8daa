//! TUI header panel.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use matcha_core::CosmologyParameters;

use crate::styles::ColorTheme;

/// Cosmology and run summary shown in the header.
#[must_use]
pub fn run_summary(cosmology: &CosmologyParameters, z0: f64, samples: usize) -> String {
    format!(
        "h={} Om0={} Ob0={} ns={} s8={} dc={} | z0={z0} | samples={samples}",
        cosmology.h_0(),
        cosmology.o_m0(),
        cosmology.o_b0(),
        cosmology.n(),
        cosmology.sigma_8(),
        cosmology.delta_c(),
    )
}

/// Render the header panel.
pub fn render_header(frame: &mut Frame, area: Rect, summary: &str, models: &str) {
    let theme = ColorTheme::default();
    let text = vec![Line::from(vec![
        Span::styled("MatchA-rs", theme.header_style()),
        Span::raw(format!(" | {summary} | Model: {models}")),
    ])];

    let block = Block::default().borders(Borders::BOTTOM).title(" MatchA-rs ");

    let paragraph = Paragraph::new(text).block(block);
    frame.render_widget(paragraph, area);
}
