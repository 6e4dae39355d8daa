//! Progress gauges and the figure charts.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::{
    Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, LegendPosition as ChartLegendPosition,
};
use ratatui::Frame;

use matcha_plot::figure::{legend_label, Axis as FigureAxis, LegendPosition};
use matcha_plot::{Figure, LineStyle, Rgb};

/// Render progress gauges for each model.
#[allow(clippy::cast_possible_truncation)]
pub fn render_progress(frame: &mut Frame, area: Rect, models: &[&str], progress: &[f64]) {
    if models.is_empty() {
        return;
    }

    let per_gauge = (area.height as usize / models.len()).max(1);

    for (i, (model, &prog)) in models.iter().zip(progress).enumerate() {
        let y = area.y + (i * per_gauge) as u16;
        if y >= area.y + area.height {
            break;
        }

        let gauge_area = Rect {
            x: area.x,
            y,
            width: area.width,
            height: per_gauge.min((area.y + area.height - y) as usize) as u16,
        };

        let gauge = Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {model} ")),
            )
            .gauge_style(Style::default().fg(Color::Green))
            .ratio(prog.clamp(0.0, 1.0));

        frame.render_widget(gauge, gauge_area);
    }
}

fn color(c: Rgb) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

/// Points mapped to `log10` coordinates. Points outside the axis box are
/// dropped.
#[must_use]
pub fn log_points(points: &[(f64, f64)], x: &FigureAxis, y: &FigureAxis) -> Vec<(f64, f64)> {
    points
        .iter()
        .filter(|(px, py)| (x.min..=x.max).contains(px) && (y.min..=y.max).contains(py))
        .map(|&(px, py)| (px.log10(), py.log10()))
        .collect()
}

fn tick(v: f64) -> String {
    if (1.0..100.0).contains(&v) {
        format!("{v:.1}")
    } else {
        format!("{v:.0e}")
    }
}

/// Labels at both ends and the geometric middle of a log axis.
#[must_use]
pub fn axis_labels(axis: &FigureAxis) -> Vec<String> {
    let mid = (axis.min * axis.max).sqrt();
    vec![tick(axis.min), tick(mid), tick(axis.max)]
}

fn chart_axis(axis: &FigureAxis) -> Axis<'static> {
    Axis::default()
        .title(axis.label.clone())
        .style(Style::default().fg(Color::Gray))
        .bounds([axis.min.log10(), axis.max.log10()])
        .labels(axis_labels(axis).into_iter().map(Span::raw))
}

/// Render one figure as a braille line chart on log axes. Dotted series
/// (reference overlays) are drawn as scatter points without a legend name.
pub fn render_figure(frame: &mut Frame, area: Rect, figure: &Figure) {
    let data: Vec<Vec<(f64, f64)>> = figure
        .series
        .iter()
        .map(|s| log_points(&s.points, &figure.x, &figure.y))
        .collect();

    let datasets: Vec<Dataset> = figure
        .series
        .iter()
        .zip(&data)
        .map(|(series, points)| {
            let dataset = Dataset::default()
                .style(Style::default().fg(color(series.color)))
                .data(points);
            match series.style {
                LineStyle::Solid => dataset
                    .name(legend_label(&series.key))
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Line),
                LineStyle::Dotted => dataset.marker(Marker::Dot).graph_type(GraphType::Scatter),
            }
        })
        .collect();

    let legend_position = match figure.legend_position {
        LegendPosition::UpperLeft => ChartLegendPosition::TopLeft,
        LegendPosition::LowerLeft => ChartLegendPosition::BottomLeft,
    };

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", figure.title)),
        )
        .x_axis(chart_axis(&figure.x))
        .y_axis(chart_axis(&figure.y))
        .legend_position(Some(legend_position))
        .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)));

    frame.render_widget(chart, area);
}
