//! SVG export of a `FigureSet` through `plotters`.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::info;

use crate::color::Rgb;
use crate::error::PlotError;
use crate::figure::{Figure, FigureSet, LegendPosition, LineStyle};

/// File name of Figure A.
pub const NVIR_FILE: &str = "nvir_evolution.svg";
/// File name of Figure B.
pub const STELLAR_MASS_FILE: &str = "stellar_mass_evolution.svg";

const SIZE: (u32, u32) = (1200, 900);
const LINE_WIDTH: u32 = 3;

fn export_err(e: impl Display) -> PlotError {
    PlotError::Export(e.to_string())
}

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

/// Write both figures into `dir`, creating it if needed.
pub fn export_svg(figures: &FigureSet, dir: &Path) -> Result<Vec<PathBuf>, PlotError> {
    fs::create_dir_all(dir).map_err(|e| export_err(format!("{}: {e}", dir.display())))?;
    let paths = vec![dir.join(NVIR_FILE), dir.join(STELLAR_MASS_FILE)];
    for (figure, path) in figures.figures().into_iter().zip(&paths) {
        draw_figure(figure, path)?;
    }
    info!(dir = %dir.display(), "Exported figures");
    Ok(paths)
}

/// Draw one figure on log-log axes. Points outside the axis box are
/// dropped.
pub fn draw_figure(figure: &Figure, path: &Path) -> Result<(), PlotError> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(export_err)?;

    let (x, y) = (&figure.x, &figure.y);
    let mut chart = ChartBuilder::on(&root)
        .caption(&figure.title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d((x.min..x.max).log_scale(), (y.min..y.max).log_scale())
        .map_err(export_err)?;

    chart
        .configure_mesh()
        .x_desc(x.label.as_str())
        .y_desc(y.label.as_str())
        .draw()
        .map_err(export_err)?;

    let inside = |&(px, py): &(f64, f64)| {
        (x.min..=x.max).contains(&px) && (y.min..=y.max).contains(&py)
    };

    for series in &figure.series {
        let color = rgb(series.color);
        let points = series.points.iter().copied().filter(|p| inside(p));
        match series.style {
            LineStyle::Solid => {
                chart
                    .draw_series(LineSeries::new(points, color.stroke_width(LINE_WIDTH)))
                    .map_err(export_err)?;
            }
            LineStyle::Dotted => {
                chart
                    .draw_series(points.map(|p| Circle::new(p, 2, color.filled())))
                    .map_err(export_err)?;
            }
        }
    }

    if !figure.legend.is_empty() {
        for entry in &figure.legend {
            let color = rgb(entry.color);
            let dotted = entry.style == LineStyle::Dotted;
            chart
                .draw_series(LineSeries::new(
                    Vec::<(f64, f64)>::new(),
                    color.stroke_width(LINE_WIDTH),
                ))
                .map_err(export_err)?
                .label(entry.label.as_str())
                .legend(move |(lx, ly)| {
                    let style = if dotted {
                        color.stroke_width(1)
                    } else {
                        color.stroke_width(LINE_WIDTH)
                    };
                    PathElement::new(vec![(lx, ly), (lx + 20, ly)], style)
                });
        }

        let position = match figure.legend_position {
            LegendPosition::UpperLeft => SeriesLabelPosition::UpperLeft,
            LegendPosition::LowerLeft => SeriesLabelPosition::LowerLeft,
        };
        chart
            .configure_series_labels()
            .position(position)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(export_err)?;
    }

    root.present().map_err(export_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::{Axis, Series};

    fn figure() -> Figure {
        Figure {
            title: "t".into(),
            x: Axis {
                label: "1+z".into(),
                min: 1.0,
                max: 11.0,
                log: true,
            },
            y: Axis {
                label: "n".into(),
                min: 1e-5,
                max: 1.0,
                log: true,
            },
            series: vec![Series {
                key: "9".into(),
                color: Rgb::new(0, 0, 0),
                style: LineStyle::Solid,
                points: vec![(1.0, 1e-2), (2.0, 1e-3)],
            }],
            legend: Vec::new(),
            legend_position: LegendPosition::UpperLeft,
        }
    }

    #[test]
    fn export_into_a_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();
        let set = FigureSet {
            nvir: figure(),
            stellar_mass: figure(),
            colors: Vec::new(),
        };
        assert!(matches!(
            export_svg(&set, &blocker),
            Err(PlotError::Export(_))
        ));
    }
}
