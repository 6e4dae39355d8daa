//! Backend-independent figure model and the `render` operation.
//!
//! Figure A plots the cumulative halo number density along each progenitor
//! track, Figure B the matched stellar mass. Both use `1+z` on the x axis
//! and give each key the same color.

use matcha_core::results::ResultsTable;
use tracing::{debug, warn};

use crate::color::{parse_colors, Rgb};
use crate::colormap::Colormap;
use crate::datafile::{write_series_file, ReferenceTable};
use crate::error::PlotError;
use crate::spec::PlotSpec;

/// `1+z` range shared by both figures.
pub const X_RANGE: (f64, f64) = (1.0, 11.0);
/// Figure A y range, Mpc^-3.
pub const NVIR_RANGE: (f64, f64) = (1e-5, 1.0);
/// Figure B y range, Msun.
pub const STELLAR_MASS_RANGE: (f64, f64) = (1e5, 8e11);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dotted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPosition {
    UpperLeft,
    LowerLeft,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub label: String,
    pub min: f64,
    pub max: f64,
    pub log: bool,
}

impl Axis {
    fn log(label: &str, (min, max): (f64, f64)) -> Self {
        Self {
            label: label.to_string(),
            min,
            max,
            log: true,
        }
    }
}

/// One drawn line.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Result key this line belongs to.
    pub key: String,
    pub color: Rgb,
    pub style: LineStyle,
    pub points: Vec<(f64, f64)>,
}

/// Legend line, independent of the drawn series.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgb,
    pub style: LineStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
    pub legend: Vec<LegendEntry>,
    pub legend_position: LegendPosition,
}

/// The two figures of one `render` call.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureSet {
    pub nvir: Figure,
    pub stellar_mass: Figure,
    /// Color given to each key, in key order.
    pub colors: Vec<(String, Rgb)>,
}

impl FigureSet {
    #[must_use]
    pub fn color_of(&self, key: &str) -> Option<Rgb> {
        self.colors.iter().find(|(k, _)| k == key).map(|(_, c)| *c)
    }

    #[must_use]
    pub fn figures(&self) -> [&Figure; 2] {
        [&self.nvir, &self.stellar_mass]
    }
}

/// `M* = 10^9.5 Msun` for key `9p5`.
#[must_use]
pub fn legend_label(key: &str) -> String {
    format!("M* = 10^{} Msun", key.replace('p', "."))
}

/// Fail with `KeyMismatch` unless every key names a series in `results`.
pub fn check_keys(results: &ResultsTable, keys: &[String]) -> Result<(), PlotError> {
    let missing: Vec<String> = keys
        .iter()
        .filter(|k| !results.contains_key(k))
        .cloned()
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PlotError::KeyMismatch {
            missing,
            available: results.keys(),
        })
    }
}

/// One color per key: explicit colors map positionally, otherwise the
/// colormap is sampled evenly.
pub fn resolve_colors(spec: &PlotSpec) -> Result<Vec<Rgb>, PlotError> {
    match &spec.colors {
        Some(colors) => {
            if colors.len() != spec.keys.len() {
                return Err(PlotError::ColorCountMismatch {
                    colors: colors.len(),
                    keys: spec.keys.len(),
                });
            }
            parse_colors(colors)
        }
        None => Ok(Colormap::from_name(&spec.colormap)?.sample(spec.keys.len())),
    }
}

/// Build both figures for `spec.keys`.
///
/// Every validation error is raised before anything is drawn or written.
/// Writing `spec.data_file` and reading `spec.reference` are best effort:
/// failures are logged and the figures are still returned.
pub fn render(results: &ResultsTable, spec: &PlotSpec) -> Result<FigureSet, PlotError> {
    check_keys(results, &spec.keys)?;
    let colors = resolve_colors(spec)?;

    let reference = spec.reference.as_deref().and_then(|path| {
        ReferenceTable::read(path)
            .map_err(|e| warn!(path = %path.display(), error = %e, "Skipping reference overlay"))
            .ok()
    });

    let mut nvir = Figure {
        title: "Evolving halo cumulative number density".into(),
        x: Axis::log("1+z", X_RANGE),
        y: Axis::log("nvir [Mpc^-3]", NVIR_RANGE),
        series: Vec::new(),
        legend: vec![LegendEntry {
            label: "Evolving halo cumulative number density".into(),
            color: Rgb::new(0, 0, 0),
            style: LineStyle::Solid,
        }],
        legend_position: LegendPosition::UpperLeft,
    };
    let mut stellar_mass = Figure {
        title: "Stellar mass evolution".into(),
        x: Axis::log("1+z", X_RANGE),
        y: Axis::log("M*(z) [Msun]", STELLAR_MASS_RANGE),
        series: Vec::new(),
        legend: Vec::new(),
        legend_position: LegendPosition::LowerLeft,
    };
    if reference.is_some() {
        nvir.legend.push(LegendEntry {
            label: "Accounting for random errors in the observed GSMF".into(),
            color: Rgb::new(0, 0, 0),
            style: LineStyle::Dotted,
        });
    }

    for (key, &color) in spec.keys.iter().zip(&colors) {
        let Some((bin, series)) = results.lookup(key) else {
            continue;
        };
        let zp1 = series.z().iter().map(|z| 1.0 + z);
        nvir.series.push(Series {
            key: key.clone(),
            color,
            style: LineStyle::Solid,
            points: zp1.clone().zip(series.nvir().iter().copied()).collect(),
        });
        stellar_mass.series.push(Series {
            key: key.clone(),
            color,
            style: LineStyle::Solid,
            points: zp1.zip(series.log_ms().iter().map(|m| 10f64.powf(*m))).collect(),
        });
        stellar_mass.legend.push(LegendEntry {
            label: legend_label(key),
            color,
            style: LineStyle::Solid,
        });

        if let Some(table) = &reference {
            let rows: Vec<_> = table.for_bin(bin.log_mass()).collect();
            if rows.is_empty() {
                continue;
            }
            nvir.series.push(Series {
                key: key.clone(),
                color,
                style: LineStyle::Dotted,
                points: rows.iter().map(|r| (1.0 + r.z, r.ngal)).collect(),
            });
            stellar_mass.series.push(Series {
                key: key.clone(),
                color,
                style: LineStyle::Dotted,
                points: rows
                    .iter()
                    .map(|r| (1.0 + r.z, 10f64.powf(r.log_ms)))
                    .collect(),
            });
        }
    }

    if let Some(path) = &spec.data_file {
        if let Err(e) = write_series_file(path, results, &spec.keys) {
            warn!(path = %path.display(), error = %e, "Could not write data file");
        }
    }

    debug!(
        keys = spec.keys.len(),
        series = nvir.series.len() + stellar_mass.series.len(),
        "Rendered figures"
    );

    Ok(FigureSet {
        nvir,
        stellar_mass,
        colors: spec.keys.iter().cloned().zip(colors).collect(),
    })
}
