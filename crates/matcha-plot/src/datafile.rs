//! Whitespace-separated data tables: the auxiliary series dump and the
//! reference overlay.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use matcha_core::results::ResultsTable;

use crate::error::PlotError;

/// Header of the auxiliary series file.
pub const SERIES_HEADER: [&str; 5] = ["logMs_0", "z", "nvir", "logMs", "log_mvir"];

/// Columns read from a reference table.
pub const REFERENCE_COLUMNS: [&str; 4] = [
    "logMs_0",
    "z",
    "ngal_eval_logMs_prog_deconv_gsmf",
    "logMs_prog_deconv_gsmf",
];

/// Write one row per grid point of every key in `keys` that `results`
/// holds, in key order.
pub fn write_series<W: Write>(
    mut out: W,
    results: &ResultsTable,
    keys: &[String],
) -> io::Result<()> {
    writeln!(out, "{}", SERIES_HEADER.join(" "))?;
    for key in keys {
        let Some(series) = results.get_key(key) else {
            continue;
        };
        let label = key.replace('p', ".");
        for (z, nvir, log_ms, log_mvir) in series.rows() {
            writeln!(out, "{label} {z:.6} {nvir:.6e} {log_ms:.6} {log_mvir:.6}")?;
        }
    }
    out.flush()
}

/// [`write_series`] into a file, replacing it if present.
pub fn write_series_file(path: &Path, results: &ResultsTable, keys: &[String]) -> io::Result<()> {
    let file = fs::File::create(path)?;
    write_series(BufWriter::new(file), results, keys)
}

/// One row of a reference table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceRow {
    pub log_ms0: f64,
    pub z: f64,
    /// Galaxy number density along the reference track.
    pub ngal: f64,
    /// log10 stellar mass along the reference track.
    pub log_ms: f64,
}

/// Reference tracks keyed by their z0 stellar mass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTable {
    rows: Vec<ReferenceRow>,
}

impl ReferenceTable {
    pub fn read(path: &Path) -> Result<Self, PlotError> {
        let text = fs::read_to_string(path)
            .map_err(|e| PlotError::Reference(format!("{}: {e}", path.display())))?;
        Self::parse(&text)
    }

    /// Parse a table whose first non-empty line names the columns. Extra
    /// columns are ignored; later `#` lines are comments.
    pub fn parse(text: &str) -> Result<Self, PlotError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty());

        let (_, header) = lines
            .next()
            .ok_or_else(|| PlotError::Reference("empty reference table".into()))?;
        let names: Vec<&str> = header.trim_start_matches('#').split_whitespace().collect();
        let index = REFERENCE_COLUMNS
            .iter()
            .map(|col| {
                names
                    .iter()
                    .position(|n| n == col)
                    .ok_or_else(|| PlotError::Reference(format!("missing column '{col}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::new();
        for (line_no, line) in lines {
            if line.starts_with('#') {
                continue;
            }
            let fields = line
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| PlotError::Reference(format!("line {line_no}: {e}")))?;
            if fields.len() != names.len() {
                return Err(PlotError::Reference(format!(
                    "line {line_no}: expected {} fields, found {}",
                    names.len(),
                    fields.len()
                )));
            }
            rows.push(ReferenceRow {
                log_ms0: fields[index[0]],
                z: fields[index[1]],
                ngal: fields[index[2]],
                log_ms: fields[index[3]],
            });
        }
        Ok(Self { rows })
    }

    /// Rows whose `logMs_0` equals `log_ms0`.
    pub fn for_bin(&self, log_ms0: f64) -> impl Iterator<Item = &ReferenceRow> {
        self.rows
            .iter()
            .filter(move |r| (r.log_ms0 - log_ms0).abs() < 1e-6)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
