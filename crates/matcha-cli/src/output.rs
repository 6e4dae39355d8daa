//! CLI output formatting.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use matcha_core::results::{BinSeries, ResultsTable};

/// Format a duration for display.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 0.001 {
        format!("{:.2}µs", secs * 1_000_000.0)
    } else if secs < 1.0 {
        format!("{:.2}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.3}s")
    } else {
        let mins = (secs / 60.0).floor() as u64;
        let remaining = secs - (mins as f64 * 60.0);
        format!("{mins}m{remaining:.1}s")
    }
}

/// Number density in scientific notation (`1.527e-2`).
#[must_use]
pub fn format_density(n: f64) -> String {
    format!("{n:.3e}")
}

/// One row per bin: threshold, galaxy density, matched halo mass, and the
/// stellar mass at both ends of the grid.
#[must_use]
pub fn summary_table(results: &ResultsTable) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<8} {:>14} {:>12} {:>10} {:>10}",
        "log M*", "n_gal [Mpc-3]", "log Mvir,0", "z_max", "log M*(z)"
    );
    for (bin, series) in results.iter() {
        let last = series.len().saturating_sub(1);
        let z_max = series.z().get(last).copied().unwrap_or(f64::NAN);
        let log_ms = series.log_ms().get(last).copied().unwrap_or(f64::NAN);
        let _ = writeln!(
            out,
            "  {:<8} {:>14} {:>12.3} {:>10.2} {:>10.3}",
            bin.label(),
            format_density(series.n_gal()),
            series.log_mvir0(),
            z_max,
            log_ms,
        );
    }
    out
}

/// Full `z / nvir / logMs / log Mvir` listing of one series.
#[must_use]
pub fn series_details(key: &str, series: &BinSeries) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "M* = 10^{key}");
    let _ = writeln!(
        out,
        "  {:>8} {:>12} {:>10} {:>10}",
        "z", "nvir", "logMs", "log Mvir"
    );
    for (z, nvir, log_ms, log_mvir) in series.rows() {
        let _ = writeln!(
            out,
            "  {z:>8.4} {:>12} {log_ms:>10.4} {log_mvir:>10.4}",
            format_density(nvir)
        );
    }
    out
}

/// `key final_logMs` per bin, for quiet mode.
#[must_use]
pub fn quiet_lines(results: &ResultsTable) -> String {
    let mut out = String::new();
    for (bin, series) in results.iter() {
        if let Some(last) = series.log_ms().last() {
            let _ = writeln!(out, "{bin} {last:.6}");
        }
    }
    out
}

/// Write the results table as pretty JSON.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be created or written.
pub fn write_json(path: &Path, results: &ResultsTable) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, results)?;
    writeln!(writer)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use matcha_core::results::MassBin;

    fn results() -> ResultsTable {
        let mut bins = BTreeMap::new();
        bins.insert(
            MassBin::from_log_mass(9.5).unwrap(),
            BinSeries::new(
                vec![0.0, 10.0],
                vec![1.2e-2, 2e-5],
                vec![9.5, 6.25],
                vec![12.0, 9.8],
                1.2e-2,
                12.0,
            )
            .unwrap(),
        );
        ResultsTable::new("Behroozi", 0.0, bins)
    }

    #[test]
    fn format_duration_units() {
        assert!(format_duration(Duration::from_nanos(500)).contains("µs"));
        assert!(format_duration(Duration::from_millis(42)).contains("ms"));
        assert_eq!(format_duration(Duration::from_secs_f64(3.5)), "3.500s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30.0s");
    }

    #[test]
    fn density_formatting() {
        assert_eq!(format_density(0.01527), "1.527e-2");
    }

    #[test]
    fn summary_lists_each_bin() {
        let text = summary_table(&results());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("9.5"));
        assert!(lines[1].contains("1.200e-2"));
        assert!(lines[1].contains("6.250"));
    }

    #[test]
    fn details_have_one_row_per_redshift() {
        let r = results();
        let text = series_details("9.5", r.get_key("9p5").unwrap());
        assert_eq!(text.lines().count(), 4);
        assert!(text.starts_with("M* = 10^9.5"));
    }

    #[test]
    fn quiet_output() {
        assert_eq!(quiet_lines(&results()), "9p5 6.250000\n");
    }

    #[test]
    fn json_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        write_json(&path, &results()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["model"], "Behroozi");
        assert_eq!(value["bins"]["9p5"]["logMs"][1], 6.25);
    }
}
