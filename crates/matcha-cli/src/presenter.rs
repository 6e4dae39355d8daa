//! CLI result presenter.

use std::time::Duration;

use matcha_core::results::ResultsTable;
use matcha_orchestration::interfaces::{CalculationResult, ResultPresenter};
use matcha_orchestration::orchestrator::ComparisonReport;

use crate::output::{format_duration, quiet_lines, series_details, summary_table};
use crate::ui::{print_error, print_header};

/// CLI result presenter.
pub struct CLIResultPresenter {
    verbose: bool,
    quiet: bool,
}

impl CLIResultPresenter {
    #[must_use]
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }
}

impl ResultPresenter for CLIResultPresenter {
    fn present_result(&self, model: &str, results: &ResultsTable, duration: Duration, details: bool) {
        if self.quiet {
            print!("{}", quiet_lines(results));
            return;
        }

        print_header(&format!("Abundance matching ({model})"));
        println!("z0: {}", results.z0());
        println!("Redshift samples: {}", results.samples());
        println!("Duration: {}", format_duration(duration));
        println!();
        print!("{}", summary_table(results));

        if details || self.verbose {
            for (bin, series) in results.iter() {
                println!();
                print!("{}", series_details(&bin.label(), series));
            }
        }
    }

    fn present_comparison(&self, results: &[CalculationResult], report: Option<&ComparisonReport>) {
        if self.quiet {
            return;
        }

        println!("\nComparison Results:");
        println!("{:-<60}", "");
        for result in results {
            let status = if result.outcome.is_err() { "ERROR" } else { "OK" };
            println!(
                "  {:<20} {:>10} [{}]",
                result.model,
                format_duration(result.duration),
                status,
            );
        }

        let Some(report) = report else {
            return;
        };
        println!("\nMax |d logMs| relative to {}:", report.reference);
        for diff in &report.differences {
            let bins: Vec<String> = diff
                .per_bin
                .iter()
                .map(|(bin, d)| format!("{}:{d:.3}", bin.label()))
                .collect();
            println!("  {:<20} {:>8.3}  {}", diff.model, diff.max(), bins.join(" "));
        }
    }

    fn present_error(&self, error: &str) {
        print_error(error);
    }
}
