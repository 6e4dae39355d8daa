//! Core orchestration: parallel execution and result comparison.

use std::sync::Arc;
use std::time::Instant;

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, warn};

use matcha_core::calculator::Calculator;
use matcha_core::observer::ProgressObserver;
use matcha_core::observers::NoOpObserver;
use matcha_core::progress::CancellationToken;
use matcha_core::results::{MassBin, ResultsTable};

use crate::interfaces::CalculationResult;

/// Execute every calculator on a grid of `samples` redshifts.
pub fn execute_calculations(
    calculators: &[Arc<dyn Calculator>],
    samples: usize,
    cancel: &CancellationToken,
) -> Vec<CalculationResult> {
    execute_calculations_with_observer(calculators, samples, cancel, &NoOpObserver::new())
}

fn run_one(
    calc: &dyn Calculator,
    index: usize,
    samples: usize,
    cancel: &CancellationToken,
    observer: &dyn ProgressObserver,
) -> CalculationResult {
    let start = Instant::now();
    let outcome = calc.compute_with(samples, cancel, observer, index);
    let duration = start.elapsed();
    if let Err(e) = &outcome {
        warn!(model = calc.name(), error = %e, "Calculation failed");
    }
    CalculationResult {
        model: calc.name().to_string(),
        outcome,
        duration,
    }
}

/// Execute every calculator with a progress observer. Results come back
/// in calculator order.
pub fn execute_calculations_with_observer(
    calculators: &[Arc<dyn Calculator>],
    samples: usize,
    cancel: &CancellationToken,
    observer: &dyn ProgressObserver,
) -> Vec<CalculationResult> {
    if calculators.len() == 1 {
        return vec![run_one(calculators[0].as_ref(), 0, samples, cancel, observer)];
    }

    let results: Vec<CalculationResult> = calculators
        .iter()
        .enumerate()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|(i, calc)| run_one(calc.as_ref(), i, samples, cancel, observer))
        .collect();

    debug!(calculators = calculators.len(), "Parallel run finished");
    results
}

/// Largest stellar-mass disagreement of one model with the reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDifference {
    pub model: String,
    /// Per bin, the largest `|logMs - logMs_ref|` over the redshift grid.
    pub per_bin: Vec<(MassBin, f64)>,
}

impl ModelDifference {
    /// Largest difference over all bins.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.per_bin.iter().map(|(_, d)| *d).fold(0.0, f64::max)
    }
}

/// How far each successful model strays from the first successful one.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    pub reference: String,
    pub differences: Vec<ModelDifference>,
}

/// First successful results table, with its model name.
#[must_use]
pub fn first_success(results: &[CalculationResult]) -> Option<(&str, &ResultsTable)> {
    results
        .iter()
        .find_map(|r| r.outcome.as_ref().ok().map(|t| (r.model.as_str(), t)))
}

/// Compare every successful table with the first one. Bins missing from
/// either table or series of different lengths are skipped.
///
/// Returns `None` when no calculation succeeded.
#[must_use]
pub fn analyze_comparison_results(results: &[CalculationResult]) -> Option<ComparisonReport> {
    let valid: Vec<(&str, &ResultsTable)> = results
        .iter()
        .filter_map(|r| r.outcome.as_ref().ok().map(|t| (r.model.as_str(), t)))
        .collect();
    let (&(reference, ref_table), others) = valid.split_first()?;

    let differences = others
        .iter()
        .map(|&(model, table)| {
            let per_bin = ref_table
                .iter()
                .filter_map(|(bin, ref_series)| {
                    let series = table.get(bin)?;
                    if series.len() != ref_series.len() {
                        return None;
                    }
                    let d = series
                        .log_ms()
                        .iter()
                        .zip(ref_series.log_ms())
                        .map(|(a, b)| (a - b).abs())
                        .fold(0.0, f64::max);
                    Some((bin, d))
                })
                .collect();
            ModelDifference {
                model: model.to_string(),
                per_bin,
            }
        })
        .collect();

    Some(ComparisonReport {
        reference: reference.to_string(),
        differences,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use matcha_core::calculator::{CalcError, MassFunctionCalculator};
    use matcha_core::cosmology::CosmologyParameters;
    use matcha_core::params::HmfParams;
    use matcha_core::progress::ProgressUpdate;
    use matcha_core::registry::DefaultModelFactory;
    use matcha_core::results::BinSeries;

    fn calc(model: &str) -> Arc<dyn Calculator> {
        let cosmology =
            CosmologyParameters::new(0.678, 0.307115, 0.048, 0.96, 0.823, 1.686).unwrap();
        let params = HmfParams {
            hmf_model: model.into(),
            dlog10m: 0.05,
            ..HmfParams::default()
        };
        Arc::new(
            MassFunctionCalculator::with_params(cosmology, 0.0, &params, &DefaultModelFactory::new())
                .unwrap(),
        )
    }

    fn table(log_ms: &[f64]) -> ResultsTable {
        let n = log_ms.len();
        let mut bins = BTreeMap::new();
        bins.insert(
            MassBin::from_log_mass(10.0).unwrap(),
            BinSeries::new(vec![0.0; n], vec![1e-3; n], log_ms.to_vec(), vec![12.0; n], 1e-3, 12.0)
                .unwrap(),
        );
        ResultsTable::new("x", 0.0, bins)
    }

    fn ok(model: &str, log_ms: &[f64]) -> CalculationResult {
        CalculationResult {
            model: model.into(),
            outcome: Ok(table(log_ms)),
            duration: Duration::from_millis(1),
        }
    }

    fn failed(model: &str) -> CalculationResult {
        CalculationResult {
            model: model.into(),
            outcome: Err(CalcError::Numerical("bracket".into())),
            duration: Duration::from_millis(1),
        }
    }

    #[test]
    fn execute_single_calculator() {
        let results = execute_calculations(&[calc("Behroozi")], 3, &CancellationToken::new());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].model, "Behroozi");
        assert_eq!(results[0].outcome.as_ref().unwrap().samples(), 3);
    }

    #[test]
    fn execute_multiple_calculators_parallel() {
        let calcs = [calc("Tinker08"), calc("PS")];
        let results = execute_calculations(&calcs, 3, &CancellationToken::new());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].model, "Tinker08");
        assert_eq!(results[1].model, "PS");
        for r in &results {
            assert!(r.outcome.is_ok(), "{} failed: {:?}", r.model, r.outcome);
        }
    }

    #[test]
    fn execute_with_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let results = execute_calculations(&[calc("PS"), calc("ST")], 3, &cancel);
        assert!(results
            .iter()
            .all(|r| matches!(r.outcome, Err(CalcError::Cancelled))));
    }

    #[test]
    fn execute_with_observer() {
        struct CountingObserver(AtomicUsize);
        impl ProgressObserver for CountingObserver {
            fn on_progress(&self, _update: &ProgressUpdate) {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }

        let observer = CountingObserver(AtomicUsize::new(0));
        let results = execute_calculations_with_observer(
            &[calc("Behroozi")],
            4,
            &CancellationToken::new(),
            &observer,
        );
        assert!(results[0].outcome.is_ok());
        // one update per redshift plus the final one
        assert_eq!(observer.0.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn compare_reports_largest_difference() {
        let results = vec![ok("A", &[10.0, 9.5, 9.0]), ok("B", &[10.0, 9.3, 9.1])];
        let report = analyze_comparison_results(&results).unwrap();
        assert_eq!(report.reference, "A");
        assert_eq!(report.differences.len(), 1);
        let d = &report.differences[0];
        assert_eq!(d.model, "B");
        assert!((d.max() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn compare_identical_tables() {
        let results = vec![ok("A", &[10.0, 9.5]), ok("B", &[10.0, 9.5])];
        let report = analyze_comparison_results(&results).unwrap();
        assert_eq!(report.differences[0].max(), 0.0);
    }

    #[test]
    fn compare_skips_failures() {
        let results = vec![failed("A"), ok("B", &[10.0]), failed("C"), ok("D", &[9.0])];
        let report = analyze_comparison_results(&results).unwrap();
        assert_eq!(report.reference, "B");
        assert_eq!(report.differences.len(), 1);
        assert_eq!(report.differences[0].model, "D");
        assert_eq!(first_success(&results).map(|(m, _)| m), Some("B"));
    }

    #[test]
    fn compare_skips_mismatched_lengths() {
        let results = vec![ok("A", &[10.0, 9.5]), ok("B", &[10.0])];
        let report = analyze_comparison_results(&results).unwrap();
        assert!(report.differences[0].per_bin.is_empty());
    }

    #[test]
    fn compare_without_success() {
        assert!(analyze_comparison_results(&[failed("A")]).is_none());
        assert!(analyze_comparison_results(&[]).is_none());
        assert!(first_success(&[failed("A")]).is_none());
    }
}
