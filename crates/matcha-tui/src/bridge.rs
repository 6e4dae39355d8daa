//! Bridge between calculation progress and TUI messages.

use std::time::Duration;

use crossbeam_channel::Sender;

use matcha_core::observer::ProgressObserver;
use matcha_core::progress::ProgressUpdate;
use matcha_core::results::ResultsTable;
use matcha_orchestration::interfaces::{CalculationResult, ResultPresenter};
use matcha_orchestration::orchestrator::ComparisonReport;

use crate::messages::TuiMessage;

/// Core-level progress observer that forwards updates to the TUI channel.
///
/// Sends never block; updates are dropped once the TUI has gone away.
pub struct TuiBridgeObserver {
    tx: Sender<TuiMessage>,
}

impl TuiBridgeObserver {
    #[must_use]
    pub fn new(tx: Sender<TuiMessage>) -> Self {
        Self { tx }
    }
}

impl ProgressObserver for TuiBridgeObserver {
    fn on_progress(&self, update: &ProgressUpdate) {
        let _ = self.tx.try_send(TuiMessage::Progress {
            index: update.calc_index,
            progress: update.progress,
            model: update.model.to_string(),
        });
    }
}

/// Presents results as log lines in the TUI.
pub struct TUIResultPresenter {
    tx: Sender<TuiMessage>,
}

impl TUIResultPresenter {
    #[must_use]
    pub fn new(tx: Sender<TuiMessage>) -> Self {
        Self { tx }
    }

    fn log(&self, line: String) {
        let _ = self.tx.try_send(TuiMessage::Log(line));
    }
}

impl ResultPresenter for TUIResultPresenter {
    fn present_result(&self, model: &str, results: &ResultsTable, duration: Duration, details: bool) {
        let _ = self.tx.try_send(TuiMessage::Complete {
            model: model.to_string(),
            duration,
        });
        self.log(format!(
            "{model}: {} bins x {} redshifts in {duration:.3?}",
            results.len(),
            results.samples()
        ));
        for (bin, series) in results.iter() {
            let first = series.log_ms().first().copied().unwrap_or(f64::NAN);
            let last = series.log_ms().last().copied().unwrap_or(f64::NAN);
            self.log(format!(
                "  {}: n_gal={:.3e} log Mvir,0={:.3} logMs {first:.3} -> {last:.3}",
                bin.label(),
                series.n_gal(),
                series.log_mvir0(),
            ));
            if details {
                for (z, nvir, log_ms, _) in series.rows() {
                    self.log(format!("    z={z:.4} nvir={nvir:.3e} logMs={log_ms:.4}"));
                }
            }
        }
    }

    fn present_comparison(&self, results: &[CalculationResult], report: Option<&ComparisonReport>) {
        for r in results {
            match &r.outcome {
                Ok(_) => self.log(format!("{}: {:.3?} [OK]", r.model, r.duration)),
                Err(e) => self.log(format!("[ERROR] {}: {e}", r.model)),
            }
        }
        if let Some(report) = report {
            for diff in &report.differences {
                self.log(format!(
                    "{} vs {}: max |d logMs| = {:.3}",
                    diff.model,
                    report.reference,
                    diff.max()
                ));
            }
        }
    }

    fn present_error(&self, error: &str) {
        let _ = self.tx.try_send(TuiMessage::Error(error.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crossbeam_channel::unbounded;
    use matcha_core::calculator::CalcError;
    use matcha_core::results::{BinSeries, MassBin};

    fn table() -> ResultsTable {
        let mut bins = BTreeMap::new();
        bins.insert(
            MassBin::from_log_mass(11.0).unwrap(),
            BinSeries::new(
                vec![0.0, 4.0],
                vec![1e-3, 1e-5],
                vec![11.0, 8.7],
                vec![13.0, 11.2],
                1e-3,
                13.0,
            )
            .unwrap(),
        );
        ResultsTable::new("Behroozi", 0.0, bins)
    }

    fn drain(rx: &crossbeam_channel::Receiver<TuiMessage>) -> Vec<TuiMessage> {
        rx.try_iter().collect()
    }

    #[test]
    fn observer_forwards_progress() {
        let (tx, rx) = unbounded();
        let observer = TuiBridgeObserver::new(tx);
        observer.on_progress(&ProgressUpdate::new(1, "PS", 2, 4));
        match drain(&rx).as_slice() {
            [TuiMessage::Progress {
                index,
                progress,
                model,
            }] => {
                assert_eq!(*index, 1);
                assert!((progress - 0.5).abs() < f64::EPSILON);
                assert_eq!(model, "PS");
            }
            other => panic!("unexpected messages: {other:?}"),
        }
    }

    #[test]
    fn observer_survives_closed_channel() {
        let (tx, rx) = unbounded();
        drop(rx);
        TuiBridgeObserver::new(tx).on_progress(&ProgressUpdate::done(0, "ST"));
    }

    #[test]
    fn present_result_sends_complete_and_summary() {
        let (tx, rx) = unbounded();
        TUIResultPresenter::new(tx).present_result(
            "Behroozi",
            &table(),
            Duration::from_millis(20),
            false,
        );
        let messages = drain(&rx);
        assert!(matches!(&messages[0], TuiMessage::Complete { model, .. } if model == "Behroozi"));
        let logs: Vec<&String> = messages
            .iter()
            .filter_map(|m| match m {
                TuiMessage::Log(l) => Some(l),
                _ => None,
            })
            .collect();
        assert_eq!(logs.len(), 2);
        assert!(logs[1].contains("logMs 11.000 -> 8.700"));
    }

    #[test]
    fn present_result_details_add_rows() {
        let (tx, rx) = unbounded();
        TUIResultPresenter::new(tx).present_result("PS", &table(), Duration::ZERO, true);
        // complete, summary, bin line, two rows
        assert_eq!(drain(&rx).len(), 5);
    }

    #[test]
    fn comparison_marks_failures() {
        let (tx, rx) = unbounded();
        let results = vec![
            CalculationResult {
                model: "Behroozi".into(),
                outcome: Ok(table()),
                duration: Duration::from_millis(3),
            },
            CalculationResult {
                model: "ST".into(),
                outcome: Err(CalcError::Cancelled),
                duration: Duration::from_millis(1),
            },
        ];
        TUIResultPresenter::new(tx).present_comparison(&results, None);
        let messages = drain(&rx);
        assert_eq!(messages.len(), 2);
        assert!(matches!(&messages[1], TuiMessage::Log(l) if l.starts_with("[ERROR] ST")));
    }

    #[test]
    fn present_error_sends_error() {
        let (tx, rx) = unbounded();
        TUIResultPresenter::new(tx).present_error("bad colormap");
        assert!(matches!(drain(&rx).as_slice(), [TuiMessage::Error(e)] if e == "bad colormap"));
    }
}
