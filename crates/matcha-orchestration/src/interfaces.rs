//! Orchestration interfaces.

use std::time::Duration;

use matcha_core::calculator::CalcError;
use matcha_core::progress::ProgressUpdate;
use matcha_core::results::ResultsTable;

use crate::orchestrator::ComparisonReport;

/// Trait for reporting progress to the user.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress update.
    fn report(&self, update: &ProgressUpdate);

    /// Report completion.
    fn complete(&self);
}

/// Trait for presenting results to the user.
pub trait ResultPresenter: Send + Sync {
    /// Present one results table.
    fn present_result(&self, model: &str, results: &ResultsTable, duration: Duration, details: bool);

    /// Present a side-by-side run of several models.
    fn present_comparison(&self, results: &[CalculationResult], report: Option<&ComparisonReport>);

    /// Present an error.
    fn present_error(&self, error: &str);
}

/// Result of a single calculator run.
#[derive(Debug, Clone)]
pub struct CalculationResult {
    /// Multiplicity model name.
    pub model: String,
    /// The results table or a structured error.
    pub outcome: Result<ResultsTable, CalcError>,
    /// Computation duration.
    pub duration: Duration,
}

/// Null progress reporter (does nothing).
pub struct NullProgressReporter;

impl ProgressReporter for NullProgressReporter {
    fn report(&self, _update: &ProgressUpdate) {}
    fn complete(&self) {}
}
