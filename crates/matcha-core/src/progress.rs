//! Progress tracking types and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::calculator::CalcError;

/// Progress update sent from calculators to observers.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Calculator index (for multi-model runs).
    pub calc_index: usize,
    /// Name of the multiplicity model producing this update.
    pub model: &'static str,
    /// Current progress as a fraction in [0.0, 1.0].
    pub progress: f64,
    /// Redshifts finished so far.
    pub current_step: u64,
    /// Total number of redshifts.
    pub total_steps: u64,
    /// Whether this is the final update.
    pub done: bool,
}

impl ProgressUpdate {
    /// Create a new progress update.
    #[must_use]
    pub fn new(calc_index: usize, model: &'static str, current: u64, total: u64) -> Self {
        let progress = if total == 0 {
            0.0
        } else {
            current as f64 / total as f64
        };
        Self {
            calc_index,
            model,
            progress,
            current_step: current,
            total_steps: total,
            done: false,
        }
    }

    /// Create a completion update.
    #[must_use]
    pub fn done(calc_index: usize, model: &'static str) -> Self {
        Self {
            calc_index,
            model,
            progress: 1.0,
            current_step: 0,
            total_steps: 0,
            done: true,
        }
    }
}

/// Cooperative cancellation token shared across threads.
///
/// # Example
/// ```
/// use matcha_core::progress::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(token.check_cancelled().is_ok());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// assert!(token.check_cancelled().is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Checkpoint: `Err(CalcError::Cancelled)` once cancellation was requested.
    pub fn check_cancelled(&self) -> Result<(), CalcError> {
        if self.is_cancelled() {
            Err(CalcError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_update_fraction() {
        let update = ProgressUpdate::new(0, "Behroozi", 25, 100);
        assert_eq!(update.model, "Behroozi");
        assert!((update.progress - 0.25).abs() < f64::EPSILON);
        assert!(!update.done);
    }

    #[test]
    fn progress_update_zero_total() {
        let update = ProgressUpdate::new(0, "PS", 0, 0);
        assert!(update.progress.abs() < f64::EPSILON);
    }

    #[test]
    fn progress_update_done() {
        let update = ProgressUpdate::done(1, "ST");
        assert!(update.done);
        assert!((update.progress - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn check_cancelled_err() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(token.check_cancelled(), Err(CalcError::Cancelled)));
    }

    #[test]
    fn cancellation_propagates_through_clone() {
        let token1 = CancellationToken::new();
        let token2 = token1.clone();
        token1.cancel();
        assert!(token2.is_cancelled());
    }
}
