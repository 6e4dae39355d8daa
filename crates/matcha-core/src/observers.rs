//! Concrete observer implementations.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::Sender;
use tracing::{debug, info};

use crate::constants::PROGRESS_REPORT_THRESHOLD;
use crate::observer::ProgressObserver;
use crate::progress::ProgressUpdate;

/// Observer that forwards throttled updates through a channel without
/// blocking the worker.
pub struct ChannelObserver {
    sender: Sender<ProgressUpdate>,
    last_reported: AtomicU64,
}

impl ChannelObserver {
    #[must_use]
    pub fn new(sender: Sender<ProgressUpdate>) -> Self {
        Self {
            sender,
            last_reported: AtomicU64::new(0),
        }
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, update: &ProgressUpdate) {
        let last = f64::from_bits(self.last_reported.load(Ordering::Relaxed));
        if update.done || (update.progress - last) >= PROGRESS_REPORT_THRESHOLD {
            let _ = self.sender.try_send(update.clone());
            self.last_reported
                .store(update.progress.to_bits(), Ordering::Relaxed);
        }
    }
}

/// Observer that logs progress with temporal throttling.
pub struct LoggingObserver {
    min_interval_ms: u64,
    last_time: AtomicU64,
}

impl LoggingObserver {
    #[must_use]
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms,
            last_time: AtomicU64::new(0),
        }
    }
}

impl ProgressObserver for LoggingObserver {
    #[allow(clippy::cast_possible_truncation)]
    fn on_progress(&self, update: &ProgressUpdate) {
        if update.done {
            info!(model = %update.model, "Computation complete");
            return;
        }

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let last_time = self.last_time.load(Ordering::Relaxed);
        if now.saturating_sub(last_time) < self.min_interval_ms {
            return;
        }
        self.last_time.store(now, Ordering::Relaxed);

        debug!(
            model = %update.model,
            progress = format!("{:.1}%", update.progress * 100.0),
            step = update.current_step,
            total = update.total_steps,
            "Redshift grid progress"
        );
    }
}

/// Does nothing with progress updates.
#[derive(Debug, Default)]
pub struct NoOpObserver;

impl NoOpObserver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ProgressObserver for NoOpObserver {
    fn on_progress(&self, _update: &ProgressUpdate) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_observer_sends() {
        let (tx, rx) = crossbeam_channel::bounded(10);
        let observer = ChannelObserver::new(tx);
        observer.on_progress(&ProgressUpdate::new(0, "Behroozi", 1, 2));
        assert_eq!(rx.try_recv().unwrap().model, "Behroozi");
    }

    #[test]
    fn channel_observer_throttles() {
        let (tx, rx) = crossbeam_channel::bounded(10);
        let observer = ChannelObserver::new(tx);

        observer.on_progress(&ProgressUpdate::new(0, "PS", 3, 200));
        assert!(rx.try_recv().is_ok());

        // 3/200 -> 4/200 is below the 1% threshold.
        observer.on_progress(&ProgressUpdate::new(0, "PS", 4, 200));
        assert!(rx.try_recv().is_err());

        observer.on_progress(&ProgressUpdate::new(0, "PS", 6, 200));
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn channel_observer_always_sends_done() {
        let (tx, rx) = crossbeam_channel::bounded(10);
        let observer = ChannelObserver::new(tx);
        observer.on_progress(&ProgressUpdate::new(0, "ST", 99, 100));
        let _ = rx.try_recv();

        observer.on_progress(&ProgressUpdate::done(0, "ST"));
        assert!(rx.try_recv().unwrap().done);
    }

    #[test]
    fn channel_observer_does_not_block_when_full() {
        let (tx, _rx) = crossbeam_channel::bounded(1);
        let observer = ChannelObserver::new(tx);
        observer.on_progress(&ProgressUpdate::new(0, "PS", 10, 100));
        observer.on_progress(&ProgressUpdate::new(0, "PS", 50, 100));
        observer.on_progress(&ProgressUpdate::done(0, "PS"));
    }

    #[test]
    fn logging_and_noop_observers_accept_updates() {
        let logging = LoggingObserver::new(0);
        logging.on_progress(&ProgressUpdate::new(0, "Tinker08", 1, 2));
        logging.on_progress(&ProgressUpdate::done(0, "Tinker08"));
        NoOpObserver::new().on_progress(&ProgressUpdate::new(0, "PS", 1, 2));
    }
}
