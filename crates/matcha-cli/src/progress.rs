//! Terminal progress bars fed from calculator progress updates.

use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::debug;

use matcha_core::progress::ProgressUpdate;
use matcha_orchestration::interfaces::ProgressReporter;

const TEMPLATE: &str = "{prefix:>10} [{bar:40.cyan/blue}] {pos}/{len} z-steps {msg}";

/// One progress bar per calculator, indexed by `calc_index`.
pub struct CLIProgressReporter {
    multi: MultiProgress,
    bars: Vec<ProgressBar>,
}

impl CLIProgressReporter {
    /// Bars for `models` drawn on stderr, or hidden when `hidden` is set.
    #[must_use]
    pub fn new(models: &[&str], hidden: bool) -> Self {
        let target = if hidden {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        };
        let multi = MultiProgress::with_draw_target(target);
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        let bars = models
            .iter()
            .map(|name| {
                let bar = multi.add(ProgressBar::new(0));
                bar.set_style(style.clone());
                bar.set_prefix((*name).to_string());
                bar
            })
            .collect();
        Self { multi, bars }
    }

    /// Number of bars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Position of the bar for `calc_index`.
    #[must_use]
    pub fn position(&self, calc_index: usize) -> Option<u64> {
        self.bars.get(calc_index).map(ProgressBar::position)
    }

    /// Forward updates from `rx` on a background thread until every sender
    /// is dropped, then finish the bars.
    pub fn spawn_forwarder(self, rx: Receiver<ProgressUpdate>) -> JoinHandle<()> {
        std::thread::spawn(move || {
            let mut received = 0usize;
            for update in rx {
                self.report(&update);
                received += 1;
            }
            debug!(updates = received, bars = self.bars.len(), "Progress channel closed");
            self.complete();
        })
    }
}

impl ProgressReporter for CLIProgressReporter {
    fn report(&self, update: &ProgressUpdate) {
        let Some(bar) = self.bars.get(update.calc_index) else {
            return;
        };
        if update.done {
            bar.finish_with_message("done");
            return;
        }
        if bar.length() != Some(update.total_steps) {
            bar.set_length(update.total_steps);
        }
        bar.set_position(update.current_step);
    }

    fn complete(&self) {
        for bar in &self.bars {
            if !bar.is_finished() {
                bar.abandon();
            }
        }
        let _ = self.multi.clear();
    }
}
