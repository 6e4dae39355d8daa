//! Application entry point and dispatch.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use tracing::{info, warn};

use matcha_cli::output::write_json;
use matcha_cli::presenter::CLIResultPresenter;
use matcha_cli::progress::CLIProgressReporter;
use matcha_cli::ui::print_success;
use matcha_core::calculator::{CalcError, Calculator, ComputationRequest};
use matcha_core::observer::ProgressSubject;
use matcha_core::observers::{ChannelObserver, LoggingObserver};
use matcha_core::progress::CancellationToken;
use matcha_core::registry::DefaultModelFactory;
use matcha_core::results::ResultsTable;
use matcha_orchestration::interfaces::{CalculationResult, ResultPresenter};
use matcha_orchestration::model_selection::get_calculators_to_run;
use matcha_orchestration::orchestrator::{
    analyze_comparison_results, execute_calculations_with_observer, first_success,
};
use matcha_plot::{export_svg, render, PlotSpec};
use matcha_tui::header::run_summary;
use matcha_tui::{TUIResultPresenter, TuiApp, TuiBridgeObserver, TuiMessage};

use crate::config::{AppConfig, RunSettings};
use crate::version::full_version;

/// Minimum spacing of progress log lines in verbose mode.
const PROGRESS_LOG_INTERVAL_MS: u64 = 500;

/// Run the application.
pub fn run(config: &AppConfig) -> Result<()> {
    if let Some(shell) = config.completion {
        let mut cmd = <AppConfig as clap::CommandFactory>::command();
        matcha_cli::completion::generate_completion(&mut cmd, shell, &mut std::io::stdout());
        return Ok(());
    }

    let settings = config.resolve()?;
    let request = ComputationRequest::new(settings.cosmology, settings.z0, settings.samples)?;
    let calculators = get_calculators_to_run(
        &settings.model,
        request.cosmology(),
        request.z0(),
        &settings.params,
        &DefaultModelFactory::new(),
    )?;
    info!(
        version = %full_version(),
        model = %settings.model,
        z0 = request.z0(),
        samples = request.samples(),
        "Starting run"
    );

    let cancel = CancellationToken::new();
    install_ctrlc_handler(cancel.clone());

    if config.tui {
        return run_tui(config, &settings, &request, calculators, &cancel);
    }
    run_cli(config, &settings, &request, &calculators, &cancel)
}

fn run_cli(
    config: &AppConfig,
    settings: &RunSettings,
    request: &ComputationRequest,
    calculators: &[Arc<dyn Calculator>],
    cancel: &CancellationToken,
) -> Result<()> {
    let names: Vec<&str> = calculators.iter().map(|c| c.name()).collect();
    let reporter = CLIProgressReporter::new(&names, config.quiet);
    let (tx, rx) = crossbeam_channel::unbounded();
    let forwarder = reporter.spawn_forwarder(rx);
    let observers = ProgressSubject::new();
    observers.register(Arc::new(ChannelObserver::new(tx)));
    if config.verbose {
        observers.register(Arc::new(LoggingObserver::new(PROGRESS_LOG_INTERVAL_MS)));
    }

    let results =
        execute_calculations_with_observer(calculators, request.samples(), cancel, &observers);
    // closes the progress channel
    drop(observers);
    if forwarder.join().is_err() {
        warn!("Progress display thread panicked");
    }

    let presenter = CLIResultPresenter::new(config.verbose, config.quiet);
    present(&presenter, &results, config.details);

    let (model, table) = plotted(&results)?;
    info!(model, "Plotting results");
    let figures = render(table, &settings.plot)?;

    if let Some(dir) = &config.export_dir {
        let paths = export_svg(&figures, dir)?;
        if !config.quiet {
            for path in paths {
                print_success(&format!("Wrote {}", path.display()));
            }
        }
    }
    if let Some(path) = &config.output {
        write_output(path, table)?;
    }
    Ok(())
}

fn present(presenter: &dyn ResultPresenter, results: &[CalculationResult], details: bool) {
    for result in results {
        match &result.outcome {
            Ok(table) => presenter.present_result(&result.model, table, result.duration, details),
            Err(e) => presenter.present_error(&format!("{}: {e}", result.model)),
        }
    }
    if results.len() > 1 {
        let report = analyze_comparison_results(results);
        presenter.present_comparison(results, report.as_ref());
    }
}

/// The table to plot: the first successful model. When every model failed,
/// the first failure is returned.
fn plotted(results: &[CalculationResult]) -> Result<(&str, &ResultsTable), CalcError> {
    if let Some(found) = first_success(results) {
        return Ok(found);
    }
    Err(results
        .iter()
        .find_map(|r| r.outcome.as_ref().err().cloned())
        .unwrap_or(CalcError::Cancelled))
}

fn write_output(path: &Path, table: &ResultsTable) -> Result<()> {
    write_json(path, table).with_context(|| format!("writing {}", path.display()))
}

fn run_tui(
    config: &AppConfig,
    settings: &RunSettings,
    request: &ComputationRequest,
    calculators: Vec<Arc<dyn Calculator>>,
    cancel: &CancellationToken,
) -> Result<()> {
    let (tx, rx) = crossbeam_channel::unbounded::<TuiMessage>();

    let mut app = TuiApp::new(rx);
    app.set_summary(run_summary(request.cosmology(), request.z0(), request.samples()));

    let job = TuiJob {
        calculators,
        samples: request.samples(),
        plot: settings.plot.clone(),
        details: config.details,
        export_dir: config.export_dir.clone(),
        output: config.output.clone(),
        cancel: cancel.clone(),
    };
    std::thread::spawn(move || job.run(&tx));

    app.run().map_err(|e| anyhow::anyhow!("TUI error: {e}"))?;

    // leaving the viewer abandons the run
    cancel.cancel();
    if app.cancel_requested {
        return Err(CalcError::Cancelled.into());
    }
    Ok(())
}

/// Background half of the TUI: computes, presents and plots, streaming
/// everything as messages.
struct TuiJob {
    calculators: Vec<Arc<dyn Calculator>>,
    samples: usize,
    plot: PlotSpec,
    details: bool,
    export_dir: Option<std::path::PathBuf>,
    output: Option<std::path::PathBuf>,
    cancel: CancellationToken,
}

impl TuiJob {
    fn run(self, tx: &Sender<TuiMessage>) {
        let _ = tx.send(TuiMessage::Started);

        let observer = TuiBridgeObserver::new(tx.clone());
        let results = execute_calculations_with_observer(
            &self.calculators,
            self.samples,
            &self.cancel,
            &observer,
        );

        let presenter = TUIResultPresenter::new(tx.clone());
        present(&presenter, &results, self.details);

        if let Err(e) = self.plot_and_export(&results, tx) {
            presenter.present_error(&format!("{e:#}"));
        }

        let _ = tx.send(TuiMessage::Finished);
        let _ = tx.send(TuiMessage::Log("Press 'q' to quit.".to_string()));
    }

    fn plot_and_export(&self, results: &[CalculationResult], tx: &Sender<TuiMessage>) -> Result<()> {
        let (model, table) = plotted(results)?;
        let figures = render(table, &self.plot)?;
        let _ = tx.send(TuiMessage::Log(format!("Plotted {model}")));

        if let Some(dir) = &self.export_dir {
            for path in export_svg(&figures, dir)? {
                let _ = tx.send(TuiMessage::Log(format!("Wrote {}", path.display())));
            }
        }
        if let Some(path) = &self.output {
            write_output(path, table)?;
            let _ = tx.send(TuiMessage::Log(format!("Wrote {}", path.display())));
        }

        let _ = tx.send(TuiMessage::Figures(Box::new(figures)));
        Ok(())
    }
}

fn install_ctrlc_handler(cancel: CancellationToken) {
    if let Err(e) = ctrlc::set_handler(move || cancel.cancel()) {
        warn!(error = %e, "Could not install Ctrl+C handler");
    }
}
