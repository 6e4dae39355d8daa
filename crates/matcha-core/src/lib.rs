//! # matcha-core
//!
//! Core library for the matcha abundance-matching calculator.
//! Evaluates halo mass functions for a flat LCDM cosmology, matches them
//! against the galaxy stellar mass function, and traces how the stellar
//! mass of each galaxy population evolves with redshift.

pub mod calculator;
pub mod constants;
pub mod cosmology;
pub mod fitting;
pub mod gsmf;
pub mod halo_assembly;
pub mod mass_definition;
pub mod mass_function;
pub mod numeric;
pub mod observer;
pub mod observers;
pub mod params;
pub mod power;
pub mod progress;
pub mod registry;
pub mod results;
pub mod transfer;

// Re-exports
pub use calculator::{CalcError, Calculator, ComputationRequest, MassFunctionCalculator};
pub use constants::{exit_codes, DEFAULT_MASS_BINS, PROGRESS_REPORT_THRESHOLD};
pub use cosmology::{CosmologyParameters, COSMOLOGY_FIELDS};
pub use observer::{ProgressObserver, ProgressSubject};
pub use params::HmfParams;
pub use progress::{CancellationToken, ProgressUpdate};
pub use registry::{DefaultModelFactory, ModelFactory};
pub use results::{BinSeries, MassBin, ResultsTable};

/// Compute the results table for a cosmology given as a JSON object.
///
/// This is a convenience function for simple use cases. For a custom model,
/// progress reporting or cancellation, build a `MassFunctionCalculator` and
/// use the `Calculator` trait directly.
///
/// # Errors
/// `InvalidParameter` for a missing, non-numeric or out-of-range cosmology
/// field or `z0`; `InvalidRequest` when `samples < 1`.
pub fn compute(
    cosmology: &serde_json::Value,
    z0: f64,
    samples: i64,
) -> Result<ResultsTable, CalcError> {
    let cosmology = CosmologyParameters::from_value(cosmology)?;
    let request = ComputationRequest::new(cosmology, z0, samples)?;
    let calc = MassFunctionCalculator::from_request(
        &request,
        &HmfParams::default(),
        &DefaultModelFactory::new(),
    )?;
    calc.compute(request.samples())
}
