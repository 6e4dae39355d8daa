//! Shared fixtures for the workspace integration tests.

use serde_json::{json, Value};

use matcha_core::calculator::{CalcError, MassFunctionCalculator};
use matcha_core::cosmology::CosmologyParameters;
use matcha_core::params::HmfParams;
use matcha_core::registry::DefaultModelFactory;
use matcha_core::results::ResultsTable;

/// `h_0, O_m0, O_b0, n, sigma_8, delta_c` of the reference run.
pub const REFERENCE_COSMOLOGY: [f64; 6] = [0.678, 0.307115, 0.048, 0.96, 0.823, 1.686];

/// The reference cosmology as a JSON mapping.
#[must_use]
pub fn cosmology_json() -> Value {
    let [h_0, o_m0, o_b0, n, sigma_8, delta_c] = REFERENCE_COSMOLOGY;
    json!({
        "h_0": h_0,
        "O_m0": o_m0,
        "O_b0": o_b0,
        "n": n,
        "sigma_8": sigma_8,
        "delta_c": delta_c,
    })
}

pub fn reference_cosmology() -> Result<CosmologyParameters, CalcError> {
    let [h_0, o_m0, o_b0, n, sigma_8, delta_c] = REFERENCE_COSMOLOGY;
    CosmologyParameters::new(h_0, o_m0, o_b0, n, sigma_8, delta_c)
}

/// Engine parameters with a coarse mass table, for quick runs.
#[must_use]
pub fn coarse_params(model: &str) -> HmfParams {
    HmfParams {
        hmf_model: model.to_string(),
        dlog10m: 0.05,
        ..HmfParams::default()
    }
}

/// Run `model` on the reference cosmology with a coarse mass table.
pub fn compute_coarse(model: &str, z0: f64, samples: usize) -> Result<ResultsTable, CalcError> {
    let calc = MassFunctionCalculator::with_params(
        reference_cosmology()?,
        z0,
        &coarse_params(model),
        &DefaultModelFactory::new(),
    )?;
    calc.compute(samples)
}
