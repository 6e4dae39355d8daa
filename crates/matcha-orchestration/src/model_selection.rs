//! Calculator construction from a model selection.

use std::sync::Arc;

use rayon::prelude::*;

use matcha_core::calculator::{CalcError, Calculator, MassFunctionCalculator};
use matcha_core::cosmology::CosmologyParameters;
use matcha_core::params::HmfParams;
use matcha_core::registry::ModelFactory;

/// Build the calculators to run for `model`: one named model, or every
/// registered model for `"all"`. All calculators share the cosmology,
/// `z0` and engine parameters.
pub fn get_calculators_to_run(
    model: &str,
    cosmology: &CosmologyParameters,
    z0: f64,
    params: &HmfParams,
    factory: &dyn ModelFactory,
) -> Result<Vec<Arc<dyn Calculator>>, CalcError> {
    let names: Vec<&str> = if model.eq_ignore_ascii_case("all") {
        factory.available()
    } else {
        vec![model]
    };

    let models = names
        .into_iter()
        .map(|name| factory.get(name))
        .collect::<Result<Vec<_>, _>>()?;

    models
        .into_par_iter()
        .map(|m| {
            let calc = MassFunctionCalculator::with_model(*cosmology, z0, params, m)?;
            Ok(Arc::new(calc) as Arc<dyn Calculator>)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use matcha_core::registry::DefaultModelFactory;

    fn planck() -> CosmologyParameters {
        CosmologyParameters::new(0.678, 0.307115, 0.048, 0.96, 0.823, 1.686).unwrap()
    }

    fn coarse() -> HmfParams {
        HmfParams {
            dlog10m: 0.05,
            ..HmfParams::default()
        }
    }

    #[test]
    fn select_all() {
        let factory = DefaultModelFactory::new();
        let calcs = get_calculators_to_run("all", &planck(), 0.0, &coarse(), &factory).unwrap();
        let names: Vec<&str> = calcs.iter().map(|c| c.name()).collect();
        assert_eq!(names, factory.available());
    }

    #[test]
    fn select_single() {
        let factory = DefaultModelFactory::new();
        let calcs = get_calculators_to_run("st", &planck(), 0.0, &coarse(), &factory).unwrap();
        assert_eq!(calcs.len(), 1);
        assert_eq!(calcs[0].name(), "ST");
    }

    #[test]
    fn select_unknown() {
        let factory = DefaultModelFactory::new();
        let result = get_calculators_to_run("Reed07", &planck(), 0.0, &coarse(), &factory);
        assert!(matches!(result, Err(CalcError::Config(_))));
    }

    #[test]
    fn invalid_z0_surfaces() {
        let factory = DefaultModelFactory::new();
        let result = get_calculators_to_run("PS", &planck(), f64::NAN, &coarse(), &factory);
        assert!(matches!(result, Err(CalcError::InvalidParameter(_))));
    }
}
