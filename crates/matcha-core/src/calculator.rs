//! The `Calculator` trait and the abundance-matching calculator.
//!
//! `compute` runs the full pipeline: galaxy densities at z0, halo
//! abundance matching, median progenitor tracks, and the stellar mass that
//! keeps the cumulative galaxy density equal to the evolving halo density.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::constants::{BISECT_MAX_ITER, ONE_PLUS_Z_MAX, STELLAR_BRACKET, STELLAR_XTOL};
use crate::cosmology::CosmologyParameters;
use crate::fitting::MultiplicityFunction;
use crate::gsmf::{GsmfAtRedshift, StellarMassFunction};
use crate::halo_assembly::median_log10_mvir_progenitors;
use crate::mass_function::HaloMassFunction;
use crate::numeric::{bisect, logspace};
use crate::observer::ProgressObserver;
use crate::observers::NoOpObserver;
use crate::params::HmfParams;
use crate::progress::{CancellationToken, ProgressUpdate};
use crate::registry::{DefaultModelFactory, ModelFactory};
use crate::results::{BinSeries, MassBin, ResultsTable};

/// Error type for calculations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
    /// A cosmology or engine parameter is missing, non-numeric or out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The request itself is malformed (e.g. no samples).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A root was not bracketed or a value fell outside a table.
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Unknown model, transfer function or mode name.
    #[error("configuration error: {0}")]
    Config(String),

    /// Calculation was cancelled.
    #[error("calculation cancelled")]
    Cancelled,
}

/// Convert a raw sample count, rejecting zero and negative values.
pub fn validate_samples(samples: i64) -> Result<usize, CalcError> {
    if samples < 1 {
        return Err(CalcError::InvalidRequest(format!(
            "samples must be a positive integer, got {samples}"
        )));
    }
    usize::try_from(samples)
        .map_err(|_| CalcError::InvalidRequest(format!("samples too large: {samples}")))
}

/// Check that `z0` leaves room for a redshift grid up to `1+z = 12`.
pub fn validate_z0(z0: f64) -> Result<(), CalcError> {
    if !z0.is_finite() || z0 <= -1.0 || 1.0 + z0 >= ONE_PLUS_Z_MAX {
        return Err(CalcError::InvalidParameter(format!(
            "z0 must be finite and within (-1, {}), got {z0}",
            ONE_PLUS_Z_MAX - 1.0
        )));
    }
    Ok(())
}

/// Cosmology, reference redshift and sample count of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputationRequest {
    cosmology: CosmologyParameters,
    z0: f64,
    samples: usize,
}

impl ComputationRequest {
    pub fn new(cosmology: CosmologyParameters, z0: f64, samples: i64) -> Result<Self, CalcError> {
        validate_z0(z0)?;
        let samples = validate_samples(samples)?;
        Ok(Self {
            cosmology,
            z0,
            samples,
        })
    }

    #[must_use]
    pub fn cosmology(&self) -> &CosmologyParameters {
        &self.cosmology
    }

    #[must_use]
    pub fn z0(&self) -> f64 {
        self.z0
    }

    #[must_use]
    pub fn samples(&self) -> usize {
        self.samples
    }
}

/// Public trait for calculators, consumed by orchestration.
pub trait Calculator: Send + Sync {
    /// Produce the results table on a grid of `samples` redshifts.
    fn compute_with(
        &self,
        samples: usize,
        cancel: &CancellationToken,
        observer: &dyn ProgressObserver,
        calc_index: usize,
    ) -> Result<ResultsTable, CalcError>;

    /// Name of the multiplicity model behind this calculator.
    fn name(&self) -> &str;
}

/// Abundance-matching calculator for one cosmology and reference redshift.
pub struct MassFunctionCalculator {
    cosmology: CosmologyParameters,
    z0: f64,
    hmf: HaloMassFunction,
    gsmf: StellarMassFunction,
    bins: Vec<MassBin>,
    log_m_range: (f64, f64),
}

impl MassFunctionCalculator {
    /// Calculator with the default engine configuration.
    pub fn new(cosmology: CosmologyParameters, z0: f64) -> Result<Self, CalcError> {
        Self::with_params(cosmology, z0, &HmfParams::default(), &DefaultModelFactory::new())
    }

    /// Calculator with an explicit engine configuration; the model named by
    /// `params.hmf_model` is resolved through `factory`.
    pub fn with_params(
        cosmology: CosmologyParameters,
        z0: f64,
        params: &HmfParams,
        factory: &dyn ModelFactory,
    ) -> Result<Self, CalcError> {
        let model = factory.get(&params.hmf_model)?;
        Self::with_model(cosmology, z0, params, model)
    }

    /// Calculator using `model` regardless of `params.hmf_model`.
    pub fn with_model(
        cosmology: CosmologyParameters,
        z0: f64,
        params: &HmfParams,
        model: Arc<dyn MultiplicityFunction>,
    ) -> Result<Self, CalcError> {
        validate_z0(z0)?;
        params.validate()?;
        let hmf = HaloMassFunction::new(&cosmology, params, model)?;
        Ok(Self {
            cosmology,
            z0,
            hmf,
            gsmf: StellarMassFunction::new(params.gsmf()?),
            bins: params.bins()?,
            log_m_range: (params.log_m_min, params.log_m_max),
        })
    }

    /// Calculator for the cosmology and z0 of `request`.
    pub fn from_request(
        request: &ComputationRequest,
        params: &HmfParams,
        factory: &dyn ModelFactory,
    ) -> Result<Self, CalcError> {
        Self::with_params(request.cosmology, request.z0, params, factory)
    }

    #[must_use]
    pub fn cosmology(&self) -> &CosmologyParameters {
        &self.cosmology
    }

    #[must_use]
    pub fn z0(&self) -> f64 {
        self.z0
    }

    /// Mass bins covered by every results table.
    #[must_use]
    pub fn bins(&self) -> &[MassBin] {
        &self.bins
    }

    /// Compute without progress reporting or cancellation.
    pub fn compute(&self, samples: usize) -> Result<ResultsTable, CalcError> {
        self.compute_with(samples, &CancellationToken::new(), &NoOpObserver::new(), 0)
    }

    /// Redshifts with `1+z` log-spaced from `1+z0` to 12.
    #[must_use]
    pub fn redshift_grid(&self, samples: usize) -> Vec<f64> {
        logspace((1.0 + self.z0).log10(), ONE_PLUS_Z_MAX.log10(), samples)
            .into_iter()
            .map(|zp1| zp1 - 1.0)
            .collect()
    }

    /// Galaxy number density above each bin threshold at z0 (Mpc^-3).
    #[must_use]
    pub fn galaxy_densities(&self) -> Vec<(MassBin, f64)> {
        let at_z0 = self.gsmf.at(self.z0);
        self.bins
            .iter()
            .map(|&bin| (bin, at_z0.integrate_phi(bin.log_mass())))
            .collect()
    }

    /// log10 stellar mass whose cumulative density equals `nvir`.
    pub fn stellar_mass(gsmf: &GsmfAtRedshift, nvir: f64) -> Result<f64, CalcError> {
        let target = nvir.log10();
        let (lo, hi) = STELLAR_BRACKET;
        bisect(
            |log_ms| {
                let n = gsmf.integrate_phi(log_ms);
                let log_n = if n > 0.0 { n.log10() } else { f64::NEG_INFINITY };
                target - log_n
            },
            lo,
            hi,
            STELLAR_XTOL,
            BISECT_MAX_ITER,
        )
        .map_err(|e| match e {
            CalcError::Numerical(msg) => CalcError::Numerical(format!(
                "no stellar mass matches nvir = {nvir:.3e} at z = {:.3}: {msg}",
                gsmf.z()
            )),
            other => other,
        })
    }
}

impl Calculator for MassFunctionCalculator {
    fn compute_with(
        &self,
        samples: usize,
        cancel: &CancellationToken,
        observer: &dyn ProgressObserver,
        calc_index: usize,
    ) -> Result<ResultsTable, CalcError> {
        if samples == 0 {
            return Err(CalcError::InvalidRequest(
                "samples must be a positive integer, got 0".into(),
            ));
        }
        cancel.check_cancelled()?;
        let start = Instant::now();
        let model = self.hmf.model_name();

        let table0 = self.hmf.at_redshift(self.z0);
        let (lo, hi) = self.log_m_range;
        let anchors = self
            .galaxy_densities()
            .into_iter()
            .map(|(bin, n_gal)| {
                let log_mvir0 = table0.log_mass_at_density(n_gal, lo, hi)?;
                debug!(bin = %bin, n_gal, log_mvir0, "Matched halo mass at z0");
                Ok((bin, n_gal, log_mvir0))
            })
            .collect::<Result<Vec<_>, CalcError>>()?;

        let zs = self.redshift_grid(samples);
        let tracks: Vec<Vec<f64>> = anchors
            .iter()
            .map(|&(_, _, log_mvir0)| {
                median_log10_mvir_progenitors(log_mvir0, self.z0, &zs, &self.cosmology)
            })
            .collect();

        let total = zs.len() as u64;
        let finished = AtomicU64::new(0);
        let rows = zs
            .par_iter()
            .enumerate()
            .map(|(i, &z)| {
                cancel.check_cancelled()?;
                let table = self.hmf.at_redshift(z);
                let gsmf = self.gsmf.at(z);
                let row = tracks
                    .iter()
                    .map(|track| {
                        let nvir = table.nvir_at(track[i])?;
                        Ok((nvir, Self::stellar_mass(&gsmf, nvir)?))
                    })
                    .collect::<Result<Vec<(f64, f64)>, CalcError>>()?;
                let k = finished.fetch_add(1, Ordering::Relaxed) + 1;
                observer.on_progress(&ProgressUpdate::new(calc_index, model, k, total));
                Ok(row)
            })
            .collect::<Result<Vec<_>, CalcError>>()?;
        cancel.check_cancelled()?;

        let mut bins = BTreeMap::new();
        for (b, ((bin, n_gal, log_mvir0), track)) in anchors.into_iter().zip(tracks).enumerate() {
            let nvir = rows.iter().map(|row| row[b].0).collect();
            let log_ms = rows.iter().map(|row| row[b].1).collect();
            bins.insert(
                bin,
                BinSeries::new(zs.clone(), nvir, log_ms, track, n_gal, log_mvir0)?,
            );
        }

        observer.on_progress(&ProgressUpdate::done(calc_index, model));
        info!(
            model,
            samples,
            bins = bins.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Computed results table"
        );
        Ok(ResultsTable::new(model, self.z0, bins))
    }

    fn name(&self) -> &str {
        self.hmf.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observers::ChannelObserver;

    fn planck() -> CosmologyParameters {
        CosmologyParameters::new(0.678, 0.307115, 0.048, 0.96, 0.823, 1.686).unwrap()
    }

    fn calculator() -> MassFunctionCalculator {
        let params = HmfParams {
            dlog10m: 0.05,
            ..HmfParams::default()
        };
        MassFunctionCalculator::with_params(planck(), 0.0, &params, &DefaultModelFactory::new())
            .unwrap()
    }

    #[test]
    fn calc_error_display() {
        assert_eq!(
            CalcError::InvalidRequest("x".into()).to_string(),
            "invalid request: x"
        );
        assert_eq!(CalcError::Cancelled.to_string(), "calculation cancelled");
    }

    #[test]
    fn samples_validation() {
        assert_eq!(validate_samples(1).unwrap(), 1);
        assert!(matches!(validate_samples(0), Err(CalcError::InvalidRequest(_))));
        assert!(matches!(validate_samples(-5), Err(CalcError::InvalidRequest(_))));
    }

    #[test]
    fn request_rejects_bad_inputs() {
        assert!(matches!(
            ComputationRequest::new(planck(), 0.0, -1),
            Err(CalcError::InvalidRequest(_))
        ));
        assert!(matches!(
            ComputationRequest::new(planck(), f64::NAN, 10),
            Err(CalcError::InvalidParameter(_))
        ));
        assert!(matches!(
            ComputationRequest::new(planck(), 11.5, 10),
            Err(CalcError::InvalidParameter(_))
        ));
        let req = ComputationRequest::new(planck(), 0.5, 10).unwrap();
        assert_eq!(req.samples(), 10);
    }

    #[test]
    fn unknown_model_is_config_error() {
        let params = HmfParams {
            hmf_model: "Watson13".into(),
            ..HmfParams::default()
        };
        let r = MassFunctionCalculator::with_params(planck(), 0.0, &params, &DefaultModelFactory::new());
        assert!(matches!(r, Err(CalcError::Config(_))));
    }

    #[test]
    fn redshift_grid_anchored_at_z0() {
        let calc = calculator();
        let zs = calc.redshift_grid(7);
        assert_eq!(zs.len(), 7);
        assert!(zs[0].abs() < 1e-12);
        assert!((zs[6] - 11.0).abs() < 1e-12);
        for w in zs.windows(2) {
            assert!(w[1] > w[0]);
        }
        assert_eq!(calc.redshift_grid(1), vec![0.0]);
    }

    #[test]
    fn compute_covers_every_bin_with_requested_length() {
        let calc = calculator();
        let table = calc.compute(6).unwrap();
        assert_eq!(table.keys(), ["9", "9p5", "10", "10p5", "11", "11p5"]);
        for (_, series) in table.iter() {
            assert_eq!(series.len(), 6);
            assert_eq!(series.nvir().len(), 6);
            assert_eq!(series.log_ms().len(), 6);
            assert_eq!(series.log_mvir().len(), 6);
        }
        assert_eq!(table.model(), "Behroozi");
    }

    #[test]
    fn stellar_mass_at_z0_recovers_threshold() {
        let calc = calculator();
        let table = calc.compute(3).unwrap();
        for (bin, series) in table.iter() {
            assert!(
                (series.log_ms()[0] - bin.log_mass()).abs() < 1e-3,
                "{bin}: {}",
                series.log_ms()[0]
            );
            assert!((series.log_mvir()[0] - series.log_mvir0()).abs() < 1e-9);
        }
    }

    #[test]
    fn stellar_mass_declines_toward_high_redshift() {
        let table = calculator().compute(5).unwrap();
        for (_, series) in table.iter() {
            let m = series.log_ms();
            assert!(m[m.len() - 1] < m[0]);
        }
    }

    #[test]
    fn compute_is_deterministic() {
        let calc = calculator();
        assert_eq!(calc.compute(4).unwrap(), calc.compute(4).unwrap());
    }

    #[test]
    fn single_sample() {
        let table = calculator().compute(1).unwrap();
        assert_eq!(table.samples(), 1);
    }

    #[test]
    fn zero_samples_is_invalid_request() {
        assert!(matches!(
            calculator().compute(0),
            Err(CalcError::InvalidRequest(_))
        ));
    }

    #[test]
    fn cancelled_before_start() {
        let calc = calculator();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let r = calc.compute_with(5, &cancel, &NoOpObserver::new(), 0);
        assert!(matches!(r, Err(CalcError::Cancelled)));
    }

    #[test]
    fn reports_progress_and_completion() {
        let calc = calculator();
        let (tx, rx) = crossbeam_channel::unbounded();
        let observer = ChannelObserver::new(tx);
        calc.compute_with(4, &CancellationToken::new(), &observer, 2)
            .unwrap();
        let updates: Vec<ProgressUpdate> = rx.try_iter().collect();
        assert!(updates.iter().all(|u| u.calc_index == 2));
        assert!(updates.last().unwrap().done);
    }
}
