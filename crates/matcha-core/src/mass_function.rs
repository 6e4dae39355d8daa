//! Halo mass function engine.
//!
//! `sigma(M)` and `d ln sigma / d ln M` are tabulated once at z = 0 on a
//! fixed log-mass grid. Per-redshift tables rescale `sigma` by the growth
//! factor, apply the multiplicity function, and integrate the cumulative
//! abundance down from the top of the grid.

use std::f64::consts::LN_10;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::debug;

use crate::calculator::CalcError;
use crate::constants::{TABLE_LOG_M_MAX, TABLE_LOG_M_MIN};
use crate::cosmology::{Background, CosmologyParameters};
use crate::fitting::{FitContext, MultiplicityFunction};
use crate::halo_assembly::total_cumulative_halo_function;
use crate::mass_definition::MassDefinition;
use crate::numeric::{cumulative_from_top, interp_linear};
use crate::params::HmfParams;
use crate::power::LinearPower;
use crate::transfer;

/// Redshift-independent variance table.
struct SigmaTable {
    log10_m: Arc<[f64]>,
    sigma0: Vec<f64>,
    dlnsdlnm: Vec<f64>,
}

impl SigmaTable {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn build(power: &LinearPower, dlog10m: f64) -> Self {
        let n = ((TABLE_LOG_M_MAX - TABLE_LOG_M_MIN) / dlog10m).round() as usize + 1;
        let log10_m: Vec<f64> = (0..n)
            .map(|i| TABLE_LOG_M_MIN + dlog10m * i as f64)
            .collect();

        let (sigma0, dlnsdlnm): (Vec<f64>, Vec<f64>) = log10_m
            .par_iter()
            .map(|&lm| {
                let m = 10f64.powf(lm);
                (power.sigma_m(m), power.dlnsdlnm(m))
            })
            .unzip();

        Self {
            log10_m: log10_m.into(),
            sigma0,
            dlnsdlnm,
        }
    }
}

/// Mass function engine for one cosmology and model choice.
pub struct HaloMassFunction {
    params: CosmologyParameters,
    background: Background,
    model: Arc<dyn MultiplicityFunction>,
    mdef: MassDefinition,
    dlog10m: f64,
    table: SigmaTable,
}

impl HaloMassFunction {
    /// Build the engine. `hmf` must already be validated.
    pub fn new(
        params: &CosmologyParameters,
        hmf: &HmfParams,
        model: Arc<dyn MultiplicityFunction>,
    ) -> Result<Self, CalcError> {
        let start = Instant::now();
        let background = Background::new(*params);
        let transfer = transfer::build(hmf.transfer()?, params, hmf.t_cmb0);
        let power = LinearPower::new(params, transfer, hmf.lnk_grid(), background.mean_density0())?;
        let table = SigmaTable::build(&power, hmf.dlog10m);

        debug!(
            model = model.name(),
            masses = table.log10_m.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Tabulated sigma(M)"
        );

        Ok(Self {
            params: *params,
            background,
            model,
            mdef: hmf.mass_definition()?,
            dlog10m: hmf.dlog10m,
            table,
        })
    }

    #[must_use]
    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    #[must_use]
    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Evaluate the mass function at redshift `z`.
    #[must_use]
    pub fn at_redshift(&self, z: f64) -> MassFunctionTable {
        let growth = self.background.growth_factor(z);
        let ctx = FitContext {
            z,
            delta_halo: self.mdef.delta_mean(&self.background, z),
            delta_c: self.params.delta_c(),
        };
        let rho = self.background.mean_density0();

        let dndlnm: Vec<f64> = self
            .table
            .log10_m
            .iter()
            .zip(&self.table.sigma0)
            .zip(&self.table.dlnsdlnm)
            .map(|((&lm, &s0), &slope)| {
                let f = self.model.fsigma(s0 * growth, &ctx);
                f * rho / 10f64.powf(lm) * slope.abs()
            })
            .collect();

        let ngtm: Vec<f64> = cumulative_from_top(&dndlnm, self.dlog10m * LN_10)
            .into_iter()
            .zip(self.table.log10_m.iter())
            .map(|(n, &lm)| self.model.correct_cumulative(10f64.powf(lm), z, n))
            .collect();

        let h = self.params.h_0();
        let nvir: Vec<f64> = ngtm
            .iter()
            .zip(self.table.log10_m.iter())
            .map(|(&n, &lm)| total_cumulative_halo_function(lm, n, z, h))
            .collect();
        let log_nvir = nvir.iter().map(|n| n.log10()).collect();

        MassFunctionTable {
            z,
            log10_m: Arc::clone(&self.table.log10_m),
            dndlnm,
            ngtm,
            nvir,
            log_nvir,
        }
    }
}

/// Mass function evaluated at one redshift.
#[derive(Debug, Clone)]
pub struct MassFunctionTable {
    z: f64,
    log10_m: Arc<[f64]>,
    dndlnm: Vec<f64>,
    ngtm: Vec<f64>,
    nvir: Vec<f64>,
    log_nvir: Vec<f64>,
}

impl MassFunctionTable {
    #[must_use]
    pub fn z(&self) -> f64 {
        self.z
    }

    /// log10 halo mass grid (Msun/h).
    #[must_use]
    pub fn log10_m(&self) -> &[f64] {
        &self.log10_m
    }

    /// `dn/dlnM` in (h/Mpc)^3.
    #[must_use]
    pub fn dndlnm(&self) -> &[f64] {
        &self.dndlnm
    }

    /// Cumulative abundance of distinct halos `n(>M)`.
    #[must_use]
    pub fn ngtm(&self) -> &[f64] {
        &self.ngtm
    }

    /// Cumulative abundance including subhalos.
    #[must_use]
    pub fn nvir(&self) -> &[f64] {
        &self.nvir
    }

    /// `nvir` at `log_m`, interpolated linearly in log-log space.
    pub fn nvir_at(&self, log_m: f64) -> Result<f64, CalcError> {
        let log_n = interp_linear(&self.log10_m, &self.log_nvir, log_m).ok_or_else(|| {
            CalcError::Numerical(format!(
                "halo mass 10^{log_m:.3} outside the mass table [10^{TABLE_LOG_M_MIN}, 10^{TABLE_LOG_M_MAX}] at z = {:.3}",
                self.z
            ))
        })?;
        if !log_n.is_finite() {
            return Err(CalcError::Numerical(format!(
                "halo abundance vanishes at 10^{log_m:.3} (z = {:.3})",
                self.z
            )));
        }
        Ok(10f64.powf(log_n))
    }

    /// Halo mass whose cumulative abundance `nvir` equals `n`, searched
    /// between `10^log_m_lo` and `10^log_m_hi`.
    pub fn log_mass_at_density(
        &self,
        n: f64,
        log_m_lo: f64,
        log_m_hi: f64,
    ) -> Result<f64, CalcError> {
        const EDGE: f64 = 1e-9;
        let start = self.log10_m.partition_point(|&lm| lm < log_m_lo - EDGE);
        let end = self.log10_m.partition_point(|&lm| lm <= log_m_hi + EDGE);
        if end <= start + 1 {
            return Err(CalcError::Numerical(format!(
                "mass range [{log_m_lo}, {log_m_hi}] holds fewer than two table points"
            )));
        }
        if !(n.is_finite() && n > 0.0) {
            return Err(CalcError::Numerical(format!(
                "cannot match a non-positive number density {n:e}"
            )));
        }

        interp_linear(&self.log_nvir[start..end], &self.log10_m[start..end], n.log10()).ok_or_else(
            || {
                CalcError::Numerical(format!(
                    "number density {n:.3e} outside the range of halos between 10^{log_m_lo} and 10^{log_m_hi} at z = {:.3}",
                    self.z
                ))
            },
        )
    }
}
