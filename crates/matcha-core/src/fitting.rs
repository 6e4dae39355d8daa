//! Halo multiplicity functions `f(sigma)`.
//!
//! Each model maps the mass variance to the fraction of mass in halos per
//! unit `ln(1/sigma)`. The mass function engine turns this into
//! `dn/dlnM`.

use std::f64::consts::PI;

use crate::constants::TINKER_MAX_Z;
use crate::cosmology::scale_factor;

/// Per-redshift inputs shared by every multiplicity function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitContext {
    /// Redshift.
    pub z: f64,
    /// Halo overdensity relative to the mean matter density.
    pub delta_halo: f64,
    /// Critical linear overdensity for collapse.
    pub delta_c: f64,
}

/// A multiplicity function of the halo mass function.
pub trait MultiplicityFunction: Send + Sync {
    /// `f(sigma)` at the given context.
    fn fsigma(&self, sigma: f64, ctx: &FitContext) -> f64;

    /// Correction applied to the cumulative number density `n(>m)`.
    ///
    /// `m` is in Msun/h. The default leaves the density unchanged.
    fn correct_cumulative(&self, _m: f64, _z: f64, ngtm: f64) -> f64 {
        ngtm
    }

    /// Name of this model.
    fn name(&self) -> &'static str;
}

/// Press & Schechter (1974).
#[derive(Debug, Clone, Copy, Default)]
pub struct PressSchechter;

impl MultiplicityFunction for PressSchechter {
    fn fsigma(&self, sigma: f64, ctx: &FitContext) -> f64 {
        let nu = ctx.delta_c / sigma;
        (2.0 / PI).sqrt() * nu * (-0.5 * nu * nu).exp()
    }

    fn name(&self) -> &'static str {
        "PS"
    }
}

/// Sheth, Mo & Tormen (2001).
#[derive(Debug, Clone, Copy)]
pub struct ShethTormen {
    pub a_norm: f64,
    pub a: f64,
    pub p: f64,
}

impl Default for ShethTormen {
    fn default() -> Self {
        Self {
            a_norm: 0.3222,
            a: 0.707,
            p: 0.3,
        }
    }
}

impl MultiplicityFunction for ShethTormen {
    fn fsigma(&self, sigma: f64, ctx: &FitContext) -> f64 {
        let nu = ctx.delta_c / sigma;
        let anu2 = self.a * nu * nu;
        self.a_norm
            * (2.0 * self.a / PI).sqrt()
            * nu
            * (1.0 + anu2.powf(-self.p))
            * (-0.5 * anu2).exp()
    }

    fn name(&self) -> &'static str {
        "ST"
    }
}

const TINKER_DELTA: [f64; 9] = [200.0, 300.0, 400.0, 600.0, 800.0, 1200.0, 1600.0, 2400.0, 3200.0];
const TINKER_A: [f64; 9] = [0.186, 0.200, 0.212, 0.218, 0.248, 0.255, 0.260, 0.260, 0.260];
const TINKER_LOWER_A: [f64; 9] = [1.47, 1.52, 1.56, 1.61, 1.87, 2.13, 2.30, 2.53, 2.66];
const TINKER_B: [f64; 9] = [2.57, 2.25, 2.05, 1.87, 1.59, 1.51, 1.46, 1.44, 1.41];
const TINKER_C: [f64; 9] = [1.19, 1.27, 1.34, 1.45, 1.58, 1.80, 1.97, 2.24, 2.44];

/// Fit parameters of the Tinker et al. (2008) function at one overdensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TinkerParams {
    pub big_a: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// Tinker et al. (2008).
#[derive(Debug, Clone, Copy, Default)]
pub struct Tinker08;

impl Tinker08 {
    /// Parameters at z = 0, interpolated linearly in `log10(delta)`.
    ///
    /// Overdensities outside the calibrated range are clamped to its ends.
    #[must_use]
    pub fn params_at(delta_halo: f64) -> TinkerParams {
        let lo = TINKER_DELTA[0];
        let hi = TINKER_DELTA[TINKER_DELTA.len() - 1];
        let ld = delta_halo.clamp(lo, hi).log10();

        let idx = TINKER_DELTA
            .iter()
            .position(|&d| d.log10() >= ld)
            .unwrap_or(TINKER_DELTA.len() - 1)
            .max(1);
        let x0 = TINKER_DELTA[idx - 1].log10();
        let x1 = TINKER_DELTA[idx].log10();
        let t = ((ld - x0) / (x1 - x0)).clamp(0.0, 1.0);
        let lerp = |table: &[f64; 9]| table[idx - 1] + t * (table[idx] - table[idx - 1]);

        TinkerParams {
            big_a: lerp(&TINKER_A),
            a: lerp(&TINKER_LOWER_A),
            b: lerp(&TINKER_B),
            c: lerp(&TINKER_C),
        }
    }

    /// Parameters evolved to redshift `z` (capped at [`TINKER_MAX_Z`]).
    #[must_use]
    pub fn evolved_params(delta_halo: f64, z: f64) -> TinkerParams {
        let p = Self::params_at(delta_halo);
        let zp1 = 1.0 + z.clamp(0.0, TINKER_MAX_Z);
        let delta = delta_halo.clamp(TINKER_DELTA[0], TINKER_DELTA[TINKER_DELTA.len() - 1]);
        let alpha = 10f64.powf(-(0.75 / (delta / 75.0).log10()).powf(1.2));
        TinkerParams {
            big_a: p.big_a * zp1.powf(-0.14),
            a: p.a * zp1.powf(-0.06),
            b: p.b * zp1.powf(-alpha),
            c: p.c,
        }
    }
}

impl MultiplicityFunction for Tinker08 {
    fn fsigma(&self, sigma: f64, ctx: &FitContext) -> f64 {
        let p = Self::evolved_params(ctx.delta_halo, ctx.z);
        p.big_a * ((sigma / p.b).powf(-p.a) + 1.0) * (-p.c / (sigma * sigma)).exp()
    }

    fn name(&self) -> &'static str {
        "Tinker08"
    }
}

/// Behroozi et al. (2013): Tinker08 with a high-redshift correction of
/// the cumulative abundance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Behroozi {
    inner: Tinker08,
}

impl Behroozi {
    /// `log10` of the abundance correction at mass `m` (Msun/h).
    #[must_use]
    pub fn theta(m: f64, z: f64) -> f64 {
        let a = scale_factor(z);
        0.144 / (1.0 + (14.79 * (a - 0.213)).exp())
            * (m / 10f64.powf(11.5)).powf(0.5 / (1.0 + (6.5 * a).exp()))
    }
}

impl MultiplicityFunction for Behroozi {
    fn fsigma(&self, sigma: f64, ctx: &FitContext) -> f64 {
        self.inner.fsigma(sigma, ctx)
    }

    fn correct_cumulative(&self, m: f64, z: f64, ngtm: f64) -> f64 {
        ngtm * 10f64.powf(Self::theta(m, z))
    }

    fn name(&self) -> &'static str {
        "Behroozi"
    }
}
