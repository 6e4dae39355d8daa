//! Linear matter power spectrum and mass variance.
//!
//! `P(k) ∝ k^n T(k)^2`, normalized so that the top-hat variance at
//! 8 Mpc/h equals `sigma_8`. Integrals run over a fixed ln k grid with
//! Simpson's rule.

use std::f64::consts::PI;

use tracing::debug;

use crate::calculator::CalcError;
use crate::cosmology::CosmologyParameters;
use crate::numeric::simpson;
use crate::transfer::Transfer;

/// Uniform ln k integration grid (k in h/Mpc).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LnkGrid {
    pub lnk_min: f64,
    pub lnk_max: f64,
    pub dlnk: f64,
}

impl LnkGrid {
    /// Number of grid points, end point included.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn len(&self) -> usize {
        ((self.lnk_max - self.lnk_min) / self.dlnk).round() as usize + 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grid abscissae.
    #[must_use]
    pub fn points(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| self.lnk_min + self.dlnk * i as f64)
            .collect()
    }
}

/// Fourier transform of the real-space top-hat window.
#[inline]
#[must_use]
pub fn top_hat(x: f64) -> f64 {
    if x < 1e-3 {
        1.0 - x * x / 10.0
    } else {
        3.0 * (x.sin() - x * x.cos()) / (x * x * x)
    }
}

/// Derivative of [`top_hat`] with respect to its argument.
#[inline]
#[must_use]
pub fn top_hat_derivative(x: f64) -> f64 {
    if x < 1e-3 {
        -x / 5.0
    } else {
        3.0 * ((x * x - 3.0) * x.sin() + 3.0 * x * x.cos()) / x.powi(4)
    }
}

/// Normalized linear power spectrum tabulated on a ln k grid.
pub struct LinearPower {
    transfer: Box<dyn Transfer>,
    n_s: f64,
    norm: f64,
    mean_density: f64,
    k: Vec<f64>,
    /// `k^3 P(k)` on the grid, already normalized.
    k3p: Vec<f64>,
    dlnk: f64,
}

impl LinearPower {
    /// Tabulate and normalize the spectrum.
    pub fn new(
        params: &CosmologyParameters,
        transfer: Box<dyn Transfer>,
        grid: LnkGrid,
        mean_density: f64,
    ) -> Result<Self, CalcError> {
        let k: Vec<f64> = grid.points().into_iter().map(f64::exp).collect();
        let n_s = params.n();
        let raw: Vec<f64> = k
            .iter()
            .map(|&kk| {
                let t = transfer.transfer(kk);
                kk.powi(3) * kk.powf(n_s) * t * t
            })
            .collect();

        let mut power = Self {
            transfer,
            n_s,
            norm: 1.0,
            mean_density,
            k,
            k3p: raw,
            dlnk: grid.dlnk,
        };

        let sigma8_raw = power.sigma_r(8.0);
        if !sigma8_raw.is_finite() || sigma8_raw <= 0.0 {
            return Err(CalcError::Numerical(format!(
                "unnormalized sigma(8 Mpc/h) is not positive: {sigma8_raw}"
            )));
        }
        let norm = (params.sigma_8() / sigma8_raw).powi(2);
        for v in &mut power.k3p {
            *v *= norm;
        }
        power.norm = norm;
        debug!(norm, points = power.k.len(), "Normalized linear power spectrum");
        Ok(power)
    }

    /// `P(k)` at z = 0 in (Mpc/h)^3.
    #[must_use]
    pub fn power(&self, k: f64) -> f64 {
        let t = self.transfer.transfer(k);
        self.norm * k.powf(self.n_s) * t * t
    }

    /// Lagrangian radius in Mpc/h enclosing mass `m` (Msun/h).
    #[must_use]
    pub fn radius(&self, m: f64) -> f64 {
        (3.0 * m / (4.0 * PI * self.mean_density)).cbrt()
    }

    /// Top-hat mass variance `sigma(R)` at z = 0.
    #[must_use]
    pub fn sigma_r(&self, r: f64) -> f64 {
        let integrand: Vec<f64> = self
            .k
            .iter()
            .zip(&self.k3p)
            .map(|(&k, &k3p)| {
                let w = top_hat(k * r);
                k3p * w * w
            })
            .collect();
        (simpson(&integrand, self.dlnk) / (2.0 * PI * PI)).sqrt()
    }

    /// `sigma(M)` at z = 0.
    #[must_use]
    pub fn sigma_m(&self, m: f64) -> f64 {
        self.sigma_r(self.radius(m))
    }

    /// `d ln sigma / d ln M`, negative for a decreasing variance.
    #[must_use]
    pub fn dlnsdlnm(&self, m: f64) -> f64 {
        let r = self.radius(m);
        let sigma2 = self.sigma_r(r).powi(2);
        let integrand: Vec<f64> = self
            .k
            .iter()
            .zip(&self.k3p)
            .map(|(&k, &k3p)| {
                let x = k * r;
                k3p * k * top_hat(x) * top_hat_derivative(x)
            })
            .collect();
        let dsigma2_dr = simpson(&integrand, self.dlnk) / (PI * PI);
        r * dsigma2_dr / (6.0 * sigma2)
    }
}
