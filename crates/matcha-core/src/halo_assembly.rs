//! Empirical halo assembly: progenitor mass tracks and subhalo abundance.

use crate::constants::{H_REFERENCE, LOG_M13};
use crate::cosmology::{omega_l, omega_m, CosmologyParameters};

/// Calibrated coefficients of the median progenitor track.
const PROGENITOR_FIT: [f64; 8] = [
    0.0, 1.52947, -3.4087, -0.404274, 0.285509, 11.9943, 0.143375, 4.07574,
];

fn g_factor(om: f64, ol: f64, z: f64) -> f64 {
    let amplitude = om / (1.0 + z);
    amplitude / (om.powf(4.0 / 7.0) - ol + (1.0 + 0.5 * om) * (1.0 + ol / 70.0))
}

/// Growth ratio `D(z)/D(0)` from the Carroll, Press & Turner fit.
#[must_use]
pub fn growth_ratio(params: &CosmologyParameters, z: f64) -> f64 {
    let om0 = params.o_m0();
    let ol0 = params.o_l0();
    g_factor(omega_m(om0, ol0, z), omega_l(om0, ol0, z), z) / g_factor(om0, ol0, 0.0)
}

fn f_norm(dw: f64) -> f64 {
    let x = &PROGENITOR_FIT;
    (1.0 + dw).powf(x[1]) * (1.0 + 0.5 * dw).powf(x[2]) * (x[3] * dw).exp()
}

fn g_func(log_mvir0: f64, dw: f64) -> f64 {
    let x = &PROGENITOR_FIT;
    let a0 = x[4] - (10f64.powf(x[6] * (x[5] - log_mvir0)) + 1.0).log10();
    let sc = 1.0 / (1.0 + dw);
    1.0 + (-x[7] * (sc - a0)).exp()
}

/// Median `log10 Mvir` of the main progenitor at each redshift in `zs`
/// for a halo of `log10 Mvir = log_mh0` at `z0`.
///
/// The fit is calibrated at `h = 0.678`; masses are rescaled around it.
#[must_use]
pub fn median_log10_mvir_progenitors(
    log_mh0: f64,
    z0: f64,
    zs: &[f64],
    params: &CosmologyParameters,
) -> Vec<f64> {
    let h_shift = (params.h_0() / H_REFERENCE).log10();
    let log_m0 = log_mh0 + h_shift;
    let delta_c = params.delta_c();
    let barrier_z0 = delta_c / growth_ratio(params, z0);

    zs.iter()
        .map(|&z| {
            let dw = delta_c / growth_ratio(params, z) - barrier_z0;
            let first = f_norm(dw).log10();
            let second = (log_m0 - LOG_M13) * g_func(log_m0, 0.0) / g_func(log_m0, dw);
            LOG_M13 + first + second - h_shift
        })
        .collect()
}

/// Fraction of subhalos relative to distinct halos above `log_mpeak`.
#[must_use]
pub fn subhalo_correction(log_mpeak: f64, z: f64, h: f64) -> f64 {
    let log_mpeak_h = log_mpeak + h.log10();
    let z2 = z * z;
    let log_ratio = 0.008670 * z - 0.011330 * z2 - 0.003892 * z2 * z + 0.000370 * z2 * z2;
    let normalization = 1.78 * 10f64.powf(log_ratio);
    let log_m_cut = 11.904572 - 0.636422 * z - 0.020686 * z2 + 0.022034 * z * z2
        - 0.001151 * z2 * z2;
    normalization * (-(10f64.powf(0.220586 * (log_mpeak_h - log_m_cut)))).exp()
}

/// Cumulative density of distinct halos plus subhalos.
#[must_use]
pub fn total_cumulative_halo_function(log_mpeak: f64, n_vir: f64, z: f64, h: f64) -> f64 {
    n_vir * (1.0 + subhalo_correction(log_mpeak, z, h))
}
