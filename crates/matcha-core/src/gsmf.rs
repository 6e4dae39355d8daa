//! Galaxy stellar mass function.
//!
//! The total function is the sum of two star-forming and three quiescent
//! generalized Schechter components whose parameters evolve with redshift
//! through [`z_func`]. Number densities are in Mpc^-3 dex^-1.

use std::f64::consts::LOG10_E;
use std::fmt;
use std::str::FromStr;

use crate::calculator::CalcError;
use crate::constants::GSMF_LOG_M_UPPER;
use crate::cosmology::scale_factor;
use crate::numeric::gauss_legendre;

/// Gauss-Legendre panels per dex of the stellar-mass integral.
const PANELS_PER_DEX: f64 = 1.0;

const OBSERVED_SMF: [f64; 23] = [
    0.0, -2.97903, 0.711457, 2.13684, -0.143942, -1.43664, -0.182969, -0.0652577, 0.924276,
    10.3495, -0.852267, -3.43822, -0.294256, -0.687046, -2.64856, -0.22453, -2.01024, -0.9555,
    0.469221, -1.03017, 0.386681, -0.782124, -0.292956,
];

const TRUE_SMF: [f64; 23] = [
    0.0, -3.12587, 1.0149, 2.96305, 0.0322943, -1.5068, -0.0962951, -0.0678136, 0.984965,
    10.4309, -0.936285, -3.60355, -0.439795, -0.789231, -2.6914, -0.0222751, -1.59791,
    -0.877709, 0.431888, -0.762424, 0.531231, -0.748871, -0.326509,
];

const INTRINSIC_SMF: [f64; 23] = [
    0.0, -3.13858, 0.776621, 2.46962, 0.0151814, -1.50836, -0.0840718, -0.0680439, 1.01977,
    10.4759, -0.936793, -3.48557, -0.447515, -0.861007, -2.65967, -0.0227114, -1.49839,
    -0.849498, 0.351052, -0.582103, 0.502357, -0.876961, -0.352607,
];

/// Calibrated parameter set of the stellar mass function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GsmfMode {
    /// As observed, including measurement scatter.
    Observed,
    /// Corrected for random errors in stellar-mass estimates.
    True,
    /// Additionally deconvolved from the halo-to-stellar scatter.
    #[default]
    Intrinsic,
}

impl GsmfMode {
    pub const NAMES: [&'static str; 3] = ["observed_smf", "true_smf", "intrinsic_smf"];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Observed => "observed_smf",
            Self::True => "true_smf",
            Self::Intrinsic => "intrinsic_smf",
        }
    }

    fn params(self) -> &'static [f64; 23] {
        match self {
            Self::Observed => &OBSERVED_SMF,
            Self::True => &TRUE_SMF,
            Self::Intrinsic => &INTRINSIC_SMF,
        }
    }
}

impl fmt::Display for GsmfMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GsmfMode {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "observed_smf" => Ok(Self::Observed),
            "true_smf" => Ok(Self::True),
            "intrinsic_smf" | "deconvolved_including_halo_dispersion" => Ok(Self::Intrinsic),
            other => Err(CalcError::Config(format!(
                "unknown GSMF mode '{other}' (expected one of {})",
                Self::NAMES.join(", ")
            ))),
        }
    }
}

/// Redshift evolution `p0 + p1 (1 - a) + p2 log10(a) + p3 z`.
#[must_use]
pub fn z_func(p0: f64, p1: f64, p2: f64, p3: f64, z: f64) -> f64 {
    let a = scale_factor(z);
    p0 + p1 * (1.0 - a) + p2 * a.log10() + p3 * z
}

/// One generalized Schechter component, parameters in log10 form.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Component {
    log_phi: f64,
    alpha: f64,
    beta: f64,
    log_m_char: f64,
}

impl Component {
    fn eval(&self, log_ms: f64) -> f64 {
        let x = log_ms - self.log_m_char;
        let log_phi = self.log_phi + (self.alpha + 1.0) * x
            - 10f64.powf(self.beta * x) * LOG10_E
            - LOG10_E.log10();
        10f64.powf(log_phi)
    }
}

/// The five components evaluated at one redshift.
#[derive(Debug, Clone, PartialEq)]
pub struct GsmfAtRedshift {
    z: f64,
    components: [Component; 5],
}

impl GsmfAtRedshift {
    #[must_use]
    pub fn z(&self) -> f64 {
        self.z
    }

    /// `phi(log_ms)` in Mpc^-3 dex^-1.
    #[must_use]
    pub fn phi(&self, log_ms: f64) -> f64 {
        self.components.iter().map(|c| c.eval(log_ms)).sum()
    }

    /// Cumulative density above `log_m_i`, `∫_{log_m_i}^{13} phi`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn integrate_phi(&self, log_m_i: f64) -> f64 {
        let span = (GSMF_LOG_M_UPPER - log_m_i).abs();
        let panels = ((span * PANELS_PER_DEX).ceil() as usize).max(1);
        gauss_legendre(|m| self.phi(m), log_m_i, GSMF_LOG_M_UPPER, panels)
    }
}

/// Stellar mass function for a chosen calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StellarMassFunction {
    mode: GsmfMode,
}

impl StellarMassFunction {
    #[must_use]
    pub fn new(mode: GsmfMode) -> Self {
        Self { mode }
    }

    #[must_use]
    pub fn mode(&self) -> GsmfMode {
        self.mode
    }

    /// Freeze the component parameters at redshift `z`.
    #[must_use]
    pub fn at(&self, z: f64) -> GsmfAtRedshift {
        let x = self.mode.params();
        let a = scale_factor(z);

        let log_phi_sf = z_func(x[1], x[2], x[3], x[4], z);
        let alpha_sf = z_func(x[5], x[6], 0.0, x[7], z);
        let beta_sf = z_func(x[8], 0.0, 0.0, 0.0, z);
        let m_char_sf = z_func(x[9], x[10], x[11], x[12], z);

        let log_phi_q2 = z_func(x[14], x[15], x[16], x[17], z);
        let log_phi_q1 = log_phi_q2 + z_func(x[13], -2.0, 0.0, 0.0, z);
        let alpha_q2 = alpha_sf + 2.0 - a;
        let m_char_q2 = m_char_sf + z_func(x[18], x[19], 0.0, 0.0, z);

        let components = [
            Component {
                log_phi: log_phi_sf,
                alpha: alpha_sf,
                beta: beta_sf,
                log_m_char: m_char_sf,
            },
            Component {
                log_phi: log_phi_sf + x[20],
                alpha: alpha_sf + 1.0,
                beta: beta_sf,
                log_m_char: m_char_sf,
            },
            Component {
                log_phi: log_phi_q1,
                alpha: alpha_sf,
                beta: beta_sf,
                log_m_char: m_char_sf,
            },
            Component {
                log_phi: log_phi_q2,
                alpha: alpha_q2,
                beta: beta_sf,
                log_m_char: m_char_q2,
            },
            Component {
                log_phi: log_phi_q2 + x[21],
                alpha: alpha_q2,
                beta: beta_sf + x[22],
                log_m_char: m_char_q2,
            },
        ];

        GsmfAtRedshift { z, components }
    }

    /// `phi(log_ms, z)` in Mpc^-3 dex^-1.
    #[must_use]
    pub fn phi(&self, log_ms: f64, z: f64) -> f64 {
        self.at(z).phi(log_ms)
    }

    /// `∫_{log_m_i}^{13} phi(m, z) dm` in Mpc^-3.
    #[must_use]
    pub fn integrate_phi(&self, log_m_i: f64, z: f64) -> f64 {
        self.at(z).integrate_phi(log_m_i)
    }
}
