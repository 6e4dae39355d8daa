//! Matter transfer functions.
//!
//! Wavenumbers are in h/Mpc throughout. The Eisenstein & Hu (1998) fits
//! work internally in 1/Mpc.

use std::f64::consts::E;
use std::fmt;
use std::str::FromStr;

use crate::calculator::CalcError;
use crate::cosmology::CosmologyParameters;

/// Selectable transfer-function fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferModel {
    /// Eisenstein & Hu (1998) with baryon acoustic oscillations.
    #[default]
    EisensteinHu,
    /// Eisenstein & Hu (1998) zero-baryon-oscillation shape.
    EisensteinHuNoBao,
    /// Bardeen et al. (1986) with the Sugiyama (1995) shape parameter.
    Bbks,
}

impl TransferModel {
    /// Canonical configuration names.
    pub const NAMES: [&'static str; 3] = ["EH", "EH_NoBAO", "BBKS"];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::EisensteinHu => "EH",
            Self::EisensteinHuNoBao => "EH_NoBAO",
            Self::Bbks => "BBKS",
        }
    }
}

impl fmt::Display for TransferModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransferModel {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EH" | "EH_BAO" => Ok(Self::EisensteinHu),
            "EH_NoBAO" => Ok(Self::EisensteinHuNoBao),
            "BBKS" => Ok(Self::Bbks),
            other => Err(CalcError::Config(format!(
                "unknown transfer model '{other}' (expected one of {})",
                Self::NAMES.join(", ")
            ))),
        }
    }
}

/// A transfer function ready to evaluate at any wavenumber.
pub trait Transfer: Send + Sync {
    /// `T(k)` with `k` in h/Mpc, normalized to 1 on large scales.
    fn transfer(&self, k: f64) -> f64;
}

/// Build the transfer function for `model`.
#[must_use]
pub fn build(
    model: TransferModel,
    params: &CosmologyParameters,
    t_cmb0: f64,
) -> Box<dyn Transfer> {
    match model {
        TransferModel::EisensteinHu => Box::new(EisensteinHu::new(params, t_cmb0)),
        TransferModel::EisensteinHuNoBao => Box::new(EisensteinHuNoBao::new(params, t_cmb0)),
        TransferModel::Bbks => Box::new(Bbks::new(params)),
    }
}

/// Full Eisenstein & Hu fit including the baryon wiggles.
#[derive(Debug, Clone)]
pub struct EisensteinHu {
    h: f64,
    f_b: f64,
    f_c: f64,
    k_eq: f64,
    sound_horizon: f64,
    k_silk: f64,
    alpha_c: f64,
    beta_c: f64,
    alpha_b: f64,
    beta_b: f64,
    beta_node: f64,
}

impl EisensteinHu {
    #[must_use]
    pub fn new(params: &CosmologyParameters, t_cmb0: f64) -> Self {
        let h = params.h_0();
        let omh2 = params.o_m0() * h * h;
        let obh2 = params.o_b0() * h * h;
        let f_b = obh2 / omh2;
        let f_c = 1.0 - f_b;
        let theta = t_cmb0 / 2.7;

        let z_eq = 2.50e4 * omh2 * theta.powi(-4);
        let k_eq = 7.46e-2 * omh2 * theta.powi(-2);

        let b1 = 0.313 * omh2.powf(-0.419) * (1.0 + 0.607 * omh2.powf(0.674));
        let b2 = 0.238 * omh2.powf(0.223);
        let z_d =
            1291.0 * omh2.powf(0.251) / (1.0 + 0.659 * omh2.powf(0.828)) * (1.0 + b1 * obh2.powf(b2));

        let baryon_ratio = |z: f64| 31.5 * obh2 * theta.powi(-4) * (1000.0 / z);
        let r_eq = baryon_ratio(z_eq);
        let r_d = baryon_ratio(z_d);

        let sound_horizon = 2.0 / (3.0 * k_eq)
            * (6.0 / r_eq).sqrt()
            * (((1.0 + r_d).sqrt() + (r_d + r_eq).sqrt()) / (1.0 + r_eq.sqrt())).ln();

        let k_silk = 1.6 * obh2.powf(0.52) * omh2.powf(0.73) * (1.0 + (10.4 * omh2).powf(-0.95));

        let a1 = (46.9 * omh2).powf(0.670) * (1.0 + (32.1 * omh2).powf(-0.532));
        let a2 = (12.0 * omh2).powf(0.424) * (1.0 + (45.0 * omh2).powf(-0.582));
        let alpha_c = a1.powf(-f_b) * a2.powf(-f_b.powi(3));

        let bb1 = 0.944 / (1.0 + (458.0 * omh2).powf(-0.708));
        let bb2 = (0.395 * omh2).powf(-0.0266);
        let beta_c = 1.0 / (1.0 + bb1 * (f_c.powf(bb2) - 1.0));

        let y = (1.0 + z_eq) / (1.0 + z_d);
        let sy = (1.0 + y).sqrt();
        let g_y = y * (-6.0 * sy + (2.0 + 3.0 * y) * ((sy + 1.0) / (sy - 1.0)).ln());
        let alpha_b = 2.07 * k_eq * sound_horizon * (1.0 + r_d).powf(-0.75) * g_y;

        let beta_node = 8.41 * omh2.powf(0.435);
        let beta_b = 0.5 + f_b + (3.0 - 2.0 * f_b) * ((17.2 * omh2).powi(2) + 1.0).sqrt();

        Self {
            h,
            f_b,
            f_c,
            k_eq,
            sound_horizon,
            k_silk,
            alpha_c,
            beta_c,
            alpha_b,
            beta_b,
            beta_node,
        }
    }

    /// Sound horizon at the drag epoch in Mpc.
    #[must_use]
    pub fn sound_horizon(&self) -> f64 {
        self.sound_horizon
    }

    fn t0_tilde(&self, k: f64, alpha: f64, beta: f64) -> f64 {
        let q = k / (13.41 * self.k_eq);
        let l = (E + 1.8 * beta * q).ln();
        let c = 14.2 / alpha + 386.0 / (1.0 + 69.9 * q.powf(1.08));
        l / (l + c * q * q)
    }
}

impl Transfer for EisensteinHu {
    fn transfer(&self, k_h: f64) -> f64 {
        let k = k_h * self.h;
        let ks = k * self.sound_horizon;

        let f = 1.0 / (1.0 + (ks / 5.4).powi(4));
        let t_c = f * self.t0_tilde(k, 1.0, self.beta_c)
            + (1.0 - f) * self.t0_tilde(k, self.alpha_c, self.beta_c);

        let s_tilde = self.sound_horizon / (1.0 + (self.beta_node / ks).powi(3)).cbrt();
        let x = k * s_tilde;
        let j0 = if x.abs() < 1e-6 { 1.0 - x * x / 6.0 } else { x.sin() / x };
        let t_b = (self.t0_tilde(k, 1.0, 1.0) / (1.0 + (ks / 5.2).powi(2))
            + self.alpha_b / (1.0 + (self.beta_b / ks).powi(3))
                * (-(k / self.k_silk).powf(1.4)).exp())
            * j0;

        self.f_b * t_b + self.f_c * t_c
    }
}

/// Eisenstein & Hu shape without acoustic oscillations.
#[derive(Debug, Clone)]
pub struct EisensteinHuNoBao {
    h: f64,
    om_h: f64,
    theta2: f64,
    sound_horizon: f64,
    alpha_gamma: f64,
}

impl EisensteinHuNoBao {
    #[must_use]
    pub fn new(params: &CosmologyParameters, t_cmb0: f64) -> Self {
        let h = params.h_0();
        let omh2 = params.o_m0() * h * h;
        let obh2 = params.o_b0() * h * h;
        let f_b = obh2 / omh2;
        let theta = t_cmb0 / 2.7;

        let sound_horizon = 44.5 * (9.83 / omh2).ln() / (1.0 + 10.0 * obh2.powf(0.75)).sqrt();
        let alpha_gamma =
            1.0 - 0.328 * (431.0 * omh2).ln() * f_b + 0.38 * (22.3 * omh2).ln() * f_b * f_b;

        Self {
            h,
            om_h: params.o_m0() * h,
            theta2: theta * theta,
            sound_horizon,
            alpha_gamma,
        }
    }
}

impl Transfer for EisensteinHuNoBao {
    fn transfer(&self, k_h: f64) -> f64 {
        let k = k_h * self.h;
        let gamma_eff = self.om_h
            * (self.alpha_gamma
                + (1.0 - self.alpha_gamma) / (1.0 + (0.43 * k * self.sound_horizon).powi(4)));
        let q = k_h * self.theta2 / gamma_eff;
        let l0 = (2.0 * E + 1.8 * q).ln();
        let c0 = 14.2 + 731.0 / (1.0 + 62.5 * q);
        l0 / (l0 + c0 * q * q)
    }
}

/// BBKS fit.
#[derive(Debug, Clone)]
pub struct Bbks {
    gamma: f64,
}

impl Bbks {
    #[must_use]
    pub fn new(params: &CosmologyParameters) -> Self {
        let h = params.h_0();
        let om = params.o_m0();
        let ob = params.o_b0();
        let gamma = om * h * (-ob - (2.0 * h).sqrt() * ob / om).exp();
        Self { gamma }
    }
}

impl Transfer for Bbks {
    fn transfer(&self, k_h: f64) -> f64 {
        let q = k_h / self.gamma;
        let x = 2.34 * q;
        let lead = if x < 1e-8 { 1.0 } else { x.ln_1p() / x };
        let poly = 1.0 + 3.89 * q + (16.1 * q).powi(2) + (5.46 * q).powi(3) + (6.71 * q).powi(4);
        lead * poly.powf(-0.25)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planck() -> CosmologyParameters {
        CosmologyParameters::new(0.678, 0.307115, 0.048, 0.96, 0.823, 1.686).unwrap()
    }

    #[test]
    fn parse_names() {
        assert_eq!("EH".parse::<TransferModel>().unwrap(), TransferModel::EisensteinHu);
        assert_eq!(
            "EH_NoBAO".parse::<TransferModel>().unwrap(),
            TransferModel::EisensteinHuNoBao
        );
        assert_eq!("BBKS".parse::<TransferModel>().unwrap(), TransferModel::Bbks);
        assert!(matches!(
            "CAMB".parse::<TransferModel>(),
            Err(CalcError::Config(_))
        ));
    }

    #[test]
    fn names_round_trip_through_display() {
        for name in TransferModel::NAMES {
            let model: TransferModel = name.parse().unwrap();
            assert_eq!(model.to_string(), name);
        }
    }

    #[test]
    fn large_scale_limit_is_unity() {
        let p = planck();
        for model in [
            TransferModel::EisensteinHu,
            TransferModel::EisensteinHuNoBao,
            TransferModel::Bbks,
        ] {
            let t = build(model, &p, 2.725);
            let v = t.transfer(1e-6);
            assert!((v - 1.0).abs() < 1e-3, "{model}: T(1e-6) = {v}");
        }
    }

    #[test]
    fn small_scale_suppression() {
        let p = planck();
        for model in [
            TransferModel::EisensteinHu,
            TransferModel::EisensteinHuNoBao,
            TransferModel::Bbks,
        ] {
            let t = build(model, &p, 2.725);
            let hi = t.transfer(10.0);
            assert!(hi > 0.0 && hi < 0.01, "{model}: T(10) = {hi}");
        }
    }

    #[test]
    fn wiggle_and_no_wiggle_agree_in_shape() {
        let p = planck();
        let eh = EisensteinHu::new(&p, 2.725);
        let nw = EisensteinHuNoBao::new(&p, 2.725);
        for k in [1e-3, 0.01, 0.05, 0.2, 1.0] {
            let ratio = eh.transfer(k) / nw.transfer(k);
            assert!((ratio - 1.0).abs() < 0.1, "k={k}: ratio {ratio}");
        }
    }

    #[test]
    fn sound_horizon_near_150_mpc() {
        let eh = EisensteinHu::new(&planck(), 2.725);
        assert!((eh.sound_horizon() - 150.0).abs() < 10.0);
    }
}
