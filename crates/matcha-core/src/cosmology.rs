//! Cosmological parameters and the flat LambdaCDM background.

use serde::Serialize;
use serde_json::Value;

use crate::calculator::CalcError;
use crate::constants::{DELTA_C_RANGE, RHO_CRIT0};
use crate::numeric::gauss_legendre;

/// Field names of the cosmology mapping, in canonical order.
pub const COSMOLOGY_FIELDS: [&str; 6] = ["h_0", "O_m0", "O_b0", "n", "sigma_8", "delta_c"];

/// The six cosmological inputs of a run.
///
/// Construction validates every field; the value is immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CosmologyParameters {
    h_0: f64,
    #[serde(rename = "O_m0")]
    o_m0: f64,
    #[serde(rename = "O_b0")]
    o_b0: f64,
    n: f64,
    sigma_8: f64,
    delta_c: f64,
}

impl CosmologyParameters {
    /// Build and validate a parameter set.
    pub fn new(
        h_0: f64,
        o_m0: f64,
        o_b0: f64,
        n: f64,
        sigma_8: f64,
        delta_c: f64,
    ) -> Result<Self, CalcError> {
        let params = Self {
            h_0,
            o_m0,
            o_b0,
            n,
            sigma_8,
            delta_c,
        };
        params.validate()?;
        Ok(params)
    }

    /// Parse a JSON mapping holding the six fields.
    ///
    /// A missing field, a non-numeric value, or an out-of-range value is
    /// reported as `InvalidParameter` naming the field.
    pub fn from_value(value: &Value) -> Result<Self, CalcError> {
        let map = value.as_object().ok_or_else(|| {
            CalcError::InvalidParameter("cosmology must be a mapping of named fields".into())
        })?;

        let field = |name: &str| -> Result<f64, CalcError> {
            match map.get(name) {
                None => Err(CalcError::InvalidParameter(format!(
                    "missing cosmology field '{name}'"
                ))),
                Some(v) => v.as_f64().ok_or_else(|| {
                    CalcError::InvalidParameter(format!(
                        "cosmology field '{name}' is not numeric: {v}"
                    ))
                }),
            }
        };

        Self::new(
            field("h_0")?,
            field("O_m0")?,
            field("O_b0")?,
            field("n")?,
            field("sigma_8")?,
            field("delta_c")?,
        )
    }

    fn validate(&self) -> Result<(), CalcError> {
        for (name, value) in COSMOLOGY_FIELDS.iter().zip(self.values()) {
            if !value.is_finite() || value <= 0.0 {
                return Err(CalcError::InvalidParameter(format!(
                    "cosmology field '{name}' must be finite and positive, got {value}"
                )));
            }
        }
        if self.o_m0 > 1.0 {
            return Err(CalcError::InvalidParameter(format!(
                "cosmology field 'O_m0' must not exceed 1 in a flat universe, got {}",
                self.o_m0
            )));
        }
        let (dc_min, dc_max) = DELTA_C_RANGE;
        if !(dc_min..=dc_max).contains(&self.delta_c) {
            return Err(CalcError::InvalidParameter(format!(
                "cosmology field 'delta_c' must lie in [{dc_min}, {dc_max}], got {}",
                self.delta_c
            )));
        }
        if self.o_b0 >= self.o_m0 {
            return Err(CalcError::InvalidParameter(format!(
                "cosmology field 'O_b0' ({}) must be smaller than 'O_m0' ({})",
                self.o_b0, self.o_m0
            )));
        }
        Ok(())
    }

    /// Field values in the order of [`COSMOLOGY_FIELDS`].
    #[must_use]
    pub fn values(&self) -> [f64; 6] {
        [
            self.h_0,
            self.o_m0,
            self.o_b0,
            self.n,
            self.sigma_8,
            self.delta_c,
        ]
    }

    #[must_use]
    pub fn h_0(&self) -> f64 {
        self.h_0
    }

    #[must_use]
    pub fn o_m0(&self) -> f64 {
        self.o_m0
    }

    #[must_use]
    pub fn o_b0(&self) -> f64 {
        self.o_b0
    }

    #[must_use]
    pub fn n(&self) -> f64 {
        self.n
    }

    #[must_use]
    pub fn sigma_8(&self) -> f64 {
        self.sigma_8
    }

    #[must_use]
    pub fn delta_c(&self) -> f64 {
        self.delta_c
    }

    /// Dark-energy density today, `1 - O_m0`.
    #[must_use]
    pub fn o_l0(&self) -> f64 {
        1.0 - self.o_m0
    }
}

/// Flat LambdaCDM background derived from a parameter set.
///
/// Radiation is neglected.
#[derive(Debug, Clone)]
pub struct Background {
    params: CosmologyParameters,
    growth_norm: f64,
}

impl Background {
    #[must_use]
    pub fn new(params: CosmologyParameters) -> Self {
        let mut bg = Self {
            params,
            growth_norm: 1.0,
        };
        bg.growth_norm = bg.unnormalized_growth(1.0);
        bg
    }

    #[must_use]
    pub fn params(&self) -> &CosmologyParameters {
        &self.params
    }

    /// Dimensionless Hubble rate `H(z)/H0`.
    #[must_use]
    pub fn efunc(&self, z: f64) -> f64 {
        let zp3 = (1.0 + z).powi(3);
        (self.params.o_m0 * zp3 + self.params.o_l0()).sqrt()
    }

    /// Matter density parameter at redshift `z`.
    #[must_use]
    pub fn omega_m(&self, z: f64) -> f64 {
        omega_m(self.params.o_m0, self.params.o_l0(), z)
    }

    /// Dark-energy density parameter at redshift `z`.
    #[must_use]
    pub fn omega_l(&self, z: f64) -> f64 {
        omega_l(self.params.o_m0, self.params.o_l0(), z)
    }

    /// Comoving mean matter density in Msun/h per (Mpc/h)^3.
    #[must_use]
    pub fn mean_density0(&self) -> f64 {
        self.params.o_m0 * RHO_CRIT0
    }

    /// Linear growth factor normalized to `D(0) = 1`.
    #[must_use]
    pub fn growth_factor(&self, z: f64) -> f64 {
        self.unnormalized_growth(scale_factor(z)) / self.growth_norm
    }

    // D(a) ∝ E(a) ∫_0^a da' / (a' E(a'))^3
    fn unnormalized_growth(&self, a: f64) -> f64 {
        let om = self.params.o_m0;
        let ol = self.params.o_l0();
        let e_of_a = |x: f64| (om / (x * x * x) + ol).sqrt();
        let integral = gauss_legendre(
            |x| {
                if x <= 0.0 {
                    0.0
                } else {
                    (x * e_of_a(x)).powi(-3)
                }
            },
            0.0,
            a,
            8,
        );
        2.5 * om * e_of_a(a) * integral
    }
}

/// Scale factor `a = 1/(1+z)`.
#[inline]
#[must_use]
pub fn scale_factor(z: f64) -> f64 {
    1.0 / (1.0 + z)
}

/// `Omega_m(z)` for a flat two-component universe.
#[must_use]
pub fn omega_m(o_m0: f64, o_l0: f64, z: f64) -> f64 {
    let zp3 = (1.0 + z).powi(3);
    o_m0 * zp3 / (o_l0 + o_m0 * zp3)
}

/// `Omega_Lambda(z)` for a flat two-component universe.
#[must_use]
pub fn omega_l(o_m0: f64, o_l0: f64, z: f64) -> f64 {
    let zp3 = (1.0 + z).powi(3);
    o_l0 / (o_l0 + o_m0 * zp3)
}
