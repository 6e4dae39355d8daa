//! Spherical-overdensity halo mass definitions.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::calculator::CalcError;
use crate::cosmology::Background;

/// Overdensity used when `SOMean` or `SOCritical` is given without a value.
pub const DEFAULT_OVERDENSITY: f64 = 200.0;

/// How a halo boundary is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MassDefinition {
    /// Bryan & Norman (1998) virial overdensity.
    #[default]
    SoVirial,
    /// Fixed overdensity relative to the mean matter density.
    SoMean(f64),
    /// Fixed overdensity relative to the critical density.
    SoCritical(f64),
}

impl MassDefinition {
    /// Overdensity relative to the mean matter density at redshift `z`.
    #[must_use]
    pub fn delta_mean(&self, background: &Background, z: f64) -> f64 {
        let om_z = background.omega_m(z);
        match *self {
            Self::SoVirial => bryan_norman(om_z) / om_z,
            Self::SoMean(delta) => delta,
            Self::SoCritical(delta) => delta / om_z,
        }
    }
}

/// Bryan & Norman virial overdensity relative to critical density.
#[must_use]
pub fn bryan_norman(omega_m_z: f64) -> f64 {
    let x = omega_m_z - 1.0;
    18.0 * PI * PI + 82.0 * x - 39.0 * x * x
}

impl fmt::Display for MassDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SoVirial => f.write_str("SOVirial"),
            Self::SoMean(d) => write!(f, "SOMean:{d}"),
            Self::SoCritical(d) => write!(f, "SOCritical:{d}"),
        }
    }
}

impl FromStr for MassDefinition {
    type Err = CalcError;

    /// Accepts `SOVirial`, `SOMean`, `SOCritical`, optionally followed by
    /// `:<overdensity>` for the latter two.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = match s.split_once(':') {
            Some((n, v)) => (n, Some(v)),
            None => (s, None),
        };
        let delta = match value {
            None => DEFAULT_OVERDENSITY,
            Some(v) => {
                let d: f64 = v.trim().parse().map_err(|_| {
                    CalcError::Config(format!("invalid overdensity '{v}' in mass definition"))
                })?;
                if !d.is_finite() || d <= 0.0 {
                    return Err(CalcError::Config(format!(
                        "overdensity must be positive, got {d}"
                    )));
                }
                d
            }
        };
        match (name, value) {
            ("SOVirial", None) => Ok(Self::SoVirial),
            ("SOMean", _) => Ok(Self::SoMean(delta)),
            ("SOCritical", _) => Ok(Self::SoCritical(delta)),
            _ => Err(CalcError::Config(format!(
                "unknown mass definition '{s}' (expected SOVirial, SOMean[:delta] or SOCritical[:delta])"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosmology::CosmologyParameters;

    fn background() -> Background {
        Background::new(CosmologyParameters::new(0.678, 0.307115, 0.048, 0.96, 0.823, 1.686).unwrap())
    }

    #[test]
    fn parse_variants() {
        assert_eq!("SOVirial".parse::<MassDefinition>().unwrap(), MassDefinition::SoVirial);
        assert_eq!(
            "SOMean".parse::<MassDefinition>().unwrap(),
            MassDefinition::SoMean(200.0)
        );
        assert_eq!(
            "SOCritical:500".parse::<MassDefinition>().unwrap(),
            MassDefinition::SoCritical(500.0)
        );
        assert!("SOVirial:100".parse::<MassDefinition>().is_err());
        assert!("FOF".parse::<MassDefinition>().is_err());
        assert!("SOMean:-3".parse::<MassDefinition>().is_err());
    }

    #[test]
    fn virial_overdensity_today() {
        let bg = background();
        let delta = MassDefinition::SoVirial.delta_mean(&bg, 0.0);
        // Roughly 330 times the mean density for Omega_m ~ 0.3.
        assert!(delta > 300.0 && delta < 350.0, "delta = {delta}");
    }

    #[test]
    fn virial_tends_to_eds_value_at_high_z() {
        let bg = background();
        let delta = MassDefinition::SoVirial.delta_mean(&bg, 50.0);
        assert!((delta - 18.0 * PI * PI).abs() < 1.0);
    }

    #[test]
    fn critical_converts_with_omega_m() {
        let bg = background();
        let delta = MassDefinition::SoCritical(200.0).delta_mean(&bg, 0.0);
        assert!((delta - 200.0 / 0.307115).abs() < 1e-9);
        assert!((MassDefinition::SoMean(200.0).delta_mean(&bg, 3.0) - 200.0).abs() < 1e-12);
    }
}
