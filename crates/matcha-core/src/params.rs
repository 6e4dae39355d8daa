//! Mass-function engine configuration (`hmf_params`).

use serde::{Deserialize, Serialize};

use crate::calculator::CalcError;
use crate::constants::{
    DEFAULT_MASS_BINS, DEFAULT_T_CMB0, STELLAR_BRACKET, TABLE_LOG_M_MAX, TABLE_LOG_M_MIN,
};
use crate::gsmf::GsmfMode;
use crate::mass_definition::MassDefinition;
use crate::power::LnkGrid;
use crate::results::MassBin;
use crate::transfer::TransferModel;

/// Pass-through configuration bundle for the mass function engine.
///
/// Every field has a default, so a partial JSON object is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HmfParams {
    /// Multiplicity function name (see the model registry).
    pub hmf_model: String,
    /// Transfer function name: `EH`, `EH_NoBAO` or `BBKS`.
    pub transfer_model: String,
    /// Mass definition: `SOVirial`, `SOMean[:delta]`, `SOCritical[:delta]`.
    pub mdef_model: String,
    /// CMB temperature today in kelvin.
    #[serde(alias = "Tcmb0")]
    pub t_cmb0: f64,
    /// Lower log10 halo mass of the abundance-matching range.
    #[serde(alias = "Mmin")]
    pub log_m_min: f64,
    /// Upper log10 halo mass of the abundance-matching range.
    #[serde(alias = "Mmax")]
    pub log_m_max: f64,
    /// Mass-table resolution in dex.
    pub dlog10m: f64,
    pub lnk_min: f64,
    pub lnk_max: f64,
    pub dlnk: f64,
    /// Stellar mass function calibration.
    pub gsmf_mode: String,
    /// log10 stellar-mass thresholds of the results table.
    pub mass_bins: Vec<f64>,
}

impl Default for HmfParams {
    fn default() -> Self {
        Self {
            hmf_model: "Behroozi".to_string(),
            transfer_model: TransferModel::default().name().to_string(),
            mdef_model: MassDefinition::default().to_string(),
            t_cmb0: DEFAULT_T_CMB0,
            log_m_min: 9.0,
            log_m_max: 16.0,
            dlog10m: 0.01,
            lnk_min: -18.42,
            lnk_max: 9.9,
            dlnk: 0.05,
            gsmf_mode: GsmfMode::default().name().to_string(),
            mass_bins: DEFAULT_MASS_BINS.to_vec(),
        }
    }
}

impl HmfParams {
    /// Check ranges and names. The multiplicity model name is resolved by
    /// the registry, not here.
    pub fn validate(&self) -> Result<(), CalcError> {
        finite_positive("t_cmb0", self.t_cmb0)?;
        finite_positive("dlog10m", self.dlog10m)?;
        finite_positive("dlnk", self.dlnk)?;

        if !self.log_m_min.is_finite() || !self.log_m_max.is_finite() {
            return Err(CalcError::InvalidParameter(
                "log_m_min and log_m_max must be finite".into(),
            ));
        }
        if self.log_m_min >= self.log_m_max {
            return Err(CalcError::InvalidParameter(format!(
                "log_m_min ({}) must be below log_m_max ({})",
                self.log_m_min, self.log_m_max
            )));
        }
        if self.log_m_min < TABLE_LOG_M_MIN || self.log_m_max >= TABLE_LOG_M_MAX {
            return Err(CalcError::InvalidParameter(format!(
                "halo mass range must lie within [{TABLE_LOG_M_MIN}, {TABLE_LOG_M_MAX})"
            )));
        }
        if self.dlog10m > self.log_m_max - self.log_m_min {
            return Err(CalcError::InvalidParameter(format!(
                "dlog10m ({}) exceeds the halo mass range",
                self.dlog10m
            )));
        }

        if !self.lnk_min.is_finite() || !self.lnk_max.is_finite() || self.lnk_min >= self.lnk_max
        {
            return Err(CalcError::InvalidParameter(format!(
                "invalid ln k range [{}, {}]",
                self.lnk_min, self.lnk_max
            )));
        }
        if self.dlnk > self.lnk_max - self.lnk_min {
            return Err(CalcError::InvalidParameter(format!(
                "dlnk ({}) exceeds the ln k range",
                self.dlnk
            )));
        }

        self.transfer()?;
        self.mass_definition()?;
        self.gsmf()?;
        self.bins()?;
        Ok(())
    }

    pub fn transfer(&self) -> Result<TransferModel, CalcError> {
        self.transfer_model.parse()
    }

    pub fn mass_definition(&self) -> Result<MassDefinition, CalcError> {
        self.mdef_model.parse()
    }

    pub fn gsmf(&self) -> Result<GsmfMode, CalcError> {
        self.gsmf_mode.parse()
    }

    #[must_use]
    pub fn lnk_grid(&self) -> LnkGrid {
        LnkGrid {
            lnk_min: self.lnk_min,
            lnk_max: self.lnk_max,
            dlnk: self.dlnk,
        }
    }

    /// Mass bins as sorted, de-duplicated keys.
    pub fn bins(&self) -> Result<Vec<MassBin>, CalcError> {
        if self.mass_bins.is_empty() {
            return Err(CalcError::InvalidParameter(
                "at least one mass bin is required".into(),
            ));
        }
        let (lo, hi) = STELLAR_BRACKET;
        let mut bins = Vec::with_capacity(self.mass_bins.len());
        for &m in &self.mass_bins {
            if !(lo..hi).contains(&m) {
                return Err(CalcError::InvalidParameter(format!(
                    "mass bin {m} outside the stellar-mass range [{lo}, {hi})"
                )));
            }
            bins.push(MassBin::from_log_mass(m)?);
        }
        bins.sort_unstable();
        bins.dedup();
        Ok(bins)
    }
}

fn finite_positive(name: &str, value: f64) -> Result<(), CalcError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CalcError::InvalidParameter(format!(
            "{name} must be finite and positive, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let p = HmfParams::default();
        assert!(p.validate().is_ok());
        assert_eq!(p.hmf_model, "Behroozi");
        assert_eq!(p.transfer_model, "EH");
        assert_eq!(p.mdef_model, "SOVirial");
        assert_eq!(p.gsmf_mode, "intrinsic_smf");
    }

    #[test]
    fn default_bins_keys() {
        let keys: Vec<String> = HmfParams::default()
            .bins()
            .unwrap()
            .into_iter()
            .map(|b| b.to_string())
            .collect();
        assert_eq!(keys, ["9", "9p5", "10", "10p5", "11", "11p5"]);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let p: HmfParams =
            serde_json::from_str(r#"{"hmf_model": "Tinker08", "Mmin": 10}"#).unwrap();
        assert_eq!(p.hmf_model, "Tinker08");
        assert!((p.log_m_min - 10.0).abs() < f64::EPSILON);
        assert!((p.log_m_max - 16.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_field_rejected() {
        let r: Result<HmfParams, _> = serde_json::from_str(r#"{"Neff": 3.05}"#);
        assert!(r.is_err());
    }

    #[test]
    fn inverted_mass_range_rejected() {
        let p = HmfParams {
            log_m_min: 14.0,
            log_m_max: 12.0,
            ..HmfParams::default()
        };
        assert!(matches!(p.validate(), Err(CalcError::InvalidParameter(_))));
    }

    #[test]
    fn non_finite_resolution_rejected() {
        let p = HmfParams {
            dlnk: f64::NAN,
            ..HmfParams::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn unknown_names_are_config_errors() {
        let p = HmfParams {
            transfer_model: "CAMB".into(),
            ..HmfParams::default()
        };
        assert!(matches!(p.validate(), Err(CalcError::Config(_))));

        let p = HmfParams {
            gsmf_mode: "nope".into(),
            ..HmfParams::default()
        };
        assert!(matches!(p.validate(), Err(CalcError::Config(_))));
    }

    #[test]
    fn bins_sorted_and_deduplicated() {
        let p = HmfParams {
            mass_bins: vec![11.0, 9.0, 11.0],
            ..HmfParams::default()
        };
        let bins = p.bins().unwrap();
        assert_eq!(bins.len(), 2);
        assert!(bins[0] < bins[1]);
    }

    #[test]
    fn empty_or_out_of_range_bins_rejected() {
        let p = HmfParams {
            mass_bins: vec![],
            ..HmfParams::default()
        };
        assert!(p.bins().is_err());
        let p = HmfParams {
            mass_bins: vec![13.0],
            ..HmfParams::default()
        };
        assert!(p.bins().is_err());
    }
}
