//! The results table produced by `compute`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::calculator::CalcError;

/// A log10 stellar-mass threshold, stored in hundredths of a dex.
///
/// Keys render as `9`, `9p5`, `10p25`: the integer part, then `p` and the
/// fractional digits when there are any. Ordering is numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MassBin(u32);

impl MassBin {
    /// Build a bin from a log10 mass. The value must be a non-negative
    /// multiple of 0.01.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_log_mass(log_mass: f64) -> Result<Self, CalcError> {
        let scaled = log_mass * 100.0;
        let rounded = scaled.round();
        if !log_mass.is_finite() || log_mass < 0.0 || (scaled - rounded).abs() > 1e-6 {
            return Err(CalcError::InvalidParameter(format!(
                "mass bin {log_mass} is not a non-negative multiple of 0.01 dex"
            )));
        }
        Ok(Self(rounded as u32))
    }

    /// log10 stellar mass of this threshold.
    #[must_use]
    pub fn log_mass(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Human-readable exponent with a decimal point (`9.5`).
    #[must_use]
    pub fn label(self) -> String {
        self.to_string().replace('p', ".")
    }
}

impl fmt::Display for MassBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            write!(f, "{whole}")
        } else {
            let digits = format!("{frac:02}");
            write!(f, "{whole}p{}", digits.trim_end_matches('0'))
        }
    }
}

impl FromStr for MassBin {
    type Err = CalcError;

    /// Accepts `9p5` as well as `9.5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('p', ".");
        let value: f64 = normalized
            .parse()
            .map_err(|_| CalcError::InvalidParameter(format!("invalid mass bin key '{s}'")))?;
        Self::from_log_mass(value)
    }
}

impl Serialize for MassBin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Aligned per-bin sequences over the redshift grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinSeries {
    z: Vec<f64>,
    nvir: Vec<f64>,
    #[serde(rename = "logMs")]
    log_ms: Vec<f64>,
    #[serde(rename = "prog")]
    log_mvir: Vec<f64>,
    n_gal: f64,
    log_mvir0: f64,
}

impl BinSeries {
    /// Assemble a series; every sequence must have the same length.
    pub fn new(
        z: Vec<f64>,
        nvir: Vec<f64>,
        log_ms: Vec<f64>,
        log_mvir: Vec<f64>,
        n_gal: f64,
        log_mvir0: f64,
    ) -> Result<Self, CalcError> {
        let n = z.len();
        if nvir.len() != n || log_ms.len() != n || log_mvir.len() != n {
            return Err(CalcError::Numerical(format!(
                "series length mismatch: z={n}, nvir={}, logMs={}, prog={}",
                nvir.len(),
                log_ms.len(),
                log_mvir.len()
            )));
        }
        Ok(Self {
            z,
            nvir,
            log_ms,
            log_mvir,
            n_gal,
            log_mvir0,
        })
    }

    /// Redshift grid.
    #[must_use]
    pub fn z(&self) -> &[f64] {
        &self.z
    }

    /// Cumulative halo number density along the progenitor track.
    #[must_use]
    pub fn nvir(&self) -> &[f64] {
        &self.nvir
    }

    /// log10 stellar mass along the track.
    #[must_use]
    pub fn log_ms(&self) -> &[f64] {
        &self.log_ms
    }

    /// Median progenitor log10 halo mass.
    #[must_use]
    pub fn log_mvir(&self) -> &[f64] {
        &self.log_mvir
    }

    /// Galaxy number density above the bin threshold at z0.
    #[must_use]
    pub fn n_gal(&self) -> f64 {
        self.n_gal
    }

    /// Matched log10 halo mass at z0.
    #[must_use]
    pub fn log_mvir0(&self) -> f64 {
        self.log_mvir0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.z.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    /// Iterate `(z, nvir, logMs, log_mvir)` rows.
    pub fn rows(&self) -> impl Iterator<Item = (f64, f64, f64, f64)> + '_ {
        self.z
            .iter()
            .zip(&self.nvir)
            .zip(&self.log_ms)
            .zip(&self.log_mvir)
            .map(|(((&z, &n), &m), &p)| (z, n, m, p))
    }
}

/// Mapping from mass bin to its series, plus run metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsTable {
    model: String,
    z0: f64,
    bins: BTreeMap<MassBin, BinSeries>,
}

impl ResultsTable {
    #[must_use]
    pub fn new(model: impl Into<String>, z0: f64, bins: BTreeMap<MassBin, BinSeries>) -> Self {
        Self {
            model: model.into(),
            z0,
            bins,
        }
    }

    /// Name of the multiplicity model that produced this table.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn z0(&self) -> f64 {
        self.z0
    }

    #[must_use]
    pub fn get(&self, bin: MassBin) -> Option<&BinSeries> {
        self.bins.get(&bin)
    }

    /// Bin and series for a string key. Only the canonical spelling of a
    /// key matches: `"9p5"` does, `"9.5"` and `"9p50"` do not.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<(MassBin, &BinSeries)> {
        let bin = key.parse::<MassBin>().ok().filter(|b| b.to_string() == key)?;
        self.bins.get(&bin).map(|series| (bin, series))
    }

    /// Look up a series by its string key (`"9p5"`).
    #[must_use]
    pub fn get_key(&self, key: &str) -> Option<&BinSeries> {
        self.lookup(key).map(|(_, series)| series)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get_key(key).is_some()
    }

    /// Bins in ascending mass order.
    pub fn bins(&self) -> impl Iterator<Item = MassBin> + '_ {
        self.bins.keys().copied()
    }

    /// String keys in ascending mass order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.bins.keys().map(ToString::to_string).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MassBin, &BinSeries)> {
        self.bins.iter().map(|(k, v)| (*k, v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Grid length shared by every series.
    #[must_use]
    pub fn samples(&self) -> usize {
        self.bins.values().next().map_or(0, BinSeries::len)
    }
}
