//! Physical constants, fitting-function anchors, and run defaults.

/// Critical density today in h^2 Msun / Mpc^3 (so `Omega_m * RHO_CRIT0` is
/// the comoving mean density in Msun/h per (Mpc/h)^3).
pub const RHO_CRIT0: f64 = 2.7754e11;

/// Default CMB temperature in kelvin.
pub const DEFAULT_T_CMB0: f64 = 2.725;

/// Reference h of the progenitor-track and subhalo fits.
pub const H_REFERENCE: f64 = 0.678;

/// log10(1e13 Msun), pivot of the progenitor-track fit.
pub const LOG_M13: f64 = 13.0;

/// Upper limit of the stellar-mass integral, log10(Msun).
pub const GSMF_LOG_M_UPPER: f64 = 13.0;

/// Bisection bracket for the stellar-mass inversion, log10(Msun).
pub const STELLAR_BRACKET: (f64, f64) = (1.0, 12.5);

/// Absolute tolerance of the stellar-mass bisection.
pub const STELLAR_XTOL: f64 = 2e-12;

/// Iteration cap of every bisection.
pub const BISECT_MAX_ITER: usize = 100;

/// Accepted range of the collapse threshold delta_c. Spherical collapse
/// gives 1.686 with a weak cosmology dependence.
pub const DELTA_C_RANGE: (f64, f64) = (1.0, 2.0);

/// Upper end of the 1+z grid.
pub const ONE_PLUS_Z_MAX: f64 = 12.0;

/// Lower and upper log10 mass limits of the internal mass-function table.
///
/// The cumulative density is integrated down from the upper end, and the
/// lower end has to reach the smallest progenitor masses at high redshift.
pub const TABLE_LOG_M_MIN: f64 = 3.0;
pub const TABLE_LOG_M_MAX: f64 = 18.0;

/// Redshift above which Tinker08 parameters stop evolving.
pub const TINKER_MAX_Z: f64 = 3.0;

/// Default log-mass bins of the results table.
pub const DEFAULT_MASS_BINS: [f64; 6] = [9.0, 9.5, 10.0, 10.5, 11.0, 11.5];

/// Minimum progress change (1%) before reporting an update.
pub const PROGRESS_REPORT_THRESHOLD: f64 = 0.01;

/// Process exit codes.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Generic error.
    pub const ERROR_GENERIC: i32 = 1;
    /// Invalid configuration or parameters.
    pub const ERROR_CONFIG: i32 = 4;
    /// Plot selection or export error.
    pub const ERROR_PLOT: i32 = 5;
    /// Computation cancelled by user (Ctrl+C).
    pub const ERROR_CANCELED: i32 = 130;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bins_are_half_dex() {
        for pair in DEFAULT_MASS_BINS.windows(2) {
            assert!((pair[1] - pair[0] - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn stellar_bracket_inside_integral_range() {
        assert!(STELLAR_BRACKET.0 < STELLAR_BRACKET.1);
        assert!(STELLAR_BRACKET.1 < GSMF_LOG_M_UPPER);
    }
}
