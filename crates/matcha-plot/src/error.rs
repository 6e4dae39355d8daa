//! Error type for plot preparation and export.

/// Failures detected while validating a `PlotSpec` or exporting figures.
#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    /// Requested keys missing from the results table.
    #[error("keys not present in results: {missing:?} (available: {available:?})")]
    KeyMismatch {
        missing: Vec<String>,
        available: Vec<String>,
    },

    /// Explicit color list length differs from the key list length.
    #[error("{colors} colors given for {keys} keys")]
    ColorCountMismatch { colors: usize, keys: usize },

    #[error("unknown colormap: {0}")]
    UnknownColormap(String),

    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// Malformed reference table.
    #[error("reference data: {0}")]
    Reference(String),

    #[error("export failed: {0}")]
    Export(String),
}
